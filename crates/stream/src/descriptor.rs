//! Class descriptor tables
//!
//! A class description is written in full the first time a session emits an
//! instance of that class and referenced by index afterwards. The index of a
//! description is assigned once its supertype description has been written,
//! so writer and reader number descriptors identically.

use crate::codec;
use crate::config::StreamConfig;
use crate::format::{flags, tags};
use keepsake_core::{ClassDescriptor, Error, FieldType, Result};
use rustc_hash::FxHashMap;
use std::io::{Read, Write};
use std::sync::Arc;

/// A class as described by the stream (not necessarily known locally)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamClass {
    /// Type identifier
    pub name: String,
    /// Description flags (see [`flags`])
    pub flags: u8,
    /// Persistent fields in declaration order
    pub fields: Vec<(String, FieldType)>,
    /// Serializable supertype, if any
    pub super_class: Option<Arc<StreamClass>>,
}

impl StreamClass {
    /// Check whether the class wrote its slot with a custom hook
    pub fn has_slot_hook(&self) -> bool {
        self.flags & flags::SLOT_HOOK != 0
    }

    /// Check whether the class owns its entire encoding
    pub fn is_external(&self) -> bool {
        self.flags & flags::EXTERNAL != 0
    }

    /// The supertype chain including this class, root-most first
    pub fn lineage(self: &Arc<Self>) -> Vec<Arc<StreamClass>> {
        let mut chain = vec![self.clone()];
        while let Some(parent) = chain.last().and_then(|c| c.super_class.clone()) {
            chain.push(parent);
        }
        chain.reverse();
        chain
    }
}

/// Write-side descriptor table
#[derive(Debug, Default)]
pub(crate) struct ClassTable {
    by_identity: FxHashMap<usize, u32>,
    pinned: Vec<Arc<ClassDescriptor>>,
}

impl ClassTable {
    /// Write a class description, or a reference to an earlier one
    pub(crate) fn write(&mut self, out: &mut dyn Write, class: &Arc<ClassDescriptor>) -> Result<()> {
        let identity = Arc::as_ptr(class) as usize;
        if let Some(index) = self.by_identity.get(&identity) {
            codec::write_tag(out, tags::CLASS_REF)?;
            return codec::write_u32(out, *index);
        }

        codec::write_tag(out, tags::CLASS_DESC)?;
        codec::write_name(out, class.name())?;
        out.write_all(&[description_flags(class)])?;

        let persistent: Vec<_> = class.fields().iter().filter(|f| !f.is_transient()).collect();
        let count = u16::try_from(persistent.len()).map_err(|_| Error::LimitExceeded {
            what: "field list",
            limit: u16::MAX as usize,
            actual: persistent.len(),
        })?;
        codec::write_u16(out, count)?;
        for field in persistent {
            codec::write_name(out, field.name())?;
            out.write_all(&[field.field_type().code()])?;
        }

        match class.super_class().filter(|s| s.is_serializable()) {
            Some(parent) => self.write(out, parent)?,
            None => codec::write_null(out)?,
        }

        let index = self.pinned.len() as u32;
        self.by_identity.insert(identity, index);
        self.pinned.push(class.clone());
        Ok(())
    }
}

fn description_flags(class: &ClassDescriptor) -> u8 {
    let mut bits = 0;
    if class.hooks().write_slot().is_some() {
        bits |= flags::SLOT_HOOK;
    }
    if class.is_external() {
        bits |= flags::EXTERNAL;
    }
    bits
}

/// Read-side descriptor table
#[derive(Debug, Default)]
pub(crate) struct StreamClassTable {
    classes: Vec<Arc<StreamClass>>,
}

impl StreamClassTable {
    /// Read a class description (or NULL) whose tag was already consumed.
    ///
    /// A description is followed by its supertype's, so the chain is read
    /// front to back and numbered back to front. Chains longer than
    /// `config.max_depth` are rejected.
    pub(crate) fn read_tagged(
        &mut self,
        input: &mut dyn Read,
        tag: u8,
        config: &StreamConfig,
    ) -> Result<Option<Arc<StreamClass>>> {
        let mut pending: Vec<(String, u8, Vec<(String, FieldType)>)> = Vec::new();
        let mut tag = tag;
        let mut resolved = loop {
            match tag {
                tags::NULL => break None,
                tags::CLASS_REF => break Some(self.read_ref(input)?),
                tags::CLASS_DESC => {
                    if pending.len() >= config.max_depth {
                        return Err(Error::DepthLimitExceeded {
                            limit: config.max_depth,
                        });
                    }
                    pending.push(read_description(input, config.max_string_len)?);
                    tag = codec::read_u8(input)?;
                }
                other => {
                    return Err(Error::corrupt(format!(
                        "expected class description, found tag 0x{:02x} ({})",
                        other,
                        tags::name(other)
                    )))
                }
            }
        };

        while let Some((name, bits, fields)) = pending.pop() {
            let class = Arc::new(StreamClass {
                name,
                flags: bits,
                fields,
                super_class: resolved,
            });
            self.classes.push(class.clone());
            resolved = Some(class);
        }
        Ok(resolved)
    }

    fn read_ref(&self, input: &mut dyn Read) -> Result<Arc<StreamClass>> {
        let index = codec::read_u32(input)?;
        self.classes.get(index as usize).cloned().ok_or_else(|| {
            Error::corrupt(format!(
                "class reference {} but only {} classes described",
                index,
                self.classes.len()
            ))
        })
    }

    /// Names of all described classes in index order
    pub(crate) fn names(&self) -> Vec<String> {
        self.classes.iter().map(|c| c.name.clone()).collect()
    }
}

/// Name, flags and fields of one CLASS_DESC record, up to its supertype tag
fn read_description(
    input: &mut dyn Read,
    max_name_len: usize,
) -> Result<(String, u8, Vec<(String, FieldType)>)> {
    let name = codec::read_name(input, max_name_len)?;
    let bits = codec::read_u8(input)?;
    if bits & !flags::ALL != 0 {
        return Err(Error::corrupt(format!(
            "class {} has unknown flags 0x{:02x}",
            name, bits
        )));
    }
    let count = codec::read_u16(input)?;
    let mut fields = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let field = codec::read_name(input, max_name_len)?;
        let code = codec::read_u8(input)?;
        let field_type = FieldType::from_code(code).ok_or_else(|| {
            Error::corrupt(format!(
                "field {}.{} has unknown type code 0x{:02x}",
                name, field, code
            ))
        })?;
        fields.push((field, field_type));
    }
    Ok((name, bits, fields))
}
