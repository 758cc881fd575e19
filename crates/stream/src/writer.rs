//! Object output stream
//!
//! An [`ObjectOutput`] is one write session. Every object reachable from a
//! root is emitted at most once per session; later occurrences, including
//! occurrences in later roots and cycles back to an object still being
//! written, become back-references to its handle.

use crate::codec;
use crate::config::StreamConfig;
use crate::descriptor::ClassTable;
use crate::format::{tags, StreamHeader};
use crate::refs::{Handle, ReferenceTable};
use keepsake_core::{ClassDescriptor, Error, ObjRef, Result, SlotWrite, Value};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, trace};

/// Serializes object graphs into a byte sink
///
/// A write-replace hook that substitutes an object keeps the original's
/// identity: later references to the original become back-references to
/// the substitute. A hook that returns a plain value (a string, a number,
/// null) has no handle to share, so it runs again for every reference and
/// the value is written inline each time.
///
/// # Example
///
/// ```ignore
/// let mut out = ObjectOutput::new(Vec::new())?;
/// out.write_object(&Value::Ref(company))?;
/// let bytes = out.into_inner()?;
/// ```
pub struct ObjectOutput<W: Write> {
    out: W,
    session: WriteSession,
}

impl<W: Write> ObjectOutput<W> {
    /// Open a session with the default configuration and write the header
    pub fn new(out: W) -> Result<Self> {
        Self::with_config(out, StreamConfig::default())
    }

    /// Open a session with an explicit configuration and write the header
    pub fn with_config(mut out: W, config: StreamConfig) -> Result<Self> {
        config.validate()?;
        StreamHeader::current().write_to(&mut out)?;
        Ok(ObjectOutput {
            out,
            session: WriteSession::new(config),
        })
    }

    /// Write one root value.
    ///
    /// On error the stream is left in an unspecified state and should be
    /// discarded.
    pub fn write_object(&mut self, value: &Value) -> Result<()> {
        self.session.write_value(&mut self.out, value)?;
        self.session.roots += 1;
        debug!(
            root = self.session.roots,
            handles = self.session.refs.len(),
            "wrote root value"
        );
        Ok(())
    }

    /// Number of object handles assigned so far
    pub fn handles(&self) -> usize {
        self.session.refs.len()
    }

    /// Number of root values written so far
    pub fn roots(&self) -> u64 {
        self.session.roots
    }

    /// Flush the underlying sink
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Borrow the underlying sink
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Flush and return the underlying sink
    pub fn into_inner(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

struct WriteSession {
    refs: ReferenceTable,
    classes: ClassTable,
    config: StreamConfig,
    depth: usize,
    roots: u64,
}

impl WriteSession {
    fn new(config: StreamConfig) -> Self {
        WriteSession {
            refs: ReferenceTable::new(),
            classes: ClassTable::default(),
            config,
            depth: 0,
            roots: 0,
        }
    }

    fn write_value(&mut self, out: &mut dyn Write, value: &Value) -> Result<()> {
        match value {
            Value::Null => codec::write_null(out),
            Value::Bool(b) => codec::write_bool(out, *b),
            Value::Int(i) => codec::write_int(out, *i),
            Value::Long(l) => codec::write_long(out, *l),
            Value::Double(d) => codec::write_double(out, *d),
            Value::Str(s) => {
                if s.len() > self.config.max_string_len {
                    return Err(Error::LimitExceeded {
                        what: "string",
                        limit: self.config.max_string_len,
                        actual: s.len(),
                    });
                }
                codec::write_string(out, s)
            }
            Value::Ref(object) => self.write_object(out, object),
        }
    }

    fn write_object(&mut self, out: &mut dyn Write, object: &ObjRef) -> Result<()> {
        if let Some(handle) = self.refs.handle_of(object) {
            return write_backref(out, handle);
        }

        let (target, replaced) = self.apply_write_replace(object)?;
        match target {
            Value::Ref(substitute) if replaced => {
                if let Some(handle) = self.refs.handle_of(&substitute) {
                    self.refs.alias(object, handle);
                    return write_backref(out, handle);
                }
                self.write_new(out, &substitute, Some(object))
            }
            Value::Ref(_) => self.write_new(out, object, None),
            other => self.write_value(out, &other),
        }
    }

    /// Follow write-replace hooks until the class stops substituting
    fn apply_write_replace(&self, object: &ObjRef) -> Result<(Value, bool)> {
        let mut current = object.clone();
        let mut replaced = false;
        loop {
            let Some(class) = current.class() else { break };
            if !class.is_serializable() {
                return Err(Error::NotSerializable {
                    type_name: class.name().to_string(),
                });
            }
            let Some(hook) = class.hooks().write_replace().cloned() else { break };
            let next = match hook(&current)? {
                Value::Ref(next) => next,
                other => {
                    trace!(from = class.name(), to = other.type_name(), "write-replace");
                    return Ok((other, true));
                }
            };
            if next.ptr_eq(&current) {
                break;
            }
            trace!(from = class.name(), to = %next.type_name(), "write-replace");
            let same_class = next.class().is_some_and(|c| Arc::ptr_eq(&c, &class));
            current = next;
            replaced = true;
            if same_class || self.refs.has_handle(&current) {
                break;
            }
        }
        Ok((Value::Ref(current), replaced))
    }

    fn write_new(&mut self, out: &mut dyn Write, object: &ObjRef, alias: Option<&ObjRef>) -> Result<()> {
        self.depth += 1;
        let result = if self.depth > self.config.max_depth {
            Err(Error::DepthLimitExceeded {
                limit: self.config.max_depth,
            })
        } else {
            match object.class() {
                Some(class) => self.write_instance(out, object, &class, alias),
                None => self.write_sequence(out, object, alias),
            }
        };
        self.depth -= 1;
        result
    }

    fn write_instance(
        &mut self,
        out: &mut dyn Write,
        object: &ObjRef,
        class: &Arc<ClassDescriptor>,
        alias: Option<&ObjRef>,
    ) -> Result<()> {
        if !class.is_serializable() {
            return Err(Error::NotSerializable {
                type_name: class.name().to_string(),
            });
        }

        codec::write_tag(out, tags::OBJECT)?;
        self.classes.write(out, class)?;
        let handle = self.intern(object, alias);
        trace!(handle, class = class.name(), depth = self.depth, "object record");

        if let Some(external) = class.hooks().external().cloned() {
            let mut slot = SlotWriter::new(self, out, object, class);
            (external.write)(object, &mut slot)?;
            return codec::write_tag(out, tags::END_SLOT);
        }

        for slot_class in class.serializable_lineage() {
            self.write_slot(out, object, &slot_class)?;
        }
        Ok(())
    }

    fn write_sequence(&mut self, out: &mut dyn Write, object: &ObjRef, alias: Option<&ObjRef>) -> Result<()> {
        let items = object.elements().unwrap_or_default();
        if items.len() > self.config.max_sequence_len {
            return Err(Error::LimitExceeded {
                what: "sequence",
                limit: self.config.max_sequence_len,
                actual: items.len(),
            });
        }
        codec::write_tag(out, tags::SEQUENCE)?;
        codec::write_u32(out, codec::length_prefix("sequence", items.len())?)?;
        let handle = self.intern(object, alias);
        trace!(handle, len = items.len(), depth = self.depth, "sequence");

        for item in &items {
            self.write_value(out, item)?;
        }
        Ok(())
    }

    fn intern(&mut self, object: &ObjRef, alias: Option<&ObjRef>) -> Handle {
        let handle = self.refs.intern_new(object);
        if let Some(original) = alias {
            self.refs.alias(original, handle);
        }
        handle
    }

    fn write_slot(&mut self, out: &mut dyn Write, object: &ObjRef, class: &Arc<ClassDescriptor>) -> Result<()> {
        match class.hooks().write_slot().cloned() {
            Some(hook) => {
                trace!(class = class.name(), "custom slot");
                let mut slot = SlotWriter::new(self, out, object, class);
                hook(object, &mut slot)?;
            }
            None => self.write_default_fields(out, object, class)?,
        }
        codec::write_tag(out, tags::END_SLOT)
    }

    /// Write the non-transient fields `class` declares, in declaration order
    fn write_default_fields(
        &mut self,
        out: &mut dyn Write,
        object: &ObjRef,
        class: &ClassDescriptor,
    ) -> Result<()> {
        // snapshot so no lock is held while recursing into cycles
        let values: Vec<Value> = {
            let guard = object.read();
            let instance = guard.as_instance().ok_or_else(|| {
                Error::InvalidClass(format!("{} fields requested for a sequence", class.name()))
            })?;
            let own = instance.values().get(class.slot_range()).ok_or_else(|| {
                Error::InvalidClass(format!(
                    "{} is not in the lineage of {}",
                    class.name(),
                    instance.class().name()
                ))
            })?;
            class
                .fields()
                .iter()
                .zip(own)
                .filter(|(field, _)| !field.is_transient())
                .map(|(_, value)| value.clone())
                .collect()
        };

        for value in &values {
            self.write_value(out, value)?;
        }
        Ok(())
    }
}

fn write_backref(out: &mut dyn Write, handle: Handle) -> Result<()> {
    trace!(handle, "back-reference");
    codec::write_tag(out, tags::BACKREF)?;
    codec::write_u32(out, handle)
}

/// Slot sink handed to write hooks
struct SlotWriter<'a> {
    session: &'a mut WriteSession,
    out: &'a mut dyn Write,
    object: &'a ObjRef,
    class: &'a Arc<ClassDescriptor>,
}

impl<'a> SlotWriter<'a> {
    fn new(
        session: &'a mut WriteSession,
        out: &'a mut dyn Write,
        object: &'a ObjRef,
        class: &'a Arc<ClassDescriptor>,
    ) -> Self {
        SlotWriter {
            session,
            out,
            object,
            class,
        }
    }
}

impl SlotWrite for SlotWriter<'_> {
    fn write_default_fields(&mut self) -> Result<()> {
        self.session
            .write_default_fields(&mut *self.out, self.object, self.class)
    }

    fn write_value(&mut self, value: &Value) -> Result<()> {
        self.session.write_value(&mut *self.out, value)
    }
}
