//! Registry-free stream dump
//!
//! Walks a stream using only the class descriptions it carries, so any
//! stream can be examined without the classes that produced it. Output
//! looks like:
//!
//! ```text
//! root 0
//!   object #0 Company
//!     slot Company
//!       name: "Anthropic"
//!       staff: sequence #1 [2]
//!         [0]: object #2 People
//!           ...
//! root 1
//!   -> #1
//! ```

use crate::codec;
use crate::config::StreamConfig;
use crate::descriptor::{StreamClass, StreamClassTable};
use crate::format::{tags, StreamHeader};
use keepsake_core::{Error, Result};
use serde::Serialize;
use std::io::Read;
use std::sync::Arc;

/// Result of inspecting a stream
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    /// Format version from the header
    pub version: u16,
    /// Number of root values
    pub roots: usize,
    /// Number of object handles (instances and sequences)
    pub objects: usize,
    /// Number of back-references
    pub back_references: usize,
    /// Described class names, in description order
    pub classes: Vec<String>,
    /// Indented tree rendering
    #[serde(skip)]
    pub text: String,
}

/// Inspect a stream with the default limits
pub fn inspect<R: Read>(input: R) -> Result<Inspection> {
    inspect_with_config(input, &StreamConfig::default())
}

/// Inspect a stream with explicit limits
pub fn inspect_with_config<R: Read>(mut input: R, config: &StreamConfig) -> Result<Inspection> {
    let header = StreamHeader::read_from(&mut input)?;
    let mut inspector = Inspector {
        input: &mut input,
        config,
        classes: StreamClassTable::default(),
        objects: 0,
        back_references: 0,
        depth: 0,
        text: String::new(),
    };

    let mut roots = 0;
    while let Some(tag) = codec::read_tag_or_eof(&mut *inspector.input)? {
        inspector.line(0, &format!("root {}", roots));
        inspector.value(tag, 1, "")?;
        roots += 1;
    }

    Ok(Inspection {
        version: header.version,
        roots,
        objects: inspector.objects as usize,
        back_references: inspector.back_references,
        classes: inspector.classes.names(),
        text: inspector.text,
    })
}

struct Inspector<'a> {
    input: &'a mut dyn Read,
    config: &'a StreamConfig,
    classes: StreamClassTable,
    objects: u32,
    back_references: usize,
    depth: usize,
    text: String,
}

impl Inspector<'_> {
    fn line(&mut self, indent: usize, content: &str) {
        for _ in 0..indent {
            self.text.push_str("  ");
        }
        self.text.push_str(content);
        self.text.push('\n');
    }

    fn next_tag(&mut self) -> Result<u8> {
        codec::read_u8(&mut *self.input)
    }

    fn value(&mut self, tag: u8, indent: usize, label: &str) -> Result<()> {
        match tag {
            tags::NULL => self.line(indent, &format!("{}null", label)),
            tags::BOOL => {
                let v = codec::read_bool(&mut *self.input)?;
                self.line(indent, &format!("{}{}", label, v));
            }
            tags::INT => {
                let v = codec::read_int(&mut *self.input)?;
                self.line(indent, &format!("{}{}", label, v));
            }
            tags::LONG => {
                let v = codec::read_long(&mut *self.input)?;
                self.line(indent, &format!("{}{}L", label, v));
            }
            tags::DOUBLE => {
                let v = codec::read_double(&mut *self.input)?;
                self.line(indent, &format!("{}{:?}", label, v));
            }
            tags::STRING => {
                let v = codec::read_name(&mut *self.input, self.config.max_string_len)?;
                self.line(indent, &format!("{}{:?}", label, v));
            }
            tags::BACKREF => {
                let handle = codec::read_u32(&mut *self.input)?;
                if handle >= self.objects {
                    return Err(Error::corrupt(format!(
                        "back-reference to handle {} but only {} objects seen",
                        handle, self.objects
                    )));
                }
                self.back_references += 1;
                self.line(indent, &format!("{}-> #{}", label, handle));
            }
            tags::SEQUENCE | tags::OBJECT => {
                self.depth += 1;
                let result = if self.depth > self.config.max_depth {
                    Err(Error::DepthLimitExceeded {
                        limit: self.config.max_depth,
                    })
                } else if tag == tags::SEQUENCE {
                    self.sequence(indent, label)
                } else {
                    self.object(indent, label)
                };
                self.depth -= 1;
                result?;
            }
            other => {
                return Err(Error::corrupt(format!(
                    "unexpected tag 0x{:02x} ({})",
                    other,
                    tags::name(other)
                )))
            }
        }
        Ok(())
    }

    fn sequence(&mut self, indent: usize, label: &str) -> Result<()> {
        let len = codec::read_u32(&mut *self.input)? as usize;
        if len > self.config.max_sequence_len {
            return Err(Error::LimitExceeded {
                what: "sequence",
                limit: self.config.max_sequence_len,
                actual: len,
            });
        }
        let handle = self.objects;
        self.objects += 1;
        self.line(indent, &format!("{}sequence #{} [{}]", label, handle, len));
        for i in 0..len {
            let tag = self.next_tag()?;
            self.value(tag, indent + 1, &format!("[{}]: ", i))?;
        }
        Ok(())
    }

    fn object(&mut self, indent: usize, label: &str) -> Result<()> {
        let class_tag = self.next_tag()?;
        let class = self
            .classes
            .read_tagged(&mut *self.input, class_tag, self.config)?
            .ok_or_else(|| Error::corrupt("object record without a class description"))?;
        let handle = self.objects;
        self.objects += 1;
        self.line(indent, &format!("{}object #{} {}", label, handle, class.name));

        if class.is_external() {
            return self.slot(&class, indent + 1, "external");
        }
        for slot_class in class.lineage() {
            let kind = if slot_class.has_slot_hook() { "custom" } else { "" };
            self.slot(&slot_class, indent + 1, kind)?;
        }
        Ok(())
    }

    fn slot(&mut self, class: &Arc<StreamClass>, indent: usize, kind: &str) -> Result<()> {
        if kind.is_empty() {
            self.line(indent, &format!("slot {}", class.name));
        } else {
            self.line(indent, &format!("slot {} ({})", class.name, kind));
        }
        let named = kind.is_empty();
        let mut position = 0;
        loop {
            let tag = self.next_tag()?;
            if tag == tags::END_SLOT {
                return Ok(());
            }
            let label = match class.fields.get(position) {
                Some((name, _)) if named => format!("{}: ", name),
                _ => format!("[{}]: ", position),
            };
            self.value(tag, indent + 1, &label)?;
            position += 1;
        }
    }
}
