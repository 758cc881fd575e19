//! Object input stream
//!
//! An [`ObjectInput`] is one read session. Handles are bound in the order
//! objects appear, so a back-reference anywhere in the session (including a
//! later root) resolves to the same reconstructed object.
//!
//! Class slots are matched to the local class chain by name:
//!
//! - a stream slot whose class the local chain lacks is read and discarded;
//! - a local class with no stream slot, or with an empty one, runs its
//!   read-no-data hook, or keeps its field defaults;
//! - stream fields unknown to the local class are discarded;
//! - a field whose stream type differs from its local type is an
//!   [`Error::IncompatibleClass`].

use crate::codec;
use crate::config::StreamConfig;
use crate::descriptor::{StreamClass, StreamClassTable};
use crate::format::{tags, StreamHeader};
use crate::refs::HandleArena;
use keepsake_core::{
    ClassDescriptor, Error, FieldType, Instance, ObjRef, Result, SlotRead, TypeRegistry, Value,
};
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Reconstructs object graphs from a byte source
pub struct ObjectInput<R: Read> {
    input: R,
    header: StreamHeader,
    session: ReadSession,
}

impl<R: Read> ObjectInput<R> {
    /// Open a session with the default configuration and read the header
    pub fn new(input: R, registry: Arc<TypeRegistry>) -> Result<Self> {
        Self::with_config(input, registry, StreamConfig::default())
    }

    /// Open a session with an explicit configuration and read the header
    pub fn with_config(mut input: R, registry: Arc<TypeRegistry>, config: StreamConfig) -> Result<Self> {
        config.validate()?;
        let header = StreamHeader::read_from(&mut input)?;
        Ok(ObjectInput {
            input,
            header,
            session: ReadSession::new(registry, config),
        })
    }

    /// Read the next root value
    pub fn read_object(&mut self) -> Result<Value> {
        let value = self.session.read_value(&mut self.input)?;
        self.finish_root();
        Ok(value)
    }

    /// Read the next root value, or `None` at a clean end of input
    pub fn try_read_object(&mut self) -> Result<Option<Value>> {
        let Some(tag) = codec::read_tag_or_eof(&mut self.input)? else {
            return Ok(None);
        };
        let value = self.session.read_tagged(&mut self.input, tag)?;
        self.finish_root();
        Ok(Some(value))
    }

    /// Read every remaining root value
    pub fn read_to_end(&mut self) -> Result<Vec<Value>> {
        let mut roots = Vec::new();
        while let Some(value) = self.try_read_object()? {
            roots.push(value);
        }
        Ok(roots)
    }

    /// The stream header
    pub fn header(&self) -> StreamHeader {
        self.header
    }

    /// Number of object handles bound so far
    pub fn handles(&self) -> usize {
        self.session.handles.len()
    }

    /// Number of root values read so far
    pub fn roots(&self) -> u64 {
        self.session.roots
    }

    /// Return the underlying source
    pub fn into_inner(self) -> R {
        self.input
    }

    fn finish_root(&mut self) {
        self.session.roots += 1;
        debug!(
            root = self.session.roots,
            handles = self.session.handles.len(),
            "read root value"
        );
    }
}

struct ReadSession {
    registry: Arc<TypeRegistry>,
    handles: HandleArena,
    classes: StreamClassTable,
    config: StreamConfig,
    depth: usize,
    /// One tag of lookahead, set when a slot reader peeks for END_SLOT
    pending: Option<u8>,
    roots: u64,
}

impl ReadSession {
    fn new(registry: Arc<TypeRegistry>, config: StreamConfig) -> Self {
        ReadSession {
            registry,
            handles: HandleArena::new(),
            classes: StreamClassTable::default(),
            config,
            depth: 0,
            pending: None,
            roots: 0,
        }
    }

    fn next_tag(&mut self, input: &mut dyn Read) -> Result<u8> {
        match self.pending.take() {
            Some(tag) => Ok(tag),
            None => codec::read_u8(input),
        }
    }

    fn peek_tag(&mut self, input: &mut dyn Read) -> Result<u8> {
        let tag = self.next_tag(input)?;
        self.pending = Some(tag);
        Ok(tag)
    }

    fn read_value(&mut self, input: &mut dyn Read) -> Result<Value> {
        let tag = self.next_tag(input)?;
        self.read_tagged(input, tag)
    }

    fn read_tagged(&mut self, input: &mut dyn Read, tag: u8) -> Result<Value> {
        match tag {
            tags::NULL => Ok(Value::Null),
            tags::BOOL => Ok(Value::Bool(codec::read_bool(input)?)),
            tags::INT => Ok(Value::Int(codec::read_int(input)?)),
            tags::LONG => Ok(Value::Long(codec::read_long(input)?)),
            tags::DOUBLE => Ok(Value::Double(codec::read_double(input)?)),
            tags::STRING => Ok(Value::Str(codec::read_name(input, self.config.max_string_len)?)),
            tags::BACKREF => {
                let handle = codec::read_u32(input)?;
                trace!(handle, "back-reference");
                self.handles.resolve(handle)
            }
            tags::SEQUENCE | tags::OBJECT => {
                self.depth += 1;
                let result = if self.depth > self.config.max_depth {
                    Err(Error::DepthLimitExceeded {
                        limit: self.config.max_depth,
                    })
                } else if tag == tags::SEQUENCE {
                    self.read_sequence(input)
                } else {
                    self.read_instance(input)
                };
                self.depth -= 1;
                result
            }
            tags::END_SLOT => Err(Error::corrupt("end-of-slot marker outside a class slot")),
            other => Err(Error::corrupt(format!(
                "unexpected tag 0x{:02x} ({})",
                other,
                tags::name(other)
            ))),
        }
    }

    fn read_sequence(&mut self, input: &mut dyn Read) -> Result<Value> {
        let len = codec::read_u32(input)? as usize;
        if len > self.config.max_sequence_len {
            return Err(Error::LimitExceeded {
                what: "sequence",
                limit: self.config.max_sequence_len,
                actual: len,
            });
        }
        let sequence = ObjRef::sequence(Vec::with_capacity(len.min(1024)));
        let handle = self.handles.intern_new(Value::Ref(sequence.clone()));
        trace!(handle, len, depth = self.depth, "sequence");

        for _ in 0..len {
            let item = self.read_value(input)?;
            if let Some(items) = sequence.write().as_sequence_mut() {
                items.push(item);
            }
        }
        Ok(Value::Ref(sequence))
    }

    fn read_instance(&mut self, input: &mut dyn Read) -> Result<Value> {
        let class_tag = codec::read_u8(input)?;
        let desc = self
            .classes
            .read_tagged(input, class_tag, &self.config)?
            .ok_or_else(|| Error::corrupt("object record without a class description"))?;
        let local = self.registry.resolve(&desc.name)?.clone();
        if !local.is_serializable() {
            return Err(incompatible(&local, "class is not serializable locally"));
        }
        if local.is_external() != desc.is_external() {
            return Err(incompatible(&local, "external encoding differs from the stream"));
        }

        let object = if local.is_external() {
            local.instantiate()?
        } else {
            ObjRef::from_instance(Instance::new(local.clone()))
        };
        let handle = self.handles.intern_new(Value::Ref(object.clone()));
        trace!(handle, class = %desc.name, depth = self.depth, "object record");

        if let Some(external) = local.hooks().external().cloned() {
            let mut slot = SlotReader::new(self, input, &object, &local, &desc);
            (external.read)(&object, &mut slot)?;
            slot.finish()?;
        } else {
            self.read_slots(input, &object, &local, &desc)?;
        }

        let Some(hook) = local.hooks().read_resolve().cloned() else {
            return Ok(Value::Ref(object));
        };
        let replacement = hook(&object)?;
        let unchanged = matches!(&replacement, Value::Ref(r) if r.ptr_eq(&object));
        if !unchanged {
            trace!(handle, class = local.name(), "read-resolve");
            self.handles.rebind(handle, &object, replacement.clone())?;
        }
        Ok(replacement)
    }

    fn read_slots(
        &mut self,
        input: &mut dyn Read,
        object: &ObjRef,
        local: &Arc<ClassDescriptor>,
        desc: &Arc<StreamClass>,
    ) -> Result<()> {
        let local_chain = local.serializable_lineage();
        let mut next_local = 0;

        for stream_class in desc.lineage() {
            let matched = local_chain[next_local..]
                .iter()
                .position(|c| c.name() == stream_class.name)
                .map(|offset| next_local + offset);
            match matched {
                Some(index) => {
                    for missing in &local_chain[next_local..index] {
                        no_data(object, missing)?;
                    }
                    self.read_slot(input, object, &local_chain[index], &stream_class)?;
                    next_local = index + 1;
                }
                None => {
                    debug!(
                        class = %stream_class.name,
                        local = local.name(),
                        "discarding slot of class absent from local chain"
                    );
                    self.skip_slot(input)?;
                }
            }
        }

        for missing in &local_chain[next_local..] {
            no_data(object, missing)?;
        }
        Ok(())
    }

    fn read_slot(
        &mut self,
        input: &mut dyn Read,
        object: &ObjRef,
        class: &Arc<ClassDescriptor>,
        stream_class: &Arc<StreamClass>,
    ) -> Result<()> {
        // a custom writer may leave its slot empty
        if class.hooks().read_no_data().is_some() && self.peek_tag(input)? == tags::END_SLOT {
            self.pending = None;
            return no_data(object, class);
        }
        let hook = class.hooks().read_slot().cloned();
        let mut slot = SlotReader::new(self, input, object, class, stream_class);
        match hook {
            Some(hook) => {
                trace!(class = class.name(), "custom slot");
                hook(object, &mut slot)?;
            }
            None => slot.read_default_fields()?,
        }
        slot.finish()
    }

    /// Consume values up to and including the next END_SLOT
    fn skip_slot(&mut self, input: &mut dyn Read) -> Result<()> {
        loop {
            let tag = self.next_tag(input)?;
            if tag == tags::END_SLOT {
                return Ok(());
            }
            self.read_tagged(input, tag)?;
        }
    }
}

fn no_data(object: &ObjRef, class: &ClassDescriptor) -> Result<()> {
    match class.hooks().read_no_data() {
        Some(hook) => {
            trace!(class = class.name(), "no stream data, running hook");
            hook(object)
        }
        None => Ok(()),
    }
}

fn incompatible(class: &ClassDescriptor, reason: impl Into<String>) -> Error {
    Error::IncompatibleClass {
        type_name: class.name().to_string(),
        reason: reason.into(),
    }
}

/// Slot source handed to read hooks
struct SlotReader<'a> {
    session: &'a mut ReadSession,
    input: &'a mut dyn Read,
    object: &'a ObjRef,
    class: &'a Arc<ClassDescriptor>,
    stream_class: &'a Arc<StreamClass>,
    ended: bool,
}

impl<'a> SlotReader<'a> {
    fn new(
        session: &'a mut ReadSession,
        input: &'a mut dyn Read,
        object: &'a ObjRef,
        class: &'a Arc<ClassDescriptor>,
        stream_class: &'a Arc<StreamClass>,
    ) -> Self {
        SlotReader {
            session,
            input,
            object,
            class,
            stream_class,
            ended: false,
        }
    }

    /// Discard whatever the hook left unread, through END_SLOT
    fn finish(self) -> Result<()> {
        if self.ended {
            return Ok(());
        }
        self.session.skip_slot(self.input)
    }

    fn assign(&mut self, field: &str, stream_type: FieldType, value: Value) -> Result<()> {
        let Some(own_index) = self.class.own_field_index(field) else {
            warn!(
                class = self.class.name(),
                field,
                "discarding stream field unknown to local class"
            );
            return Ok(());
        };
        let local_field = &self.class.fields()[own_index];
        if local_field.is_transient() {
            return Ok(());
        }
        if local_field.field_type() != stream_type {
            return Err(incompatible(
                self.class,
                format!(
                    "field {} is {} locally but {} in the stream",
                    field,
                    local_field.field_type().name(),
                    stream_type.name()
                ),
            ));
        }
        if !stream_type.accepts(&value) {
            return Err(Error::corrupt(format!(
                "field {}.{} declared {} but the stream holds {}",
                self.class.name(),
                field,
                stream_type.name(),
                value.type_name()
            )));
        }

        let index = self.class.slot_range().start + own_index;
        let mut guard = self.object.write();
        match guard.as_instance_mut() {
            Some(instance) => instance.set_at(index, value),
            None => Err(Error::corrupt("field assignment on a sequence")),
        }
    }
}

impl SlotRead for SlotReader<'_> {
    fn read_default_fields(&mut self) -> Result<()> {
        let fields = self.stream_class.fields.clone();
        for (name, field_type) in fields {
            if !self.has_remaining()? {
                break;
            }
            let value = self.read_value()?;
            self.assign(&name, field_type, value)?;
        }
        Ok(())
    }

    fn has_remaining(&mut self) -> Result<bool> {
        if self.ended {
            return Ok(false);
        }
        if self.session.peek_tag(&mut *self.input)? == tags::END_SLOT {
            self.session.pending = None;
            self.ended = true;
            return Ok(false);
        }
        Ok(true)
    }

    fn read_value(&mut self) -> Result<Value> {
        if !self.has_remaining()? {
            return Err(Error::corrupt(format!(
                "read past the end of the {} slot",
                self.stream_class.name
            )));
        }
        self.session.read_value(&mut *self.input)
    }
}
