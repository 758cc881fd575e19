//! Reference tables
//!
//! Both tables live exactly as long as one session and are never evicted.
//!
//! - [`ReferenceTable`] (write side): object identity → handle. Identity is
//!   the object's address; the table keeps a clone of every interned handle
//!   so an address cannot be freed and reused by another object while the
//!   session is open.
//! - [`HandleArena`] (read side): handle → reconstructed value, with
//!   rebinding for read-resolve substitutions.

use keepsake_core::{Error, ObjRef, Result, Value};
use rustc_hash::FxHashMap;

/// Session-scoped object handle
pub type Handle = u32;

/// Write-side identity map
#[derive(Debug, Default)]
pub struct ReferenceTable {
    by_identity: FxHashMap<usize, Handle>,
    pinned: Vec<ObjRef>,
    next: Handle,
}

impl ReferenceTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next handle to an object that has none yet
    pub fn intern_new(&mut self, object: &ObjRef) -> Handle {
        let handle = self.next;
        self.next += 1;
        self.by_identity.insert(object.id(), handle);
        self.pinned.push(object.clone());
        handle
    }

    /// Map an additional object onto an existing handle (write-replace originals)
    pub fn alias(&mut self, object: &ObjRef, handle: Handle) {
        self.by_identity.insert(object.id(), handle);
        self.pinned.push(object.clone());
    }

    /// Handle of an object, if it was already written in this session
    pub fn handle_of(&self, object: &ObjRef) -> Option<Handle> {
        self.by_identity.get(&object.id()).copied()
    }

    /// Check whether an object was already written in this session
    pub fn has_handle(&self, object: &ObjRef) -> bool {
        self.by_identity.contains_key(&object.id())
    }

    /// Number of handles assigned
    pub fn len(&self) -> usize {
        self.next as usize
    }

    /// Check whether no handle was assigned yet
    pub fn is_empty(&self) -> bool {
        self.next == 0
    }
}

/// Read-side arena of reconstructed values, indexed by handle
#[derive(Debug, Default)]
pub struct HandleArena {
    entries: Vec<Value>,
}

impl HandleArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the next handle to a value
    pub fn intern_new(&mut self, value: Value) -> Handle {
        self.entries.push(value);
        (self.entries.len() - 1) as Handle
    }

    /// Value bound to a handle
    pub fn resolve(&self, handle: Handle) -> Result<Value> {
        self.entries.get(handle as usize).cloned().ok_or_else(|| {
            Error::corrupt(format!(
                "back-reference to handle {} but only {} objects read",
                handle,
                self.entries.len()
            ))
        })
    }

    /// Replace the value bound to a handle.
    ///
    /// Every object reconstructed after `handle` that holds a direct
    /// reference to `original` is rewritten to hold `replacement` instead,
    /// so references materialised while the original was still being read
    /// (cycles) observe the substitution too.
    pub fn rebind(&mut self, handle: Handle, original: &ObjRef, replacement: Value) -> Result<()> {
        let index = handle as usize;
        if index >= self.entries.len() {
            return Err(Error::corrupt(format!("rebind of unknown handle {}", handle)));
        }
        for later in &self.entries[index + 1..] {
            if let Value::Ref(object) = later {
                object.rebind_references(original, &replacement);
            }
        }
        self.entries[index] = replacement;
        Ok(())
    }

    /// Number of handles bound
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no handle was bound yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
