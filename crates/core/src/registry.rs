//! Type registry and process-wide singletons
//!
//! - [`TypeRegistry`]: name → class lookup used by readers to resolve the
//!   type identifiers found in a stream
//! - [`SingletonRegistry`]: canonical instances keyed by class name, used by
//!   read-resolve hooks to preserve singletons across a round trip

use crate::class::ClassDescriptor;
use crate::error::{Error, Result};
use crate::value::ObjRef;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Classes known to a reader
///
/// Built once, then shared read-only (typically behind an `Arc`).
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    classes: FxHashMap<String, Arc<ClassDescriptor>>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class and its supertype chain.
    ///
    /// Registering the same descriptor twice is a no-op; registering a
    /// different descriptor under an existing name is an error.
    pub fn register(&mut self, class: &Arc<ClassDescriptor>) -> Result<&mut Self> {
        for c in class.lineage() {
            match self.classes.get(c.name()) {
                Some(existing) if Arc::ptr_eq(existing, &c) => {}
                Some(_) => {
                    return Err(Error::InvalidClass(format!(
                        "{} is already registered with a different definition",
                        c.name()
                    )))
                }
                None => {
                    self.classes.insert(c.name().to_string(), c);
                }
            }
        }
        Ok(self)
    }

    /// Register several classes
    pub fn register_all<'a>(
        &mut self,
        classes: impl IntoIterator<Item = &'a Arc<ClassDescriptor>>,
    ) -> Result<&mut Self> {
        for class in classes {
            self.register(class)?;
        }
        Ok(self)
    }

    /// Look up a class by name
    pub fn get(&self, name: &str) -> Option<&Arc<ClassDescriptor>> {
        self.classes.get(name)
    }

    /// Look up a class by name, failing with `UnknownType`
    pub fn resolve(&self, name: &str) -> Result<&Arc<ClassDescriptor>> {
        self.get(name).ok_or_else(|| Error::UnknownType {
            type_name: name.to_string(),
        })
    }

    /// Check whether a class is registered
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Registered class names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Created on first access, never destroyed.
static SINGLETONS: Lazy<Mutex<FxHashMap<String, ObjRef>>> =
    Lazy::new(|| Mutex::new(FxHashMap::default()));

/// Process-wide registry of canonical instances
///
/// A read-resolve hook that returns [`SingletonRegistry::canonical`] makes a
/// class round-trip to the one live instance instead of a copy.
pub struct SingletonRegistry;

impl SingletonRegistry {
    /// Get the canonical instance for a type, creating it with `init` on first access.
    ///
    /// `init` runs without the registry lock held. If two callers race, the
    /// first insertion wins and both observe the same instance.
    pub fn canonical<F>(type_name: &str, init: F) -> Result<ObjRef>
    where
        F: FnOnce() -> Result<ObjRef>,
    {
        if let Some(existing) = Self::get(type_name) {
            return Ok(existing);
        }
        let created = init()?;
        let mut map = SINGLETONS.lock();
        Ok(map
            .entry(type_name.to_string())
            .or_insert(created)
            .clone())
    }

    /// Get the canonical instance for a type if it exists
    pub fn get(type_name: &str) -> Option<ObjRef> {
        SINGLETONS.lock().get(type_name).cloned()
    }

    /// Check whether a canonical instance exists for a type
    pub fn contains(type_name: &str) -> bool {
        SINGLETONS.lock().contains_key(type_name)
    }
}
