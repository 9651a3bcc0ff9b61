//! The typed pointer registry.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt::{Display, Write as _};
use std::hash::Hash;

use tracing::debug;

use crate::BagError;

/// Caller-settable diagnostic sink. Receives one formatted message
/// per reported failure.
type DiagnosticSink = Box<dyn Fn(&str)>;

struct Entry {
    ptr: *mut (),
    token: TypeId,
    type_name: &'static str,
    description: String,
}

/// Registry of typed raw pointers keyed by a caller-chosen key type.
///
/// Entries pair a pointer with the `TypeId` of its pointee, recorded
/// at registration. Lookups re-derive the token from the requested
/// type and fail descriptively on mismatch. The bag never follows the
/// pointers it stores.
///
/// Failures are returned as [`BagError`] and also reported through
/// the diagnostic sink (default: stderr).
pub struct ValueBag<K = String>
where
    K: Eq + Hash + Display,
{
    entries: HashMap<K, Entry>,
    sink: DiagnosticSink,
}

impl<K: Eq + Hash + Display> Default for ValueBag<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Display> ValueBag<K> {
    /// Creates an empty bag with the default stderr sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            sink: Box::new(|msg| eprintln!("ValueBag error: {msg}")),
        }
    }

    /// Replaces the diagnostic sink.
    pub fn set_error_sink(&mut self, sink: impl Fn(&str) + 'static) {
        self.sink = Box::new(sink);
    }

    fn report(&self, err: &BagError) {
        (self.sink)(&err.to_string());
    }

    /// Registers `ptr` under `key`.
    ///
    /// # Errors
    ///
    /// [`BagError::DuplicateKey`] if the key already has an entry,
    /// [`BagError::NullPointer`] if `ptr` is null. The existing entry
    /// survives a duplicate registration unchanged.
    pub fn register<T: 'static>(
        &mut self,
        key: K,
        ptr: *mut T,
        description: impl Into<String>,
    ) -> Result<(), BagError> {
        if ptr.is_null() {
            let err = BagError::NullPointer {
                key: key.to_string(),
            };
            self.report(&err);
            return Err(err);
        }
        if let Some(existing) = self.entries.get(&key) {
            let err = BagError::DuplicateKey {
                key: key.to_string(),
                registered: existing.type_name,
            };
            self.report(&err);
            return Err(err);
        }

        debug!(key = %key, ty = type_name::<T>(), "registering value");
        self.entries.insert(
            key,
            Entry {
                ptr: ptr.cast::<()>(),
                token: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                description: description.into(),
            },
        );
        Ok(())
    }

    /// Looks up the pointer registered under `key` at type `T`.
    ///
    /// # Errors
    ///
    /// [`BagError::KeyAbsent`] when no entry exists,
    /// [`BagError::TypeMismatch`] when the entry was registered at a
    /// different type; the error names both types.
    pub fn get<T: 'static>(&self, key: &K) -> Result<*mut T, BagError> {
        let Some(entry) = self.entries.get(key) else {
            let err = BagError::KeyAbsent {
                key: key.to_string(),
            };
            self.report(&err);
            return Err(err);
        };
        if entry.token != TypeId::of::<T>() {
            let err = BagError::TypeMismatch {
                key: key.to_string(),
                registered: entry.type_name,
                requested: type_name::<T>(),
            };
            self.report(&err);
            return Err(err);
        }
        Ok(entry.ptr.cast::<T>())
    }

    /// Like [`get`](Self::get) but collapses every failure to `None`.
    #[must_use]
    pub fn get_opt<T: 'static>(&self, key: &K) -> Option<*mut T> {
        let entry = self.entries.get(key)?;
        (entry.token == TypeId::of::<T>()).then(|| entry.ptr.cast::<T>())
    }

    /// Removes the entry under `key`. Returns whether one existed.
    /// The pointed-to memory is untouched either way.
    pub fn unregister(&mut self, key: &K) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            debug!(key = %key, "unregistered value");
        } else {
            self.report(&BagError::KeyAbsent {
                key: key.to_string(),
            });
        }
        removed
    }

    /// Drops every entry. Pointees are untouched.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!(count = self.entries.len(), "clearing value bag");
        }
        self.entries.clear();
    }

    /// Whether `key` has an entry of any type.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether `key` is registered specifically at type `T`.
    #[must_use]
    pub fn check_type<T: 'static>(&self, key: &K) -> bool {
        self.entries
            .get(key)
            .is_some_and(|e| e.token == TypeId::of::<T>())
    }

    /// Type name recorded for `key`, if registered.
    #[must_use]
    pub fn type_name_of(&self, key: &K) -> Option<&'static str> {
        self.entries.get(key).map(|e| e.type_name)
    }

    /// Description recorded for `key`, if registered.
    #[must_use]
    pub fn description_of(&self, key: &K) -> Option<&str> {
        self.entries.get(key).map(|e| e.description.as_str())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All registered keys, in unspecified order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Human-readable summary of every entry.
    #[must_use]
    pub fn statistics(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "ValueBag: {} entries", self.entries.len());
        let mut lines: Vec<String> = self
            .entries
            .iter()
            .map(|(key, e)| {
                if e.description.is_empty() {
                    format!("  {key}: {}", e.type_name)
                } else {
                    format!("  {key}: {} ({})", e.type_name, e.description)
                }
            })
            .collect();
        lines.sort();
        for line in lines {
            let _ = writeln!(out, "{line}");
        }
        out
    }
}
