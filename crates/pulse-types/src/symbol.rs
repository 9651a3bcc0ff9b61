//! Process-wide interned strings.
//!
//! A [`Symbol`] is a handle into a global append-only string pool:
//! interning the same text twice yields the same id, so equality,
//! ordering, and hashing are integer operations. Symbols are intended
//! as key types for the event bus and the action pipeline, where key
//! comparison sits on the hot dispatch path.
//!
//! # Pool contract
//!
//! - `get-or-assign` is serialized by a mutex; the pool is the only
//!   pulse structure that may be touched from multiple threads.
//! - Ids are assigned in interning order starting at 0 and are never
//!   reissued; the id→string slot is append-only.
//! - Ids are stable within a process and unstable across processes.
//!   Do not persist them; this is also why [`Symbol`] deliberately
//!   does not implement serde traits.
//!
//! # Ordering
//!
//! `Ord` compares ids, i.e. interning order, not lexicographic order.
//! Two runs interning the same strings in a different order will
//! order them differently.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use parking_lot::Mutex;

/// An interned string with integer identity.
///
/// # Example
///
/// ```
/// use pulse_types::Symbol;
///
/// let a = Symbol::new("cursor/move");
/// let b = Symbol::new("cursor/move");
/// let c = Symbol::new("cursor/blink");
///
/// assert_eq!(a, b);
/// assert_eq!(a.id(), b.id());
/// assert_ne!(a, c);
/// assert_eq!(a.as_str(), "cursor/move");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

struct Pool {
    by_text: HashMap<&'static str, u32>,
    by_id: Vec<&'static str>,
}

fn pool() -> &'static Mutex<Pool> {
    static POOL: OnceLock<Mutex<Pool>> = OnceLock::new();
    POOL.get_or_init(|| {
        Mutex::new(Pool {
            by_text: HashMap::new(),
            by_id: Vec::new(),
        })
    })
}

impl Symbol {
    /// Interns `text`, returning the existing symbol if the text was
    /// seen before and a freshly assigned one otherwise.
    pub fn new(text: &str) -> Self {
        let mut pool = pool().lock();
        if let Some(&id) = pool.by_text.get(text) {
            return Symbol(id);
        }
        // Entries live for the process lifetime; the pool is append-only,
        // which is what makes handing out &'static str sound.
        let leaked: &'static str = Box::leak(text.to_owned().into_boxed_str());
        let id = u32::try_from(pool.by_id.len()).expect("symbol pool exhausted");
        pool.by_text.insert(leaked, id);
        pool.by_id.push(leaked);
        Symbol(id)
    }

    /// The pool id of this symbol. Process-local; never persist it.
    #[must_use]
    pub fn id(self) -> u32 {
        self.0
    }

    /// The interned text.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        pool().lock().by_id[self.0 as usize]
    }
}

impl Default for Symbol {
    /// The symbol for the empty string.
    fn default() -> Self {
        Symbol::new("")
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?}#{})", self.as_str(), self.0)
    }
}

impl From<&str> for Symbol {
    fn from(text: &str) -> Self {
        Symbol::new(text)
    }
}
