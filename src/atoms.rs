//! Process-wide atom interning.
//!
//! Interning the same name twice yields the same [`Atom`] identity for the lifetime
//! of the process. The table is lazily created, never evicts, and is safe to use from
//! concurrent compilations.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};

static GLOBAL_ATOMS: Lazy<AtomTable> = Lazy::new(AtomTable::new);

/// An interned atom name. Equality is identity.
#[derive(Debug, Clone)]
pub struct Atom(Arc<str>);

impl Atom {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Atom {}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

impl Serialize for Atom {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Debug, Default)]
pub struct AtomTable {
    atoms: Mutex<HashMap<String, Atom>>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shared by every compilation in this process.
    pub fn global() -> &'static AtomTable {
        &GLOBAL_ATOMS
    }

    pub fn intern(&self, name: &str) -> Atom {
        // A panic elsewhere cannot leave the map half-written, so a poisoned lock is still usable.
        let mut atoms = self.atoms.lock().unwrap_or_else(PoisonError::into_inner);
        atoms
            .entry(name.to_string())
            .or_insert_with(|| Atom(Arc::from(name)))
            .clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.atoms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Intern `name` in the process-wide table.
pub fn intern(name: &str) -> Atom {
    AtomTable::global().intern(name)
}
