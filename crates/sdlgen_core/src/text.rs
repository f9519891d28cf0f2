//! String interning for schema names.

use rustc_hash::FxHashMap;
use std::cell::RefCell;

/// An interned name identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Text(u32);

impl Text {
    /// Returns the raw index.
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

/// A string interner that deduplicates names across every parsed source.
///
/// One interner is shared by all sources of a schema load, so the same type
/// name in two files interns to the same [`Text`].
#[derive(Debug)]
pub struct Interner {
    map: RefCell<FxHashMap<String, Text>>,
    strings: RefCell<Vec<String>>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    /// Creates a new interner with the built-in scalar names pre-registered.
    #[must_use]
    pub fn new() -> Self {
        let interner = Self {
            map: RefCell::new(FxHashMap::default()),
            strings: RefCell::new(Vec::new()),
        };

        for name in ["Int", "Float", "String", "Boolean", "ID", "Query", "Mutation", "Subscription"] {
            interner.intern(name);
        }

        interner
    }

    /// Interns a string, returning its identifier.
    pub fn intern(&self, s: &str) -> Text {
        let mut map = self.map.borrow_mut();
        if let Some(&id) = map.get(s) {
            return id;
        }

        let mut strings = self.strings.borrow_mut();
        let id = Text(strings.len() as u32);
        strings.push(s.to_string());
        map.insert(s.to_string(), id);
        id
    }

    /// Gets the string for an identifier.
    #[must_use]
    pub fn get(&self, id: Text) -> String {
        self.strings
            .borrow()
            .get(id.0 as usize)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the number of interned strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.borrow().len()
    }

    /// Returns true if no strings are interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedupes() {
        let interner = Interner::new();
        let first = interner.intern("Product");
        let second = interner.intern("Product");
        let other = interner.intern("Review");

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(interner.get(other), "Review");
    }

    #[test]
    fn test_builtin_scalars_preregistered() {
        let interner = Interner::new();
        let before = interner.len();
        interner.intern("String");
        assert_eq!(interner.len(), before);
    }
}
