//! An interned-string name manager (C2): strings in, stable dense ids out.

use crate::{entity_impl, EntityRef};
use std::collections::HashMap;
use std::rc::Rc;

/// An interned name id. Stable for the lifetime of the owning [`NameTable`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(u32);
entity_impl!(NameId, "name");

struct NameTableInner {
    strings: Vec<Box<str>>,
    ids: HashMap<Box<str>, NameId>,
}

/// A string interner mapping names to dense, stable, positive ids.
///
/// Cloning a `NameTable` is cheap and shares the underlying table (the
/// `Rc` *is* the reference count spec.md asks for): several `Ntk`s in the
/// same name domain can clone one `NameTable` and agree on ids without
/// re-interning.
#[derive(Clone)]
pub struct NameTable {
    inner: Rc<std::cell::RefCell<NameTableInner>>,
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NameTable {
    /// Create a new, empty name table.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(std::cell::RefCell::new(NameTableInner {
                strings: Vec::new(),
                ids: HashMap::new(),
            })),
        }
    }

    /// Intern `s`, returning its id. Interning the same string twice
    /// returns the same id and never reallocates the backing string.
    pub fn intern(&self, s: &str) -> NameId {
        let mut inner = self.inner.borrow_mut();
        if let Some(&id) = inner.ids.get(s) {
            return id;
        }
        let id = NameId::new(inner.strings.len());
        let boxed: Box<str> = s.into();
        inner.strings.push(boxed.clone());
        inner.ids.insert(boxed, id);
        log::trace!("interned name {s:?} as {id}");
        id
    }

    /// Resolve an id back to its string.
    pub fn resolve(&self, id: NameId) -> Box<str> {
        self.inner.borrow().strings[id.index()].clone()
    }

    /// Look up an already-interned name without inserting it.
    pub fn lookup(&self, s: &str) -> Option<NameId> {
        self.inner.borrow().ids.get(s).copied()
    }

    /// How many distinct strings this table has interned.
    pub fn len(&self) -> usize {
        self.inner.borrow().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live handles sharing this table (the "reference count on
    /// the table" from spec.md §3).
    pub fn refcount(&self) -> usize {
        Rc::strong_count(&self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let t = NameTable::new();
        let a = t.intern("foo");
        let b = t.intern("foo");
        assert_eq!(a, b);
        assert_eq!(t.len(), 1);
        assert_eq!(&*t.resolve(a), "foo");
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let t = NameTable::new();
        let a = t.intern("foo");
        let b = t.intern("bar");
        assert_ne!(a, b);
    }

    #[test]
    fn clone_shares_table_and_bumps_refcount() {
        let t = NameTable::new();
        let id = t.intern("shared");
        let t2 = t.clone();
        assert_eq!(t2.lookup("shared"), Some(id));
        assert_eq!(t.refcount(), 2);
    }
}
