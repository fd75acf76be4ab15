use std::collections::HashMap;

/// The raw representation of a rule name or token kind inside a tree.
///
/// Names are interned per tree, so a `NameId` is meaningless
/// outside of the tree (or builder) that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct NameId(u16);

impl NameId {
    /// Names must fit in the 14 bits a tag leaves free.
    pub(crate) const MAX: u16 = (1 << 14) - 1;

    pub(crate) fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub(crate) fn to_raw(self) -> u16 {
        self.0
    }
}

#[derive(Debug, Default)]
pub(crate) struct NameInterner {
    names: Vec<Box<str>>,
    ids: HashMap<Box<str>, NameId>,
}

impl NameInterner {
    pub(crate) fn intern(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }

        let raw = self.names.len();
        assert!(
            raw <= usize::from(NameId::MAX),
            "too many distinct names: at most {} rule names and token kinds fit in one tree",
            NameId::MAX as usize + 1
        );

        let id = NameId(raw as u16);
        self.names.push(name.into());
        self.ids.insert(name.into(), id);
        id
    }

    pub(crate) fn finish(self) -> NameTable {
        NameTable { names: self.names.into_boxed_slice() }
    }
}

/// The frozen names of a finished tree.
#[derive(Debug, Clone)]
pub(crate) struct NameTable {
    names: Box<[Box<str>]>,
}

impl NameTable {
    pub(crate) fn resolve(&self, id: NameId) -> &str {
        &self.names[usize::from(id.0)]
    }
}
