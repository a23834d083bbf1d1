use std::collections::HashMap;

use crate::error::{CodecError, Result};

/// Constructor tag a registry name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializerKind {
    Plain,
    Compressed,
    Batched,
}

impl SerializerKind {
    /// Number of arguments the constructor takes in a builder expression
    /// beyond the implicit name: (inner serializer, scalar parameters).
    pub(crate) fn arity(self) -> (bool, bool) {
        match self {
            SerializerKind::Plain => (false, false),
            SerializerKind::Compressed => (true, false),
            SerializerKind::Batched => (true, true),
        }
    }
}

/// Case-insensitive name-to-constructor lookup table with aliases.
///
/// Built once and shared read-only afterwards; registration is expected to
/// complete before the high-concurrency accept phase begins.
#[derive(Debug, Clone)]
pub struct SerializerRegistry {
    entries: HashMap<String, SerializerKind>,
}

impl SerializerRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a constructor under one or more aliases.
    ///
    /// Names are folded to lowercase; a later registration of an existing
    /// name overwrites the previous mapping.
    pub fn register(&mut self, names: &[&str], kind: SerializerKind) {
        for name in names {
            self.entries.insert(name.to_lowercase(), kind);
        }
    }

    /// Non-strict lookup: `None` if the name is not registered.
    pub fn find(&self, name: &str) -> Option<SerializerKind> {
        self.entries.get(&name.to_lowercase()).copied()
    }

    /// Strict lookup: a miss is a typed error.
    pub fn find_strict(&self, name: &str) -> Result<SerializerKind> {
        self.find(name)
            .ok_or_else(|| CodecError::UnknownSerializer(name.to_string()))
    }

    /// Registered names, sorted, for diagnostics.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for SerializerRegistry {
    /// Registry preloaded with the built-in constructors.
    ///
    /// `base` is the short alias for the base codec so trivial pipelines can
    /// be expressed tersely.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(&["plain", "base", "basic"], SerializerKind::Plain);
        registry.register(&["compressed", "zip"], SerializerKind::Compressed);
        registry.register(&["batched", "batch"], SerializerKind::Batched);
        registry
    }
}
