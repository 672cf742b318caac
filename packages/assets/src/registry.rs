//! Short type names and their canonical identifiers.

use std::collections::HashMap;

use crate::{Payload, PayloadKind, RegistryError};

/// One registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    short_name: String,
    kind: PayloadKind,
}

impl TypeEntry {
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn type_url(&self) -> &'static str {
        self.kind.type_url()
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    /// A fresh payload of this type with every field unset.
    pub fn instantiate(&self) -> Payload {
        self.kind.zero()
    }
}

/// Maps short names to payload types and back, one to one.
///
/// The registry is built once and then only read; share it behind an
/// `Arc` between the marshaler and every script run.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    entries: Vec<TypeEntry>,
    by_name: HashMap<String, usize>,
    by_url: HashMap<&'static str, usize>,
}

impl TypeRegistry {
    /// A registry with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding every payload kind under its standard short name.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for kind in PayloadKind::ALL {
            registry.entries.push(TypeEntry {
                short_name: kind.short_name().to_string(),
                kind,
            });
            let index = registry.entries.len() - 1;
            registry.by_name.insert(kind.short_name().to_string(), index);
            registry.by_url.insert(kind.type_url(), index);
        }
        registry
    }

    /// Register `kind` under `short_name`.
    ///
    /// Both the name and the kind's identifier must be new to the registry.
    pub fn register(
        &mut self,
        short_name: impl Into<String>,
        kind: PayloadKind,
    ) -> Result<(), RegistryError> {
        let short_name = short_name.into();
        if self.by_name.contains_key(&short_name) {
            return Err(RegistryError::DuplicateName(short_name));
        }
        if let Some(&index) = self.by_url.get(kind.type_url()) {
            return Err(RegistryError::DuplicateType {
                type_url: kind.type_url().to_string(),
                existing: self.entries[index].short_name.clone(),
            });
        }

        let index = self.entries.len();
        self.by_name.insert(short_name.clone(), index);
        self.by_url.insert(kind.type_url(), index);
        self.entries.push(TypeEntry { short_name, kind });
        Ok(())
    }

    pub fn lookup(&self, short_name: &str) -> Option<&TypeEntry> {
        self.by_name.get(short_name).map(|&i| &self.entries[i])
    }

    /// Find the entry for a canonical type identifier.
    pub fn resolve(&self, type_url: &str) -> Option<&TypeEntry> {
        self.by_url.get(type_url).map(|&i| &self.entries[i])
    }

    pub fn short_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.short_name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
