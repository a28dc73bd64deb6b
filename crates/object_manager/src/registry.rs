//! Registry of named object mappings

use serde::Serialize;
use std::collections::BTreeMap;
use types::{ManagerError, ManagerResult, ObjectMapping};

/// Object mappings keyed by the name descriptors refer to them by
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MappingRegistry {
    mappings: BTreeMap<String, ObjectMapping>,
}

impl MappingRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapping, refusing duplicate names
    pub fn register(&mut self, name: &str, mapping: ObjectMapping) -> ManagerResult {
        if name.is_empty() {
            return Err(ManagerError::InvalidValue {
                field: "mapping name".to_string(),
                message: "Mapping name cannot be empty".to_string(),
            });
        }

        if mapping.object_class.is_empty() {
            return Err(ManagerError::InvalidValue {
                field: format!("{}.objectClass", name),
                message: "Object class cannot be empty".to_string(),
            });
        }

        if self.mappings.contains_key(name) {
            return Err(ManagerError::DuplicateMapping {
                name: name.to_string(),
            });
        }

        self.mappings.insert(name.to_string(), mapping);
        Ok(())
    }

    /// Get a mapping by name
    pub fn get(&self, name: &str) -> Option<&ObjectMapping> {
        self.mappings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mappings.contains_key(name)
    }

    /// Names of all registered mappings, sorted
    pub fn names(&self) -> Vec<&str> {
        self.mappings.keys().map(String::as_str).collect()
    }

    /// Mappings whose object class matches `object_class`
    pub fn for_class<'a>(&'a self, object_class: &'a str) -> impl Iterator<Item = (&'a str, &'a ObjectMapping)> {
        self.mappings
            .iter()
            .filter(move |(_, m)| m.object_class == object_class)
            .map(|(n, m)| (n.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
