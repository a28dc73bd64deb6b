//! Object mapping definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Describes how a response/request payload maps onto an object class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ObjectMapping {
    /// Target object class name
    pub object_class: String,
    /// Attribute mappings, source key path to destination property
    #[serde(default)]
    pub attributes: AttributeMappings,
    /// Relationship mappings keyed by source key path
    #[serde(default)]
    pub relationships: BTreeMap<String, RelationshipMapping>,
    /// Attributes used to identify existing objects
    #[serde(default)]
    pub identification_attributes: Vec<String>,
}

/// Attribute mappings, given either as a list of identical names or as a
/// source-to-destination table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AttributeSpec", into = "BTreeMap<String, String>")]
pub struct AttributeMappings(BTreeMap<String, String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum AttributeSpec {
    List(Vec<String>),
    Table(BTreeMap<String, String>),
}

impl From<AttributeSpec> for AttributeMappings {
    fn from(spec: AttributeSpec) -> Self {
        match spec {
            AttributeSpec::List(names) => {
                AttributeMappings(names.into_iter().map(|n| (n.clone(), n)).collect())
            }
            AttributeSpec::Table(table) => AttributeMappings(table),
        }
    }
}

impl From<AttributeMappings> for BTreeMap<String, String> {
    fn from(mappings: AttributeMappings) -> Self {
        mappings.0
    }
}

impl AttributeMappings {
    /// Destination property for a source key path
    pub fn destination(&self, source: &str) -> Option<&str> {
        self.0.get(source).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Nested mapping for a relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RelationshipMapping {
    /// Name of the object mapping used for the related objects
    pub mapping: String,
    /// Destination property, defaults to the source key path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_key_path: Option<String>,
}

impl ObjectMapping {
    /// Names of the mappings referenced by relationships
    pub fn referenced_mappings(&self) -> impl Iterator<Item = &str> {
        self.relationships.values().map(|r| r.mapping.as_str())
    }
}
