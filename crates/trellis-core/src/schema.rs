//! Versioned schema definitions for workspace entity and edge types

use crate::error::{Error, Result, ValidationIssue};
use crate::workspace::WorkspaceId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Scalar property types a schema can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Integer,
    Float,
    Boolean,
}

/// One declared property of an entity or edge type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub property_type: PropertyType,
    #[serde(default)]
    pub required: bool,
}

/// One declared entity or edge type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(
        mut self,
        name: impl Into<String>,
        property_type: PropertyType,
        required: bool,
    ) -> Self {
        self.properties.push(PropertyDefinition {
            name: name.into(),
            property_type,
            required,
        });
        self
    }
}

/// The registered schema of a workspace
///
/// One definition per workspace. `version` is a monotonic counter
/// advanced by every successful upsert; writers must present the
/// version they read, or the registry rejects the write as stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub workspace_id: WorkspaceId,
    pub entity_types: Vec<TypeDefinition>,
    pub edge_types: Vec<TypeDefinition>,
    pub version: u64,
}

/// Caller-supplied schema content for an upsert
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaInput {
    pub entity_types: Vec<TypeDefinition>,
    pub edge_types: Vec<TypeDefinition>,
    /// Version the caller last read; ignored when no schema exists yet
    pub version: Option<u64>,
}

impl SchemaInput {
    /// Validate schema content, collecting every issue rather than
    /// stopping at the first.
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();
        validate_type_list("entity_types", &self.entity_types, &mut issues);
        validate_type_list("edge_types", &self.edge_types, &mut issues);

        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(issues))
        }
    }
}

fn validate_type_list(field: &str, types: &[TypeDefinition], issues: &mut Vec<ValidationIssue>) {
    let mut seen = HashSet::new();
    for def in types {
        if def.name.is_empty() {
            issues.push(ValidationIssue::for_field(field, "type name cannot be empty"));
        } else if !seen.insert(def.name.as_str()) {
            issues.push(ValidationIssue::for_field(
                field,
                format!("duplicate type name: {}", def.name),
            ));
        }

        let mut seen_props = HashSet::new();
        for prop in &def.properties {
            if prop.name.is_empty() {
                issues.push(ValidationIssue::for_field(
                    field,
                    format!("type {}: property name cannot be empty", def.name),
                ));
            } else if !seen_props.insert(prop.name.as_str()) {
                issues.push(ValidationIssue::for_field(
                    field,
                    format!("type {}: duplicate property name: {}", def.name, prop.name),
                ));
            }
        }
    }
}
