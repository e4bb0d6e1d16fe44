//! model::object_type
//!
//! Object type and property definitions.

use std::collections::BTreeMap;

use tracing::debug;

use super::object::BaseType;
use super::types::PropertyType;
use crate::error::{CmisError, Result};
use crate::repository::Repository;

/// Whether a property holds one value or a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    Multi,
}

impl Cardinality {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Some(Cardinality::Single),
            "multi" => Some(Cardinality::Multi),
            _ => None,
        }
    }
}

/// When a property may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Updatability {
    ReadOnly,
    ReadWrite,
    WhenCheckedOut,
    OnCreate,
}

impl Updatability {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "readonly" => Some(Updatability::ReadOnly),
            "readwrite" => Some(Updatability::ReadWrite),
            "whencheckedout" => Some(Updatability::WhenCheckedOut),
            "oncreate" => Some(Updatability::OnCreate),
            _ => None,
        }
    }
}

/// Metadata for one property of an object type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDefinition {
    pub id: String,
    pub local_name: Option<String>,
    pub local_namespace: Option<String>,
    pub display_name: Option<String>,
    pub query_name: Option<String>,
    pub description: Option<String>,
    pub property_type: Option<PropertyType>,
    pub cardinality: Option<Cardinality>,
    pub updatability: Option<Updatability>,
    pub inherited: bool,
    pub required: bool,
    pub queryable: bool,
    pub orderable: bool,
    pub open_choice: bool,
}

/// Metadata describing an object type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDefinition {
    pub id: String,
    pub local_name: Option<String>,
    pub local_namespace: Option<String>,
    pub display_name: Option<String>,
    pub query_name: Option<String>,
    pub description: Option<String>,
    pub base_id: Option<BaseType>,
    pub parent_id: Option<String>,
    pub creatable: bool,
    pub fileable: bool,
    pub queryable: bool,
    pub fulltext_indexed: bool,
    pub included_in_supertype_query: bool,
    pub controllable_policy: bool,
    pub controllable_acl: bool,
    /// Absent when the server omitted them (type listings usually do).
    pub property_definitions: Option<BTreeMap<String, PropertyDefinition>>,
}

/// An object type bound to its repository.
///
/// Listings often omit property definitions; [`ObjectType::property_definitions`]
/// fetches the full definition the first time they are needed.
#[derive(Debug, Clone)]
pub struct ObjectType {
    repository: Repository,
    definition: TypeDefinition,
}

impl ObjectType {
    pub(crate) fn new(repository: Repository, definition: TypeDefinition) -> Self {
        Self {
            repository,
            definition,
        }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn base_id(&self) -> Option<BaseType> {
        self.definition.base_id
    }

    pub fn display_name(&self) -> Option<&str> {
        self.definition.display_name.as_deref()
    }

    pub fn definition(&self) -> &TypeDefinition {
        &self.definition
    }

    pub fn into_definition(self) -> TypeDefinition {
        self.definition
    }

    /// Re-fetch the type definition.
    pub async fn reload(&mut self) -> Result<()> {
        debug!(type_id = %self.definition.id, "reloading type definition");
        let data = self.repository.data().await?;
        self.definition = self
            .repository
            .binding()
            .get_type_definition(&data, &self.definition.id)
            .await?;
        Ok(())
    }

    /// Property definitions, fetched on first use.
    ///
    /// # Errors
    ///
    /// Returns `CmisError::Runtime` if the server's full definition still
    /// carries none.
    pub async fn property_definitions(&mut self) -> Result<&BTreeMap<String, PropertyDefinition>> {
        if self.definition.property_definitions.is_none() {
            self.reload().await?;
        }
        self.definition.property_definitions.as_ref().ok_or_else(|| {
            CmisError::protocol(format!(
                "type '{}' returned no property definitions",
                self.definition.id
            ))
        })
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.definition.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cardinality() {
        assert_eq!(Cardinality::parse("single"), Some(Cardinality::Single));
        assert_eq!(Cardinality::parse("MULTI"), Some(Cardinality::Multi));
        assert_eq!(Cardinality::parse("many"), None);
    }

    #[test]
    fn parse_updatability() {
        assert_eq!(Updatability::parse("readonly"), Some(Updatability::ReadOnly));
        assert_eq!(Updatability::parse("readwrite"), Some(Updatability::ReadWrite));
        assert_eq!(
            Updatability::parse("whencheckedout"),
            Some(Updatability::WhenCheckedOut)
        );
        assert_eq!(Updatability::parse("oncreate"), Some(Updatability::OnCreate));
        assert_eq!(Updatability::parse("sometimes"), None);
    }
}
