//! model::types
//!
//! Value types carried by CMIS objects.
//!
//! # Types
//!
//! - [`CmisId`] - Distinguished string used for object, type, and version ids
//! - [`PropertyType`] - The CMIS property data types
//! - [`PropertyValue`] - A decoded property value (single, multi, or null)
//! - [`Properties`] - Property-definition-id to value mapping
//!
//! # Datetimes
//!
//! Datetime values keep only whole seconds and drop any timezone offset:
//! `2009-12-15T09:45:35.369-06:00` decodes to `2009-12-15T09:45:35`. Values
//! round-trip through this client without their offset, so a server that
//! compares timestamps exactly may see a different instant.
//!
//! # Examples
//!
//! ```
//! use cmisclient::model::{parse_datetime, PropertyValue};
//!
//! let dt = parse_datetime("2009-12-15T09:45:35.369-06:00").unwrap();
//! assert_eq!(dt.to_string(), "2009-12-15 09:45:35");
//!
//! let v = PropertyValue::from("hello");
//! assert_eq!(v.as_str(), Some("hello"));
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{CmisError, Result};

/// An identifier in a CMIS repository.
///
/// Distinguishing ids from plain strings matters on write: an id value is
/// sent as an id-typed property, a string as a string-typed one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CmisId(String);

impl CmisId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for CmisId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CmisId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<CmisId> for String {
    fn from(id: CmisId) -> Self {
        id.0
    }
}

impl AsRef<str> for CmisId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CmisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// CMIS property data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Id,
    Boolean,
    Integer,
    Decimal,
    DateTime,
    Uri,
    Html,
}

impl PropertyType {
    /// Local name of the AtomPub element carrying this type.
    pub fn element_name(&self) -> &'static str {
        match self {
            PropertyType::String => "propertyString",
            PropertyType::Id => "propertyId",
            PropertyType::Boolean => "propertyBoolean",
            PropertyType::Integer => "propertyInteger",
            PropertyType::Decimal => "propertyDecimal",
            PropertyType::DateTime => "propertyDateTime",
            PropertyType::Uri => "propertyUri",
            PropertyType::Html => "propertyHtml",
        }
    }

    /// Lower-case name used by type definitions and the Browser binding.
    pub fn name(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Id => "id",
            PropertyType::Boolean => "boolean",
            PropertyType::Integer => "integer",
            PropertyType::Decimal => "decimal",
            PropertyType::DateTime => "datetime",
            PropertyType::Uri => "uri",
            PropertyType::Html => "html",
        }
    }

    pub fn from_element_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.element_name() == name)
    }

    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Self::all().iter().copied().find(|t| t.name() == lower)
    }

    pub fn all() -> &'static [PropertyType] {
        &[
            PropertyType::String,
            PropertyType::Id,
            PropertyType::Boolean,
            PropertyType::Integer,
            PropertyType::Decimal,
            PropertyType::DateTime,
            PropertyType::Uri,
            PropertyType::Html,
        ]
    }

    /// Decode one textual wire value.
    ///
    /// # Errors
    ///
    /// Returns `CmisError::Runtime` for numbers that do not parse.
    pub fn decode(&self, text: &str) -> Result<PropertyValue> {
        // string-like values are returned exactly as stored
        let trimmed = text.trim();
        Ok(match self {
            PropertyType::String => PropertyValue::String(text.to_string()),
            PropertyType::Uri => PropertyValue::Uri(text.to_string()),
            PropertyType::Html => PropertyValue::Html(text.to_string()),
            PropertyType::Id => PropertyValue::Id(CmisId::new(text)),
            PropertyType::Boolean => {
                if trimmed.eq_ignore_ascii_case("true") {
                    PropertyValue::Boolean(true)
                } else if trimmed.eq_ignore_ascii_case("false") {
                    PropertyValue::Boolean(false)
                } else {
                    PropertyValue::Null
                }
            }
            PropertyType::Integer => PropertyValue::Integer(trimmed.parse().map_err(|_| {
                CmisError::protocol(format!("invalid integer property value '{}'", trimmed))
            })?),
            PropertyType::Decimal => PropertyValue::Decimal(trimmed.parse().map_err(|_| {
                CmisError::protocol(format!("invalid decimal property value '{}'", trimmed))
            })?),
            PropertyType::DateTime => match parse_datetime(trimmed) {
                Some(dt) => PropertyValue::DateTime(dt),
                None => {
                    tracing::warn!(value = trimmed, "unparsable datetime property value");
                    PropertyValue::Null
                }
            },
        })
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Id(CmisId),
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    DateTime(NaiveDateTime),
    Uri(String),
    Html(String),
    /// Multi-valued property.
    Multi(Vec<PropertyValue>),
    /// Property element present with no value.
    Null,
}

impl PropertyValue {
    /// The wire type of this value, or `None` for null and empty lists.
    pub fn property_type(&self) -> Option<PropertyType> {
        match self {
            PropertyValue::String(_) => Some(PropertyType::String),
            PropertyValue::Id(_) => Some(PropertyType::Id),
            PropertyValue::Boolean(_) => Some(PropertyType::Boolean),
            PropertyValue::Integer(_) => Some(PropertyType::Integer),
            PropertyValue::Decimal(_) => Some(PropertyType::Decimal),
            PropertyValue::DateTime(_) => Some(PropertyType::DateTime),
            PropertyValue::Uri(_) => Some(PropertyType::Uri),
            PropertyValue::Html(_) => Some(PropertyType::Html),
            PropertyValue::Multi(values) => values.iter().find_map(|v| v.property_type()),
            PropertyValue::Null => None,
        }
    }

    /// Textual content of string-like values (string, id, uri, html).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) | PropertyValue::Uri(s) | PropertyValue::Html(s) => Some(s),
            PropertyValue::Id(id) => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Decimal(d) => Some(*d),
            PropertyValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            PropertyValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Values as a list; a single value becomes a one-element list and null
    /// becomes an empty one.
    pub fn values(&self) -> Vec<&PropertyValue> {
        match self {
            PropertyValue::Multi(values) => values.iter().collect(),
            PropertyValue::Null => Vec::new(),
            single => vec![single],
        }
    }

    /// Wire text for each value, in order.
    pub fn to_wire_strings(&self) -> Vec<String> {
        self.values().into_iter().filter_map(|v| v.wire_string()).collect()
    }

    fn wire_string(&self) -> Option<String> {
        match self {
            PropertyValue::String(s) | PropertyValue::Uri(s) | PropertyValue::Html(s) => {
                Some(s.clone())
            }
            PropertyValue::Id(id) => Some(id.to_string()),
            PropertyValue::Boolean(b) => Some(b.to_string()),
            PropertyValue::Integer(i) => Some(i.to_string()),
            PropertyValue::Decimal(d) => Some(d.to_string()),
            PropertyValue::DateTime(dt) => Some(format_datetime(dt)),
            PropertyValue::Multi(_) | PropertyValue::Null => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<CmisId> for PropertyValue {
    fn from(id: CmisId) -> Self {
        PropertyValue::Id(id)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(d: f64) -> Self {
        PropertyValue::Decimal(d)
    }
}

impl From<NaiveDateTime> for PropertyValue {
    fn from(dt: NaiveDateTime) -> Self {
        PropertyValue::DateTime(dt)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(values: Vec<T>) -> Self {
        PropertyValue::Multi(values.into_iter().map(Into::into).collect())
    }
}

/// Property-definition-id to value mapping, ordered by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(BTreeMap<String, PropertyValue>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, id: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(id, value);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<PropertyValue>) {
        self.0.insert(id.into(), value.into());
    }

    pub fn get(&self, id: &str) -> Option<&PropertyValue> {
        self.0.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<PropertyValue> {
        self.0.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    /// String-like value of a property; `None` when absent, null, or not textual.
    pub fn get_str(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(PropertyValue::as_str)
    }

    pub fn get_bool(&self, id: &str) -> Option<bool> {
        self.get(id).and_then(PropertyValue::as_bool)
    }

    pub fn get_i64(&self, id: &str) -> Option<i64> {
        self.get(id).and_then(PropertyValue::as_i64)
    }

    pub fn get_id(&self, id: &str) -> Option<CmisId> {
        self.get_str(id).map(CmisId::from)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay `other` on top of `self`.
    pub fn extend(&mut self, other: Properties) {
        self.0.extend(other.0);
    }
}

impl FromIterator<(String, PropertyValue)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Properties {
    type Item = (String, PropertyValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Parse a wire datetime, keeping whole seconds and ignoring the offset.
///
/// Only the leading `YYYY-MM-DDTHH:MM:SS` is read; anything after it
/// (fraction, `Z`, `+hh:mm`) is discarded.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let head = text.trim().get(..19)?;
    NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S").ok()
}

/// Convert epoch milliseconds (Browser binding) under the same rule.
pub fn datetime_from_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc())
        .and_then(|dt| dt.with_nanosecond(0))
}

/// Render a datetime for the wire.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}
