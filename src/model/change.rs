//! model::change
//!
//! Change-log entries, renditions and content streams.

use chrono::NaiveDateTime;

use super::acl::Acl;
use super::types::{CmisId, Properties};

/// Kind of change recorded in the change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
    Security,
    /// A value outside the four standard kinds.
    Other(String),
}

impl ChangeType {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "created" => ChangeType::Created,
            "updated" => ChangeType::Updated,
            "deleted" => ChangeType::Deleted,
            "security" => ChangeType::Security,
            other => ChangeType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChangeType::Created => "created",
            ChangeType::Updated => "updated",
            ChangeType::Deleted => "deleted",
            ChangeType::Security => "security",
            ChangeType::Other(s) => s,
        }
    }
}

/// One entry of the repository change log.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEntry {
    /// Entry id; AtomPub uses the entry's `atom:id`.
    pub id: String,
    pub object_id: Option<CmisId>,
    pub change_type: ChangeType,
    pub change_time: Option<NaiveDateTime>,
    /// May be partial depending on the repository's `Changes` capability.
    pub properties: Properties,
    pub acl: Option<Acl>,
}

/// An alternate representation of a document's content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendition {
    pub stream_id: Option<String>,
    pub mime_type: Option<String>,
    pub length: Option<i64>,
    pub title: Option<String>,
    pub kind: Option<String>,
    pub height: Option<i64>,
    pub width: Option<i64>,
    pub href: Option<String>,
    pub rendition_document_id: Option<String>,
}

/// Bytes of a content stream with their media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentStream {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ContentStream {
    /// Media type used when none is given.
    pub const DEFAULT_MIME_TYPE: &'static str = "application/binary";

    pub fn new(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::new(Self::DEFAULT_MIME_TYPE, data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Content decoded as UTF-8 (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}
