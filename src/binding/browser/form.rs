//! binding::browser::form
//!
//! Form bodies for Browser binding writes.
//!
//! Every write is a POST whose `cmisaction` field names the operation.
//! Properties travel as indexed pairs:
//!
//! ```text
//! propertyId[0]=cmis:name        propertyValue[0]=report.txt
//! propertyId[1]=dc:subjects      propertyValue[1][0]=a
//!                                propertyValue[1][1]=b
//! ```
//!
//! A property with no value is sent as its id alone, which clears it.
//! Datetimes are sent as epoch milliseconds.

use crate::model::{Acl, Options, Properties, PropertyValue};
use crate::transport::multipart::{self, FilePart};

pub(crate) const FORM_TYPE: &str = "application/x-www-form-urlencoded";

/// An ordered list of form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Form {
    fields: Vec<(String, String)>,
}

impl Form {
    pub fn action(action: &str) -> Self {
        Self::default().field("cmisaction", action)
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn object_id(self, id: impl Into<String>) -> Self {
        self.field("objectId", id)
    }

    /// `changeToken`, when known.
    pub fn change_token(self, token: Option<&str>) -> Self {
        match token {
            Some(token) => self.field("changeToken", token),
            None => self,
        }
    }

    /// Caller options as plain fields.
    pub fn options(mut self, options: &Options) -> Self {
        for (name, value) in options.iter() {
            self = self.field(name, value);
        }
        self
    }

    pub fn properties(mut self, properties: &Properties) -> Self {
        for (idx, (id, value)) in properties.iter().enumerate() {
            self = self.field(format!("propertyId[{}]", idx), id.clone());
            match value {
                PropertyValue::Null => {}
                PropertyValue::Multi(values) => {
                    for (pos, v) in values.iter().enumerate() {
                        if let Some(text) = value_text(v) {
                            self = self.field(format!("propertyValue[{}][{}]", idx, pos), text);
                        }
                    }
                }
                single => {
                    if let Some(text) = value_text(single) {
                        self = self.field(format!("propertyValue[{}]", idx), text);
                    }
                }
            }
        }
        self
    }

    /// ACE changes turning `current` (as the server has it) into `desired`.
    ///
    /// Every direct entry of `desired` is added. Permissions directly
    /// granted in `current` that `desired` no longer grants are removed.
    pub fn acl_changes(mut self, desired: &Acl, current: &Acl) -> Self {
        for (idx, ace) in desired.direct_entries().enumerate() {
            self = self.field(format!("addACEPrincipal[{}]", idx), ace.principal_id.clone());
            for (pos, permission) in ace.permissions.iter().enumerate() {
                self = self.field(format!("addACEPermission[{}][{}]", idx, pos), permission.clone());
            }
        }

        let mut idx = 0;
        for ace in current.direct_entries() {
            let kept = desired
                .get(&ace.principal_id)
                .filter(|local| local.direct)
                .map(|local| local.permissions.as_slice())
                .unwrap_or_default();
            let dropped: Vec<&String> = ace
                .permissions
                .iter()
                .filter(|p| !kept.contains(p))
                .collect();
            if dropped.is_empty() {
                continue;
            }
            self = self.field(format!("removeACEPrincipal[{}]", idx), ace.principal_id.clone());
            for (pos, permission) in dropped.into_iter().enumerate() {
                self = self.field(format!("removeACEPermission[{}][{}]", idx, pos), permission.clone());
            }
            idx += 1;
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `application/x-www-form-urlencoded` body.
    pub fn encode(&self) -> Vec<u8> {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter())
            .finish()
            .into_bytes()
    }

    /// `multipart/form-data` body carrying `file` as the content part.
    ///
    /// Returns `(content_type, body)`.
    pub fn encode_multipart(&self, file: Option<FilePart<'_>>) -> (String, Vec<u8>) {
        multipart::encode(&self.fields, file)
    }
}

fn value_text(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::DateTime(dt) => Some(dt.and_utc().timestamp_millis().to_string()),
        other => other.to_wire_strings().into_iter().next(),
    }
}
