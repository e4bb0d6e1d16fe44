//! model::relationship

use std::ops::{Deref, DerefMut};

use super::object::{CmisObject, SpecializedObject};
use super::options::Options;
use super::types::CmisId;
use crate::error::{CmisError, Result};

/// A directed relationship between two objects.
#[derive(Debug, Clone)]
pub struct Relationship(pub(crate) CmisObject);

impl Relationship {
    pub fn into_object(self) -> CmisObject {
        self.0
    }

    pub fn source_id(&self) -> Option<CmisId> {
        self.properties().get_id("cmis:sourceId")
    }

    pub fn target_id(&self) -> Option<CmisId> {
        self.properties().get_id("cmis:targetId")
    }

    pub async fn source(&self) -> Result<SpecializedObject> {
        let id = self
            .source_id()
            .ok_or_else(|| CmisError::protocol("relationship has no cmis:sourceId"))?;
        self.repository().get_object(id.as_str(), &Options::new()).await
    }

    pub async fn target(&self) -> Result<SpecializedObject> {
        let id = self
            .target_id()
            .ok_or_else(|| CmisError::protocol("relationship has no cmis:targetId"))?;
        self.repository().get_object(id.as_str(), &Options::new()).await
    }
}

impl Deref for Relationship {
    type Target = CmisObject;

    fn deref(&self) -> &CmisObject {
        &self.0
    }
}

impl DerefMut for Relationship {
    fn deref_mut(&mut self) -> &mut CmisObject {
        &mut self.0
    }
}
