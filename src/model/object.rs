//! model::object
//!
//! The generic CMIS object and its specialization.
//!
//! # State
//!
//! A [`CmisObject`] owns one [`ObjectState`]: its resolved id, the decoded
//! server data and the options it was fetched with. Every reload replaces
//! the data wholesale, so properties and allowable actions are always
//! refreshed together. Mutating calls take `&mut self`; an object is never
//! shared between tasks while it changes.
//!
//! # Specialization
//!
//! [`SpecializedObject::from_data`] is the single place where server data
//! turns into a typed variant, keyed on `cmis:baseTypeId`. Data without
//! that property stays [`SpecializedObject::Unspecialized`] and still
//! supports every generic operation.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use tracing::debug;

use super::acl::Acl;
use super::document::Document;
use super::folder::Folder;
use super::options::Options;
use super::relationship::Relationship;
use super::types::{CmisId, Properties};
use crate::binding::ObjectData;
use crate::error::{CmisError, Result};
use crate::repository::{AclSupport, Repository};
use crate::result_set::ObjectResultSet;

/// Action name (`canCheckOut`, `canDeleteObject`, ...) to permission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowableActions(BTreeMap<String, bool>);

impl AllowableActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, action: impl Into<String>, allowed: bool) {
        self.0.insert(action.into(), allowed);
    }

    /// `false` for actions the server did not list.
    pub fn is_allowed(&self, action: &str) -> bool {
        self.0.get(action).copied().unwrap_or(false)
    }

    pub fn get(&self, action: &str) -> Option<bool> {
        self.0.get(action).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, bool)> for AllowableActions {
    fn from_iter<I: IntoIterator<Item = (String, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The four CMIS base types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Document,
    Folder,
    Relationship,
    Policy,
}

impl BaseType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "cmis:document" => Some(BaseType::Document),
            "cmis:folder" => Some(BaseType::Folder),
            "cmis:relationship" => Some(BaseType::Relationship),
            "cmis:policy" => Some(BaseType::Policy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseType::Document => "cmis:document",
            BaseType::Folder => "cmis:folder",
            BaseType::Relationship => "cmis:relationship",
            BaseType::Policy => "cmis:policy",
        }
    }
}

impl std::fmt::Display for BaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loaded state of one object.
#[derive(Debug, Clone)]
pub(crate) struct ObjectState {
    pub object_id: Option<CmisId>,
    pub data: ObjectData,
    /// Options re-sent on every reload.
    pub options: Options,
}

/// A repository object of any base type.
#[derive(Debug, Clone)]
pub struct CmisObject {
    repository: Repository,
    state: ObjectState,
}

impl CmisObject {
    pub(crate) fn from_data(repository: Repository, data: ObjectData, options: Options) -> Self {
        Self {
            repository,
            state: ObjectState {
                object_id: data.object_id(),
                data,
                options,
            },
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// `None` when the server did not send `cmis:objectId` (e.g. a query
    /// that did not select it).
    pub fn object_id(&self) -> Option<&CmisId> {
        self.state.object_id.as_ref()
    }

    pub(crate) fn require_id(&self) -> Result<&CmisId> {
        self.state
            .object_id
            .as_ref()
            .ok_or_else(|| CmisError::InvalidArgument("object has no cmis:objectId".into()))
    }

    pub(crate) fn data(&self) -> &ObjectData {
        &self.state.data
    }

    pub(crate) fn replace_data(&mut self, data: ObjectData) {
        if let Some(id) = data.object_id() {
            self.state.object_id = Some(id);
        }
        self.state.data = data;
    }

    pub fn properties(&self) -> &Properties {
        &self.state.data.properties
    }

    pub fn name(&self) -> Option<&str> {
        self.properties().get_str("cmis:name")
    }

    /// The Atom title, falling back to `cmis:name`.
    pub fn title(&self) -> Option<&str> {
        self.state.data.title.as_deref().or_else(|| self.name())
    }

    pub fn base_type(&self) -> Option<BaseType> {
        self.state.data.base_type()
    }

    pub fn object_type_id(&self) -> Option<&str> {
        self.properties().get_str("cmis:objectTypeId")
    }

    /// Allowable actions, fetched on first use.
    pub async fn allowable_actions(&mut self) -> Result<&AllowableActions> {
        if self.state.data.allowable_actions.is_none() {
            self.reload_with(&Options::new().include_allowable_actions(true))
                .await?;
        }
        self.state
            .data
            .allowable_actions
            .as_ref()
            .ok_or_else(|| CmisError::protocol("server returned no allowableActions"))
    }

    /// Re-fetch the object with the options it was loaded with.
    pub async fn reload(&mut self) -> Result<()> {
        self.reload_with(&Options::new()).await
    }

    /// Re-fetch with extra options, which are kept for later reloads.
    ///
    /// `returnVersion` is used once: the object then takes the id of the
    /// version that came back.
    pub async fn reload_with(&mut self, options: &Options) -> Result<()> {
        let id = self.require_id()?.clone();
        let mut merged = self.state.options.merged(options);
        debug!(object_id = %id, "reloading object");

        let repo = self.repository.data().await?;
        let fresh = self
            .repository
            .binding()
            .get_object(&repo, id.as_str(), &merged)
            .await?;

        if merged.remove("returnVersion").is_some() {
            self.state.object_id = fresh.object_id();
        }
        self.state.data = fresh;
        self.state.options = merged;
        Ok(())
    }

    /// Send a partial property update.
    ///
    /// The cached change token goes along; a stale one fails with
    /// `UpdateConflict`.
    pub async fn update_properties(&mut self, properties: &Properties) -> Result<()> {
        let repo = self.repository.data().await?;
        let updated = self
            .repository
            .binding()
            .update_properties(
                &repo,
                &self.state.data,
                properties,
                self.state.data.change_token(),
            )
            .await?;
        self.replace_data(updated);
        Ok(())
    }

    /// Move from `source` into `target`.
    pub async fn move_to(&mut self, source: &Folder, target: &Folder) -> Result<()> {
        let source_id = source.require_id()?.clone();
        let repo = self.repository.data().await?;
        self.repository
            .binding()
            .move_object(&repo, &self.state.data, source_id.as_str(), target.data())
            .await?;
        self.reload().await
    }

    /// Delete the object; `allVersions` is honoured for documents.
    pub async fn delete(self, options: &Options) -> Result<()> {
        let repo = self.repository.data().await?;
        self.repository
            .binding()
            .delete_object(&repo, &self.state.data, options)
            .await
    }

    pub async fn get_object_parents(&self, options: &Options) -> Result<Vec<Folder>> {
        let repo = self.repository.data().await?;
        let parents = self
            .repository
            .binding()
            .get_object_parents(&repo, &self.state.data, options)
            .await?;
        parents
            .into_iter()
            .map(|p| SpecializedObject::from_data(self.repository.clone(), p, Options::new()).into_folder())
            .collect()
    }

    /// Every path under which the object is filed.
    pub async fn get_paths(&self) -> Result<Vec<String>> {
        let options = Options::new()
            .filter("cmis:path")
            .with("includeRelativePathSegment", true);
        let repo = self.repository.data().await?;
        let parents = self
            .repository
            .binding()
            .get_object_parents(&repo, &self.state.data, &options)
            .await?;
        Ok(parents
            .iter()
            .filter_map(|p| {
                let path = p.properties.get_str("cmis:path")?;
                let segment = p.relative_path_segment.as_deref()?;
                Some(join_path(path, segment))
            })
            .collect())
    }

    /// Relate this object to `target`.
    pub async fn create_relationship(&self, target: &CmisObject, relationship_type: &str) -> Result<Relationship> {
        self.repository
            .create_relationship(self, target, relationship_type)
            .await
    }

    pub async fn get_relationships(&self, options: &Options) -> Result<ObjectResultSet> {
        let repo = self.repository.data().await?;
        let page = self
            .repository
            .binding()
            .get_relationships(&repo, &self.state.data, options)
            .await?;
        Ok(ObjectResultSet::new(self.repository.clone(), page))
    }

    /// Requires ACL discovery or management.
    pub async fn get_acl(&self) -> Result<Acl> {
        let repo = self.repository.data().await?;
        match repo.capabilities.acl() {
            AclSupport::Discover | AclSupport::Manage => {
                self.repository
                    .binding()
                    .get_acl(&repo, &self.state.data)
                    .await
            }
            AclSupport::None => Err(CmisError::not_supported(
                "getACL requires the ACL capability",
            )),
        }
    }

    /// Replace the object's direct ACEs with those of `acl`.
    ///
    /// Requires ACL management; returns the ACL as the server now has it.
    pub async fn apply_acl(&mut self, acl: &Acl) -> Result<Acl> {
        let repo = self.repository.data().await?;
        if repo.capabilities.acl() != AclSupport::Manage {
            return Err(CmisError::not_supported(
                "applyACL requires the ACL capability to be 'manage'",
            ));
        }
        let applied = self
            .repository
            .binding()
            .apply_acl(&repo, &self.state.data, acl)
            .await?;
        self.state.data.acl = Some(applied.clone());
        Ok(applied)
    }

    pub async fn apply_policy(&mut self, _policy_id: &str) -> Result<()> {
        Err(CmisError::not_supported("applyPolicy"))
    }

    pub async fn remove_policy(&mut self, _policy_id: &str) -> Result<()> {
        Err(CmisError::not_supported("removePolicy"))
    }

    pub async fn get_applied_policies(&self) -> Result<Vec<Policy>> {
        Err(CmisError::not_supported("getAppliedPolicies"))
    }
}

impl std::fmt::Display for CmisObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.name(), self.object_id()) {
            (Some(name), Some(id)) => write!(f, "{} ({})", name, id),
            (None, Some(id)) => write!(f, "{}", id),
            (Some(name), None) => f.write_str(name),
            (None, None) => f.write_str("<unidentified object>"),
        }
    }
}

/// Join a parent path and a path segment.
pub(crate) fn join_path(parent: &str, segment: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, segment)
    } else {
        format!("{}/{}", parent, segment)
    }
}

/// A policy object.
#[derive(Debug, Clone)]
pub struct Policy(pub(crate) CmisObject);

impl Policy {
    pub fn into_object(self) -> CmisObject {
        self.0
    }
}

impl Deref for Policy {
    type Target = CmisObject;

    fn deref(&self) -> &CmisObject {
        &self.0
    }
}

impl DerefMut for Policy {
    fn deref_mut(&mut self) -> &mut CmisObject {
        &mut self.0
    }
}

/// An object resolved to its base type.
#[derive(Debug, Clone)]
pub enum SpecializedObject {
    Folder(Folder),
    Document(Document),
    Relationship(Relationship),
    Policy(Policy),
    /// No `cmis:baseTypeId` was available.
    Unspecialized(CmisObject),
}

impl SpecializedObject {
    pub(crate) fn from_data(repository: Repository, data: ObjectData, options: Options) -> Self {
        let object = CmisObject::from_data(repository, data, options);
        match object.base_type() {
            Some(BaseType::Folder) => SpecializedObject::Folder(Folder(object)),
            Some(BaseType::Document) => SpecializedObject::Document(Document(object)),
            Some(BaseType::Relationship) => SpecializedObject::Relationship(Relationship(object)),
            Some(BaseType::Policy) => SpecializedObject::Policy(Policy(object)),
            None => {
                debug!(object_id = ?object.object_id(), "no cmis:baseTypeId, object left unspecialized");
                SpecializedObject::Unspecialized(object)
            }
        }
    }

    pub fn object(&self) -> &CmisObject {
        match self {
            SpecializedObject::Folder(f) => &f.0,
            SpecializedObject::Document(d) => &d.0,
            SpecializedObject::Relationship(r) => &r.0,
            SpecializedObject::Policy(p) => &p.0,
            SpecializedObject::Unspecialized(o) => o,
        }
    }

    pub fn object_mut(&mut self) -> &mut CmisObject {
        match self {
            SpecializedObject::Folder(f) => &mut f.0,
            SpecializedObject::Document(d) => &mut d.0,
            SpecializedObject::Relationship(r) => &mut r.0,
            SpecializedObject::Policy(p) => &mut p.0,
            SpecializedObject::Unspecialized(o) => o,
        }
    }

    pub fn into_object(self) -> CmisObject {
        match self {
            SpecializedObject::Folder(f) => f.0,
            SpecializedObject::Document(d) => d.0,
            SpecializedObject::Relationship(r) => r.0,
            SpecializedObject::Policy(p) => p.0,
            SpecializedObject::Unspecialized(o) => o,
        }
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            SpecializedObject::Folder(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            SpecializedObject::Document(d) => Some(d),
            _ => None,
        }
    }

    /// The object as a folder; unspecialized objects are taken on trust.
    ///
    /// # Errors
    ///
    /// `CmisError::InvalidArgument` for any other base type.
    pub fn into_folder(self) -> Result<Folder> {
        match self {
            SpecializedObject::Folder(f) => Ok(f),
            SpecializedObject::Unspecialized(o) => Ok(Folder(o)),
            other => Err(mismatch(&other, BaseType::Folder)),
        }
    }

    pub fn into_document(self) -> Result<Document> {
        match self {
            SpecializedObject::Document(d) => Ok(d),
            SpecializedObject::Unspecialized(o) => Ok(Document(o)),
            other => Err(mismatch(&other, BaseType::Document)),
        }
    }

    pub fn into_relationship(self) -> Result<Relationship> {
        match self {
            SpecializedObject::Relationship(r) => Ok(r),
            SpecializedObject::Unspecialized(o) => Ok(Relationship(o)),
            other => Err(mismatch(&other, BaseType::Relationship)),
        }
    }
}

fn mismatch(object: &SpecializedObject, expected: BaseType) -> CmisError {
    let actual = object
        .base_type()
        .map(|b| b.as_str())
        .unwrap_or("an unknown type");
    CmisError::InvalidArgument(format!(
        "object {} is {}, expected {}",
        object.object_id().map(CmisId::as_str).unwrap_or("?"),
        actual,
        expected
    ))
}

impl Deref for SpecializedObject {
    type Target = CmisObject;

    fn deref(&self) -> &CmisObject {
        self.object()
    }
}

impl DerefMut for SpecializedObject {
    fn deref_mut(&mut self) -> &mut CmisObject {
        self.object_mut()
    }
}
