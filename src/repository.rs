//! repository
//!
//! A CMIS repository and the metadata it advertises.
//!
//! # Caching
//!
//! Everything a repository knows about itself (info, capabilities, ACL
//! capability, URI templates) comes from one service-document fetch and is
//! kept behind an `Arc` until [`Repository::reload`] swaps in a fresh copy.
//! Readers clone the `Arc` and never observe a half-updated state.
//!
//! # Capability gating
//!
//! Operations that depend on an optional repository feature check the
//! relevant [`Capability`] first and fail with `NotSupported` without
//! touching the network.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::binding::{Binding, CollectionKind, RepositoryData};
use crate::error::{CmisError, Result};
use crate::model::{
    CmisId, CmisObject, ContentStream, Document, Folder, ObjectType, Options, Properties,
    Relationship, SpecializedObject,
};
use crate::result_set::{ChangeResultSet, ObjectResultSet};

/// Descriptive repository fields (`repositoryId`, `vendorName`, ...).
///
/// Fields the server sent empty are kept with no value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryInfo(BTreeMap<String, Option<String>>);

impl RepositoryInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_deref())
    }

    pub fn id(&self) -> &str {
        self.get("repositoryId").unwrap_or_default()
    }

    pub fn name(&self) -> Option<&str> {
        self.get("repositoryName")
    }

    pub fn description(&self) -> Option<&str> {
        self.get("repositoryDescription")
    }

    pub fn root_folder_id(&self) -> Option<&str> {
        self.get("rootFolderId")
    }

    pub fn vendor_name(&self) -> Option<&str> {
        self.get("vendorName")
    }

    pub fn product_name(&self) -> Option<&str> {
        self.get("productName")
    }

    pub fn product_version(&self) -> Option<&str> {
        self.get("productVersion")
    }

    pub fn cmis_version_supported(&self) -> Option<&str> {
        self.get("cmisVersionSupported")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

/// Named repository capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Acl,
    AllVersionsSearchable,
    Changes,
    ContentStreamUpdatability,
    GetDescendants,
    GetFolderTree,
    Multifiling,
    PwcSearchable,
    PwcUpdatable,
    Query,
    Renditions,
    Unfiling,
    VersionSpecificFiling,
    Join,
}

impl Capability {
    /// Key in the capability map, without the `capability` prefix.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Acl => "ACL",
            Capability::AllVersionsSearchable => "AllVersionsSearchable",
            Capability::Changes => "Changes",
            Capability::ContentStreamUpdatability => "ContentStreamUpdatability",
            Capability::GetDescendants => "GetDescendants",
            Capability::GetFolderTree => "GetFolderTree",
            Capability::Multifiling => "Multifiling",
            Capability::PwcSearchable => "PWCSearchable",
            Capability::PwcUpdatable => "PWCUpdatable",
            Capability::Query => "Query",
            Capability::Renditions => "Renditions",
            Capability::Unfiling => "Unfiling",
            Capability::VersionSpecificFiling => "VersionSpecificFiling",
            Capability::Join => "Join",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A capability value: a flag or an enumerated level such as `manage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityValue {
    Bool(bool),
    Text(String),
}

impl CapabilityValue {
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "true" => CapabilityValue::Bool(true),
            "false" => CapabilityValue::Bool(false),
            other => CapabilityValue::Text(other.to_string()),
        }
    }

    /// `true`, or any level other than `none`.
    pub fn is_truthy(&self) -> bool {
        match self {
            CapabilityValue::Bool(b) => *b,
            CapabilityValue::Text(t) => !t.is_empty() && t != "none",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CapabilityValue::Text(t) => Some(t),
            CapabilityValue::Bool(_) => None,
        }
    }
}

impl std::fmt::Display for CapabilityValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityValue::Bool(b) => write!(f, "{}", b),
            CapabilityValue::Text(t) => f.write_str(t),
        }
    }
}

/// Level of ACL support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclSupport {
    None,
    Discover,
    Manage,
}

/// The capability map of a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(BTreeMap<String, CapabilityValue>);

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert under `key`, dropping a leading `capability` prefix.
    pub fn insert(&mut self, key: &str, value: CapabilityValue) {
        let key = key.strip_prefix("capability").unwrap_or(key);
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&CapabilityValue> {
        self.0.get(key)
    }

    pub fn value(&self, capability: Capability) -> Option<&CapabilityValue> {
        self.get(capability.name())
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.value(capability).is_some_and(CapabilityValue::is_truthy)
    }

    /// Capabilities from `required` that are absent or falsy.
    pub fn missing(&self, required: &[Capability]) -> Vec<Capability> {
        required.iter().copied().filter(|c| !self.has(*c)).collect()
    }

    pub fn acl(&self) -> AclSupport {
        match self.value(Capability::Acl).and_then(CapabilityValue::as_text) {
            Some("manage") => AclSupport::Manage,
            Some("discover") => AclSupport::Discover,
            _ => AclSupport::None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CapabilityValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// ACL capability details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclCapability {
    /// `basic`, `repository` or `both`.
    pub supported_permissions: Option<String>,
    /// `objectonly`, `propagate` or `repositorydetermined`.
    pub propagation: Option<String>,
    /// Permission name to description.
    pub permissions: BTreeMap<String, String>,
    /// Permission key (`canDelete.Object`) to the permissions it requires.
    pub mapping: BTreeMap<String, Vec<String>>,
}

/// A server-advertised URL pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    pub template: String,
    pub template_type: String,
    pub media_type: Option<String>,
}

/// A repository reachable through a binding.
///
/// Cheap to clone; clones share the binding and the metadata cache.
#[derive(Clone)]
pub struct Repository {
    inner: Arc<RepositoryInner>,
}

struct RepositoryInner {
    binding: Arc<dyn Binding>,
    id: String,
    cache: RwLock<Option<Arc<RepositoryData>>>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("id", &self.inner.id)
            .field("binding", &self.inner.binding.kind())
            .finish()
    }
}

impl Repository {
    /// Wrap metadata already fetched during discovery.
    pub(crate) fn new(binding: Arc<dyn Binding>, data: RepositoryData) -> Self {
        let id = data.id().to_string();
        Self {
            inner: Arc::new(RepositoryInner {
                binding,
                id,
                cache: RwLock::new(Some(Arc::new(data))),
            }),
        }
    }

    /// A handle that loads its metadata on first use.
    pub(crate) fn lazy(binding: Arc<dyn Binding>, id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RepositoryInner {
                binding,
                id: id.into(),
                cache: RwLock::new(None),
            }),
        }
    }

    pub(crate) fn binding(&self) -> &dyn Binding {
        self.inner.binding.as_ref()
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Cached metadata, fetching it on first use.
    pub async fn data(&self) -> Result<Arc<RepositoryData>> {
        if let Ok(cache) = self.inner.cache.read() {
            if let Some(data) = cache.as_ref() {
                return Ok(Arc::clone(data));
            }
        }
        self.fetch().await
    }

    /// Drop cached metadata and fetch it again.
    pub async fn reload(&self) -> Result<()> {
        self.fetch().await.map(|_| ())
    }

    async fn fetch(&self) -> Result<Arc<RepositoryData>> {
        debug!(repository = %self.inner.id, "loading repository metadata");
        let data = self
            .binding()
            .get_repositories()
            .await?
            .into_iter()
            .find(|r| r.id() == self.inner.id)
            .ok_or_else(|| {
                CmisError::ObjectNotFound(format!(
                    "repository '{}' is not advertised by the service",
                    self.inner.id
                ))
            })?;
        let data = Arc::new(data);
        if let Ok(mut cache) = self.inner.cache.write() {
            *cache = Some(Arc::clone(&data));
        }
        Ok(data)
    }

    /// Metadata, failing with `NotSupported` unless `capability` is set.
    pub(crate) async fn require(&self, capability: Capability, operation: &str) -> Result<Arc<RepositoryData>> {
        let data = self.data().await?;
        if !data.capabilities.has(capability) {
            info!(repository = %self.inner.id, %capability, operation, "capability missing");
            return Err(CmisError::not_supported(format!(
                "{} requires the {} capability",
                operation, capability
            )));
        }
        Ok(data)
    }

    // Metadata.

    pub async fn name(&self) -> Result<Option<String>> {
        Ok(self.data().await?.info.name().map(str::to_string))
    }

    pub async fn get_repository_info(&self) -> Result<RepositoryInfo> {
        Ok(self.data().await?.info.clone())
    }

    pub async fn get_capabilities(&self) -> Result<Capabilities> {
        Ok(self.data().await?.capabilities.clone())
    }

    pub async fn get_uri_templates(&self) -> Result<BTreeMap<String, UriTemplate>> {
        Ok(self.data().await?.uri_templates.clone())
    }

    async fn acl_capability(&self, operation: &str) -> Result<AclCapability> {
        let data = self.require(Capability::Acl, operation).await?;
        data.acl_capability.clone().ok_or_else(|| {
            CmisError::protocol("repository advertises ACL support but no aclCapability")
        })
    }

    /// `basic`, `repository` or `both`.
    pub async fn get_supported_permissions(&self) -> Result<String> {
        let acl = self.acl_capability("getSupportedPermissions").await?;
        acl.supported_permissions
            .ok_or_else(|| CmisError::protocol("aclCapability has no supportedPermissions"))
    }

    pub async fn get_propagation(&self) -> Result<String> {
        let acl = self.acl_capability("getPropagation").await?;
        acl.propagation
            .ok_or_else(|| CmisError::protocol("aclCapability has no propagation"))
    }

    pub async fn get_permission_definitions(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.acl_capability("getPermissionDefinitions").await?.permissions)
    }

    pub async fn get_permission_map(&self) -> Result<BTreeMap<String, Vec<String>>> {
        Ok(self.acl_capability("getPermissionMap").await?.mapping)
    }

    // Objects.

    pub async fn get_object(&self, object_id: &str, options: &Options) -> Result<SpecializedObject> {
        let data = self.data().await?;
        let object = self.binding().get_object(&data, object_id, options).await?;
        Ok(SpecializedObject::from_data(self.clone(), object, options.clone()))
    }

    pub async fn get_object_by_path(&self, path: &str, options: &Options) -> Result<SpecializedObject> {
        let data = self.data().await?;
        let object = self.binding().get_object_by_path(&data, path, options).await?;
        Ok(SpecializedObject::from_data(self.clone(), object, options.clone()))
    }

    pub async fn get_folder(&self, folder_id: &str) -> Result<Folder> {
        self.get_object(folder_id, &Options::new()).await?.into_folder()
    }

    pub async fn get_root_folder(&self) -> Result<Folder> {
        let data = self.data().await?;
        let root_id = data
            .info
            .root_folder_id()
            .ok_or_else(|| CmisError::protocol("repository info has no rootFolderId"))?
            .to_string();
        self.get_folder(&root_id).await
    }

    // Types.

    pub async fn get_type_definition(&self, type_id: &str) -> Result<ObjectType> {
        let data = self.data().await?;
        let definition = self.binding().get_type_definition(&data, type_id).await?;
        Ok(ObjectType::new(self.clone(), definition))
    }

    /// The base types.
    pub async fn get_type_definitions(&self) -> Result<Vec<ObjectType>> {
        self.get_type_children(None).await
    }

    pub async fn get_type_children(&self, type_id: Option<&str>) -> Result<Vec<ObjectType>> {
        let data = self.data().await?;
        let types = self
            .binding()
            .get_type_children(&data, type_id, &Options::new())
            .await?;
        Ok(self.wrap_types(types))
    }

    /// Descendant types; `depth` of `-1` means all levels.
    pub async fn get_type_descendants(
        &self,
        type_id: Option<&str>,
        depth: Option<i32>,
    ) -> Result<Vec<ObjectType>> {
        let data = self.data().await?;
        let options = match depth {
            Some(d) => Options::new().depth(d),
            None => Options::new(),
        };
        let types = self
            .binding()
            .get_type_descendants(&data, type_id, &options)
            .await?;
        Ok(self.wrap_types(types))
    }

    fn wrap_types(&self, types: Vec<crate::model::TypeDefinition>) -> Vec<ObjectType> {
        types
            .into_iter()
            .map(|t| ObjectType::new(self.clone(), t))
            .collect()
    }

    // Discovery.

    /// Run a CMIS SQL statement; the statement is sent verbatim.
    pub async fn query(&self, statement: &str, options: &Options) -> Result<ObjectResultSet> {
        let data = self.data().await?;
        let page = self.binding().query(&data, statement, options).await?;
        Ok(ObjectResultSet::new(self.clone(), page))
    }

    pub async fn get_content_changes(&self, options: &Options) -> Result<ChangeResultSet> {
        let data = self.require(Capability::Changes, "getContentChanges").await?;
        let page = self.binding().get_content_changes(&data, options).await?;
        Ok(ChangeResultSet::new(self.clone(), page))
    }

    pub async fn get_collection(&self, kind: CollectionKind, options: &Options) -> Result<ObjectResultSet> {
        let data = self.data().await?;
        let page = self.binding().get_collection(&data, kind, options).await?;
        Ok(ObjectResultSet::new(self.clone(), page))
    }

    pub async fn get_checked_out_docs(&self, options: &Options) -> Result<ObjectResultSet> {
        self.get_collection(CollectionKind::CheckedOut, options).await
    }

    pub async fn get_unfiled_docs(&self, options: &Options) -> Result<ObjectResultSet> {
        self.get_collection(CollectionKind::Unfiled, options).await
    }

    // Creation.

    /// Create a folder named `name` under `parent`.
    pub async fn create_folder(&self, parent: &Folder, name: &str, properties: Properties) -> Result<Folder> {
        let data = self.data().await?;
        let properties = with_defaults(properties, name, "cmis:folder");
        let created = self
            .binding()
            .create_folder(&data, parent.data(), &properties)
            .await?;
        SpecializedObject::from_data(self.clone(), created, Options::new()).into_folder()
    }

    /// Create a document, filed in `parent` or unfiled when `None`.
    ///
    /// # Errors
    ///
    /// `CmisError::InvalidArgument` when no parent is given and the
    /// repository does not support unfiling.
    pub async fn create_document(
        &self,
        name: &str,
        properties: Properties,
        parent: Option<&Folder>,
        content: Option<ContentStream>,
    ) -> Result<Document> {
        let data = self.data().await?;
        if parent.is_none() && !data.capabilities.has(Capability::Unfiling) {
            return Err(CmisError::InvalidArgument(
                "a parent folder is required: repository does not support unfiling".into(),
            ));
        }
        let properties = with_defaults(properties, name, "cmis:document");
        let created = self
            .binding()
            .create_document(
                &data,
                parent.map(|f| f.data()),
                &properties,
                content.as_ref(),
                &Options::new(),
            )
            .await?;
        SpecializedObject::from_data(self.clone(), created, Options::new()).into_document()
    }

    pub async fn create_document_from_string(
        &self,
        name: &str,
        properties: Properties,
        parent: Option<&Folder>,
        content: &str,
        mime_type: Option<&str>,
    ) -> Result<Document> {
        let stream = ContentStream::new(
            mime_type.unwrap_or("text/plain"),
            content.as_bytes().to_vec(),
        );
        self.create_document(name, properties, parent, Some(stream)).await
    }

    pub async fn create_relationship(
        &self,
        source: &CmisObject,
        target: &CmisObject,
        relationship_type: &str,
    ) -> Result<Relationship> {
        let data = self.data().await?;
        let properties = Properties::new()
            .with("cmis:sourceId", source.require_id()?.clone())
            .with("cmis:targetId", target.require_id()?.clone())
            .with("cmis:objectTypeId", CmisId::new(relationship_type));
        let created = self
            .binding()
            .create_relationship(&data, source.data(), &properties)
            .await?;
        SpecializedObject::from_data(self.clone(), created, Options::new()).into_relationship()
    }
}

fn with_defaults(mut properties: Properties, name: &str, type_id: &str) -> Properties {
    if !properties.contains("cmis:name") {
        properties.insert("cmis:name", name);
    }
    if !properties.contains("cmis:objectTypeId") {
        properties.insert("cmis:objectTypeId", CmisId::new(type_id));
    }
    properties
}
