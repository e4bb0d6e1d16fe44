//! binding
//!
//! Wire-protocol bindings.
//!
//! A [`Binding`] turns domain requests into HTTP exchanges for one CMIS
//! wire format and decodes the responses into neutral data:
//! [`ObjectData`] for objects, [`RepositoryData`] for repositories and
//! [`Page`] for paged listings. The repository and object model depend only
//! on this trait, never on XML or JSON.
//!
//! Two implementations exist:
//!
//! - [`atompub::AtomPubBinding`] - Atom/CMISRA XML, hypermedia driven
//! - [`browser::BrowserBinding`] - JSON reads, form-post writes
//!
//! Each keeps the raw wire payload of the objects it returns inside
//! [`ObjectData`] so that follow-up calls can read links or URLs from it.

pub mod atompub;
pub mod browser;
pub mod factory;
pub(crate) mod rest;

use std::collections::BTreeMap;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    Acl, AllowableActions, BaseType, ChangeEntry, CmisId, ContentStream, Options, Properties,
    Rendition, TypeDefinition,
};
use crate::repository::{AclCapability, Capabilities, RepositoryInfo, UriTemplate};

pub use atompub::AtomPubBinding;
pub use browser::BrowserBinding;
pub use factory::{create_binding, BindingKind};

/// Decoded state of one object as returned by the server.
#[derive(Debug, Clone)]
pub struct ObjectData {
    pub properties: Properties,
    /// Atom title; the Browser binding has none.
    pub title: Option<String>,
    /// Present when the response carried an `allowableActions` block.
    pub allowable_actions: Option<AllowableActions>,
    pub acl: Option<Acl>,
    /// Filled by parent listings that were asked for path segments.
    pub relative_path_segment: Option<String>,
    pub(crate) raw: RawEntry,
}

impl ObjectData {
    pub(crate) fn new(properties: Properties, raw: RawEntry) -> Self {
        Self {
            properties,
            title: None,
            allowable_actions: None,
            acl: None,
            relative_path_segment: None,
            raw,
        }
    }

    pub fn object_id(&self) -> Option<CmisId> {
        self.properties.get_id("cmis:objectId")
    }

    /// The `cmis:baseTypeId` discriminant, when the server sent it.
    pub fn base_type(&self) -> Option<BaseType> {
        self.properties
            .get_str("cmis:baseTypeId")
            .and_then(BaseType::parse)
    }

    pub fn change_token(&self) -> Option<&str> {
        self.properties.get_str("cmis:changeToken")
    }
}

/// Wire payload retained alongside decoded object data.
#[derive(Debug, Clone)]
pub(crate) enum RawEntry {
    Atom(atompub::xml::XmlElement),
    Json(serde_json::Value),
}

/// Everything a binding learns about a repository from the service document.
#[derive(Debug, Clone)]
pub struct RepositoryData {
    pub info: RepositoryInfo,
    pub capabilities: Capabilities,
    pub acl_capability: Option<AclCapability>,
    pub uri_templates: BTreeMap<String, UriTemplate>,
    pub(crate) raw: RawRepository,
}

impl RepositoryData {
    pub fn id(&self) -> &str {
        self.info.id()
    }
}

#[derive(Debug, Clone)]
pub(crate) enum RawRepository {
    Atom(atompub::parse::AtomWorkspace),
    Json {
        repository_url: String,
        root_folder_url: String,
    },
}

/// Named repository-level collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Root,
    CheckedOut,
    Unfiled,
}

impl CollectionKind {
    /// AtomPub `cmisra:collectionType` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Root => "root",
            CollectionKind::CheckedOut => "checkedout",
            CollectionKind::Unfiled => "unfiled",
        }
    }
}

/// Page navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    First,
    Prev,
    Next,
    Last,
    /// Re-fetch the current page.
    Current,
}

impl PageLink {
    /// Atom link relation for this target.
    pub fn rel(&self) -> &'static str {
        match self {
            PageLink::First => "first",
            PageLink::Prev => "prev",
            PageLink::Next => "next",
            PageLink::Last => "last",
            PageLink::Current => "self",
        }
    }
}

/// Paging cursor of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageNav {
    pub has_more_items: Option<bool>,
    pub num_items: Option<u64>,
    /// Link relation to href; empty for bindings without paging links.
    pub(crate) links: BTreeMap<String, String>,
    /// Set when the binding pages by links; `has_more_items` is then
    /// informational only.
    pub(crate) linked: bool,
}

impl PageNav {
    pub fn link(&self, link: PageLink) -> Option<&str> {
        self.links.get(link.rel()).map(String::as_str)
    }

    /// Whether the page advertises `link`.
    ///
    /// On link-paged feeds only the links count. Elsewhere
    /// `has_more_items` decides `Next`.
    pub fn has(&self, link: PageLink) -> bool {
        if self.link(link).is_some() {
            return true;
        }
        !self.linked && link == PageLink::Next && self.has_more_items == Some(true)
    }
}

/// One page of results plus its cursor.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub nav: PageNav,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, nav: PageNav) -> Self {
        Self { items, nav }
    }
}

/// A CMIS wire protocol.
///
/// Every method maps HTTP failures through [`crate::error::CmisError::from_status`];
/// callers never see raw transport status codes. A method whose underlying
/// link or URL is missing from the server's responses fails with
/// `NotSupported`.
#[async_trait]
pub trait Binding: Send + Sync + Debug {
    fn kind(&self) -> BindingKind;

    /// Fetch the service document and decode every repository it lists.
    async fn get_repositories(&self) -> Result<Vec<RepositoryData>>;

    // Repository services.

    async fn get_object(
        &self,
        repo: &RepositoryData,
        object_id: &str,
        options: &Options,
    ) -> Result<ObjectData>;

    async fn get_object_by_path(
        &self,
        repo: &RepositoryData,
        path: &str,
        options: &Options,
    ) -> Result<ObjectData>;

    async fn get_type_definition(&self, repo: &RepositoryData, type_id: &str)
        -> Result<TypeDefinition>;

    /// Child types of `type_id`, or the base types when `None`.
    async fn get_type_children(
        &self,
        repo: &RepositoryData,
        type_id: Option<&str>,
        options: &Options,
    ) -> Result<Vec<TypeDefinition>>;

    /// Descendant types flattened in document order.
    async fn get_type_descendants(
        &self,
        repo: &RepositoryData,
        type_id: Option<&str>,
        options: &Options,
    ) -> Result<Vec<TypeDefinition>>;

    async fn query(
        &self,
        repo: &RepositoryData,
        statement: &str,
        options: &Options,
    ) -> Result<Page<ObjectData>>;

    async fn get_content_changes(
        &self,
        repo: &RepositoryData,
        options: &Options,
    ) -> Result<Page<ChangeEntry>>;

    async fn get_collection(
        &self,
        repo: &RepositoryData,
        kind: CollectionKind,
        options: &Options,
    ) -> Result<Page<ObjectData>>;

    async fn create_folder(
        &self,
        repo: &RepositoryData,
        parent: &ObjectData,
        properties: &Properties,
    ) -> Result<ObjectData>;

    /// Create a document, unfiled when `parent` is `None`.
    async fn create_document(
        &self,
        repo: &RepositoryData,
        parent: Option<&ObjectData>,
        properties: &Properties,
        content: Option<&ContentStream>,
        options: &Options,
    ) -> Result<ObjectData>;

    /// `properties` carries `cmis:sourceId`, `cmis:targetId` and `cmis:objectTypeId`.
    async fn create_relationship(
        &self,
        repo: &RepositoryData,
        source: &ObjectData,
        properties: &Properties,
    ) -> Result<ObjectData>;

    // Object services.

    async fn get_object_parents(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<Vec<ObjectData>>;

    /// Parent of a folder; `None` for the root folder.
    async fn get_folder_parent(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
    ) -> Result<Option<ObjectData>>;

    async fn update_properties(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        properties: &Properties,
        change_token: Option<&str>,
    ) -> Result<ObjectData>;

    async fn move_object(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        source_folder_id: &str,
        target_folder: &ObjectData,
    ) -> Result<()>;

    async fn delete_object(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<()>;

    async fn get_relationships(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>>;

    async fn get_acl(&self, repo: &RepositoryData, object: &ObjectData) -> Result<Acl>;

    /// Replace the object's direct ACEs; returns the resulting ACL.
    async fn apply_acl(&self, repo: &RepositoryData, object: &ObjectData, acl: &Acl)
        -> Result<Acl>;

    // Versioning and content.

    /// Check a document out, returning the private working copy.
    async fn checkout(&self, repo: &RepositoryData, document: &ObjectData) -> Result<ObjectData>;

    async fn cancel_checkout(&self, repo: &RepositoryData, pwc: &ObjectData) -> Result<()>;

    /// Check a private working copy in, returning the new version.
    async fn checkin(
        &self,
        repo: &RepositoryData,
        pwc: &ObjectData,
        major: bool,
        comment: Option<&str>,
        options: &Options,
    ) -> Result<ObjectData>;

    async fn get_all_versions(
        &self,
        repo: &RepositoryData,
        document: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>>;

    async fn get_content_stream(
        &self,
        repo: &RepositoryData,
        document: &ObjectData,
    ) -> Result<ContentStream>;

    /// Returns the updated document when the server sends one back.
    async fn set_content_stream(
        &self,
        repo: &RepositoryData,
        document: &ObjectData,
        content: &ContentStream,
        change_token: Option<&str>,
    ) -> Result<Option<ObjectData>>;

    async fn delete_content_stream(
        &self,
        repo: &RepositoryData,
        document: &ObjectData,
        change_token: Option<&str>,
    ) -> Result<()>;

    async fn get_renditions(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<Vec<Rendition>>;

    // Navigation services.

    async fn get_children(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>>;

    /// All descendants flattened parents-first.
    async fn get_descendants(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>>;

    /// Descendant folders flattened parents-first.
    async fn get_folder_tree(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>>;

    async fn delete_tree(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
        options: &Options,
    ) -> Result<()>;

    async fn add_object(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<()>;

    async fn remove_object(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
        object: &ObjectData,
    ) -> Result<()>;

    // Paging.

    async fn navigate(
        &self,
        repo: &RepositoryData,
        nav: &PageNav,
        link: PageLink,
    ) -> Result<Page<ObjectData>>;

    async fn navigate_changes(
        &self,
        repo: &RepositoryData,
        nav: &PageNav,
        link: PageLink,
    ) -> Result<Page<ChangeEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_nav_has() {
        let mut nav = PageNav::default();
        assert!(!nav.has(PageLink::Next));

        nav.has_more_items = Some(true);
        assert!(nav.has(PageLink::Next));
        assert!(!nav.has(PageLink::Prev));

        nav.links.insert("prev".into(), "http://h/p".into());
        assert!(nav.has(PageLink::Prev));
        assert_eq!(nav.link(PageLink::Prev), Some("http://h/p"));
    }

    #[test]
    fn linked_pages_need_a_next_link() {
        let mut nav = PageNav {
            has_more_items: Some(true),
            linked: true,
            ..PageNav::default()
        };
        assert!(!nav.has(PageLink::Next));

        nav.links.insert("next".into(), "http://h/n".into());
        assert!(nav.has(PageLink::Next));
    }

    #[test]
    fn object_data_accessors() {
        let props = Properties::new()
            .with("cmis:objectId", CmisId::new("42"))
            .with("cmis:baseTypeId", CmisId::new("cmis:folder"))
            .with("cmis:changeToken", "t1");
        let data = ObjectData::new(props, RawEntry::Json(serde_json::Value::Null));
        assert_eq!(data.object_id(), Some(CmisId::new("42")));
        assert_eq!(data.base_type(), Some(BaseType::Folder));
        assert_eq!(data.change_token(), Some("t1"));
    }
}
