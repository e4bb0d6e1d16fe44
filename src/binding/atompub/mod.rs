//! binding::atompub
//!
//! The AtomPub binding.
//!
//! AtomPub is hypermedia driven: the service document lists collections,
//! link relations and URI templates, and every entry carries links to its
//! children, parents, ACL, versions and content. Operations follow those
//! links and fail with `NotSupported` when the server did not advertise
//! the one they need.
//!
//! # Modules
//!
//! - [`xml`] - Namespace-aware XML tree
//! - [`parse`] - Service documents, entries, feeds, types, ACLs
//! - [`write`] - Entry, query and ACL request documents
//! - [`template`] - URI template filling

pub(crate) mod parse;
pub(crate) mod template;
pub(crate) mod write;
pub(crate) mod xml;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use self::parse::AtomWorkspace;
use self::xml::XmlElement;
use super::rest::{non_empty_body, RestClient};
use super::{
    Binding, BindingKind, CollectionKind, ObjectData, Page, PageLink, PageNav, RawEntry,
    RawRepository, RepositoryData,
};
use crate::error::{CmisError, Result};
use crate::model::{
    Acl, ChangeEntry, ContentStream, Options, Properties, PropertyType, Rendition, TypeDefinition,
};
use crate::transport::{Credentials, HttpResponse, Transport};

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const APP_NS: &str = "http://www.w3.org/2007/app";
pub const CMISRA_NS: &str = "http://docs.oasis-open.org/ns/cmis/restatom/200908/";
pub const CMIS_NS: &str = "http://docs.oasis-open.org/ns/cmis/core/200908/";

pub const ATOM_XML_TYPE: &str = "application/atom+xml";
pub const ATOM_XML_ENTRY_TYPE: &str = "application/atom+xml;type=entry";
pub const ATOM_XML_FEED_TYPE: &str = "application/atom+xml;type=feed";
pub const CMIS_TREE_TYPE: &str = "application/cmistree+xml";
pub const CMIS_QUERY_TYPE: &str = "application/cmisquery+xml";
pub const CMIS_ACL_TYPE: &str = "application/cmisacl+xml";

pub const DOWN_REL: &str = "down";
pub const SELF_REL: &str = "self";
pub const UP_REL: &str = "up";
pub const VERSION_HISTORY_REL: &str = "version-history";
pub const RENDITION_REL: &str = "alternate";
pub const TYPE_DESCENDANTS_REL: &str =
    "http://docs.oasis-open.org/ns/cmis/link/200908/typedescendants";
pub const FOLDER_TREE_REL: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/foldertree";
pub const RELATIONSHIPS_REL: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/relationships";
pub const ACL_REL: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/acl";
pub const CHANGE_LOG_REL: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/changes";
pub const POLICIES_REL: &str = "http://docs.oasis-open.org/ns/cmis/link/200908/policies";

const QUERY_COLL: &str = "query";
const TYPES_COLL: &str = "types";

/// `application/atom+xml;type=feed` and its spelling variants.
fn is_feed_type(media_type: Option<&str>) -> bool {
    media_type.is_some_and(|t| {
        t.starts_with(ATOM_XML_TYPE)
            && t.find("type")
                .is_some_and(|i| t[i + "type".len()..].contains("feed"))
    })
}

fn is_tree_type(media_type: Option<&str>) -> bool {
    media_type.is_some_and(|t| t.starts_with(CMIS_TREE_TYPE))
}

/// AtomPub binding over a [`Transport`].
#[derive(Debug, Clone)]
pub struct AtomPubBinding {
    service_url: String,
    rest: RestClient,
}

impl AtomPubBinding {
    pub fn new(
        service_url: &str,
        transport: Arc<dyn Transport>,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            service_url: service_url.to_string(),
            rest: RestClient::new(transport, credentials),
        }
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    async fn get_xml(&self, url: &str, options: &Options) -> Result<XmlElement> {
        let response = self.rest.get(url, options).await?;
        XmlElement::parse(&response.body)
    }

    async fn get_entry(&self, url: &str, options: &Options) -> Result<ObjectData> {
        let root = self.get_xml(url, options).await?;
        parse::parse_entry(parse::single_entry(&root)?)
    }

    async fn get_feed(&self, url: &str, options: &Options) -> Result<Page<ObjectData>> {
        let root = self.get_xml(url, options).await?;
        parse::parse_feed(&root)
    }

    /// GET through a named URI template.
    async fn get_by_template(
        &self,
        repo: &RepositoryData,
        template_type: &str,
        values: &[(&str, &str)],
        options: &Options,
    ) -> Result<XmlElement> {
        let template = repo.uri_templates.get(template_type).ok_or_else(|| {
            CmisError::not_supported(format!(
                "repository '{}' has no '{}' URI template",
                repo.id(),
                template_type
            ))
        })?;
        let url = template::fill(&template.template, values, options);
        self.get_xml(&url, &Options::new()).await
    }

    async fn type_entry(&self, repo: &RepositoryData, type_id: &str) -> Result<XmlElement> {
        let root = self
            .get_by_template(repo, "typebyid", &[("id", type_id)], &Options::new())
            .await?;
        Ok(parse::single_entry(&root)?.clone())
    }

    /// Property types of `type_id`, for writing null values.
    ///
    /// Only fetched when `properties` carries a null.
    async fn null_types(
        &self,
        repo: &RepositoryData,
        properties: &Properties,
        fallback_type: Option<&str>,
    ) -> Result<BTreeMap<String, PropertyType>> {
        if !properties.iter().any(|(_, v)| v.property_type().is_none()) {
            return Ok(BTreeMap::new());
        }
        let Some(type_id) = properties
            .get_str("cmis:objectTypeId")
            .or(fallback_type)
        else {
            return Ok(BTreeMap::new());
        };
        debug!(type_id, "looking up property types for null values");
        let definition = self.get_type_definition(repo, type_id).await?;
        Ok(definition
            .property_definitions
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(id, def)| def.property_type.map(|t| (id, t)))
            .collect())
    }
}

fn workspace(repo: &RepositoryData) -> Result<&AtomWorkspace> {
    match &repo.raw {
        RawRepository::Atom(ws) => Ok(ws),
        RawRepository::Json { .. } => Err(CmisError::protocol(
            "repository was not loaded through the AtomPub binding",
        )),
    }
}

fn collection<'a>(repo: &'a RepositoryData, kind: &str) -> Result<&'a str> {
    workspace(repo)?.collection(kind).ok_or_else(|| {
        CmisError::not_supported(format!(
            "repository '{}' has no '{}' collection",
            repo.id(),
            kind
        ))
    })
}

fn entry(data: &ObjectData) -> Result<&XmlElement> {
    match &data.raw {
        RawEntry::Atom(entry) => Ok(entry),
        RawEntry::Json(_) => Err(CmisError::protocol(
            "object was not loaded through the AtomPub binding",
        )),
    }
}

fn required_link(
    data: &ObjectData,
    rel: &str,
    accept: impl Fn(Option<&str>) -> bool,
) -> Result<String> {
    parse::find_link(entry(data)?, rel, accept).ok_or_else(|| {
        CmisError::not_supported(format!(
            "object {} has no '{}' link",
            data.object_id().map(|id| id.into_inner()).unwrap_or_default(),
            rel
        ))
    })
}

fn any_type(_: Option<&str>) -> bool {
    true
}

fn self_link(data: &ObjectData) -> Result<String> {
    required_link(data, SELF_REL, any_type)
}

fn children_link(folder: &ObjectData) -> Result<String> {
    required_link(folder, DOWN_REL, is_feed_type)
}

fn descendants_link(folder: &ObjectData) -> Result<String> {
    required_link(folder, DOWN_REL, is_tree_type)
        .map(|url| template::strip_query_param(&url, "depth"))
}

fn entry_from(response: HttpResponse) -> Result<ObjectData> {
    let root = XmlElement::parse(&response.body)?;
    parse::parse_entry(parse::single_entry(&root)?)
}

fn change_token_options(change_token: Option<&str>) -> Options {
    let mut options = Options::new();
    if let Some(token) = change_token {
        options.set("changeToken", token);
    }
    options
}

/// `atom:content` of an entry: its `src` or inline text, with the type.
fn content_element(entry: &XmlElement) -> Option<&XmlElement> {
    entry.child(ATOM_NS, "content")
}

/// The entry's `atom:content`, if any; more than one is a protocol error.
fn single_content(entry: &XmlElement) -> Result<Option<&XmlElement>> {
    let mut contents = entry.children_named(ATOM_NS, "content");
    let first = contents.next();
    if contents.next().is_some() {
        return Err(CmisError::protocol(
            "expected exactly one atom:content element, found several",
        ));
    }
    Ok(first)
}

#[async_trait]
impl Binding for AtomPubBinding {
    fn kind(&self) -> BindingKind {
        BindingKind::AtomPub
    }

    async fn get_repositories(&self) -> Result<Vec<RepositoryData>> {
        let root = self.get_xml(&self.service_url, &Options::new()).await?;
        parse::parse_service(&root)
    }

    async fn get_object(
        &self,
        repo: &RepositoryData,
        object_id: &str,
        options: &Options,
    ) -> Result<ObjectData> {
        let root = self
            .get_by_template(repo, "objectbyid", &[("id", object_id)], options)
            .await?;
        parse::parse_entry(parse::single_entry(&root)?)
    }

    async fn get_object_by_path(
        &self,
        repo: &RepositoryData,
        path: &str,
        options: &Options,
    ) -> Result<ObjectData> {
        let root = self
            .get_by_template(repo, "objectbypath", &[("path", path)], options)
            .await?;
        parse::parse_entry(parse::single_entry(&root)?)
    }

    async fn get_type_definition(
        &self,
        repo: &RepositoryData,
        type_id: &str,
    ) -> Result<TypeDefinition> {
        parse::parse_type(&self.type_entry(repo, type_id).await?)
    }

    async fn get_type_children(
        &self,
        repo: &RepositoryData,
        type_id: Option<&str>,
        options: &Options,
    ) -> Result<Vec<TypeDefinition>> {
        let url = match type_id {
            Some(id) => {
                let entry = self.type_entry(repo, id).await?;
                parse::find_link(&entry, DOWN_REL, is_feed_type).ok_or_else(|| {
                    CmisError::not_supported(format!("type '{}' has no children link", id))
                })?
            }
            None => collection(repo, TYPES_COLL)?.to_string(),
        };
        let root = self.get_xml(&url, options).await?;
        parse::parse_type_feed(&root)
    }

    async fn get_type_descendants(
        &self,
        repo: &RepositoryData,
        type_id: Option<&str>,
        options: &Options,
    ) -> Result<Vec<TypeDefinition>> {
        let url = match type_id {
            Some(id) => {
                let entry = self.type_entry(repo, id).await?;
                parse::find_link(&entry, DOWN_REL, is_tree_type)
            }
            None => workspace(repo)?.link(TYPE_DESCENDANTS_REL).map(str::to_string),
        }
        .ok_or_else(|| CmisError::not_supported("could not determine the type descendants URL"))?;
        let root = self.get_xml(&url, options).await?;
        parse::parse_type_feed(&root)
    }

    async fn query(
        &self,
        repo: &RepositoryData,
        statement: &str,
        options: &Options,
    ) -> Result<Page<ObjectData>> {
        let url = collection(repo, QUERY_COLL)?;
        let params: Vec<(&str, &str)> = options.iter().collect();
        let body = write::query_xml(statement, &params);
        let response = self
            .rest
            .post(url, &Options::new(), CMIS_QUERY_TYPE, body.into_bytes())
            .await?;
        parse::parse_feed(&XmlElement::parse(&response.body)?)
    }

    async fn get_content_changes(
        &self,
        repo: &RepositoryData,
        options: &Options,
    ) -> Result<Page<ChangeEntry>> {
        let url = workspace(repo)?
            .link(CHANGE_LOG_REL)
            .ok_or_else(|| CmisError::not_supported("repository has no change log link"))?;
        let root = self.get_xml(url, options).await?;
        parse::parse_change_feed(&root)
    }

    async fn get_collection(
        &self,
        repo: &RepositoryData,
        kind: CollectionKind,
        options: &Options,
    ) -> Result<Page<ObjectData>> {
        let url = collection(repo, kind.as_str())?;
        self.get_feed(url, options).await
    }

    async fn create_folder(
        &self,
        repo: &RepositoryData,
        parent: &ObjectData,
        properties: &Properties,
    ) -> Result<ObjectData> {
        let url = children_link(parent)?;
        let null_types = self.null_types(repo, properties, None).await?;
        let body = write::entry_xml(properties, None, &null_types);
        let response = self
            .rest
            .post(&url, &Options::new(), ATOM_XML_ENTRY_TYPE, body.into_bytes())
            .await?;
        entry_from(response)
    }

    async fn create_document(
        &self,
        repo: &RepositoryData,
        parent: Option<&ObjectData>,
        properties: &Properties,
        content: Option<&ContentStream>,
        options: &Options,
    ) -> Result<ObjectData> {
        let url = match parent {
            Some(folder) => children_link(folder)?,
            None => collection(repo, CollectionKind::Unfiled.as_str())?.to_string(),
        };
        let null_types = self.null_types(repo, properties, None).await?;
        let body = write::entry_xml(properties, content, &null_types);
        let response = self
            .rest
            .post(&url, options, ATOM_XML_ENTRY_TYPE, body.into_bytes())
            .await?;
        entry_from(response)
    }

    async fn create_relationship(
        &self,
        repo: &RepositoryData,
        source: &ObjectData,
        properties: &Properties,
    ) -> Result<ObjectData> {
        let url = required_link(source, RELATIONSHIPS_REL, any_type)?;
        let null_types = self.null_types(repo, properties, None).await?;
        let body = write::entry_xml(properties, None, &null_types);
        let response = self
            .rest
            .post(&url, &Options::new(), ATOM_XML_TYPE, body.into_bytes())
            .await?;
        entry_from(response)
    }

    async fn get_object_parents(
        &self,
        _repo: &RepositoryData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<Vec<ObjectData>> {
        let url = parse::link(entry(object)?, UP_REL)
            .ok_or_else(|| CmisError::not_supported("the root folder has no parents"))?;
        Ok(self.get_feed(&url, options).await?.items)
    }

    async fn get_folder_parent(
        &self,
        _repo: &RepositoryData,
        folder: &ObjectData,
    ) -> Result<Option<ObjectData>> {
        match parse::link(entry(folder)?, UP_REL) {
            Some(url) => Ok(Some(self.get_entry(&url, &Options::new()).await?)),
            None => Ok(None),
        }
    }

    async fn update_properties(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        properties: &Properties,
        change_token: Option<&str>,
    ) -> Result<ObjectData> {
        let url = self_link(object)?;
        let own_type = object.properties.get_str("cmis:objectTypeId");
        let null_types = self.null_types(repo, properties, own_type).await?;
        let body = write::entry_xml(properties, None, &null_types);
        let response = self
            .rest
            .put(
                &url,
                &change_token_options(change_token),
                ATOM_XML_TYPE,
                body.into_bytes(),
            )
            .await?;
        entry_from(response)
    }

    async fn move_object(
        &self,
        _repo: &RepositoryData,
        object: &ObjectData,
        source_folder_id: &str,
        target_folder: &ObjectData,
    ) -> Result<()> {
        let url = children_link(target_folder)?;
        let options = Options::new().with("sourceFolderId", source_folder_id);
        let body = entry(object)?.to_xml();
        self.rest
            .post(&url, &options, ATOM_XML_ENTRY_TYPE, body.into_bytes())
            .await?;
        Ok(())
    }

    async fn delete_object(
        &self,
        _repo: &RepositoryData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<()> {
        self.rest.delete(&self_link(object)?, options).await
    }

    async fn get_relationships(
        &self,
        _repo: &RepositoryData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>> {
        let url = required_link(object, RELATIONSHIPS_REL, any_type)?;
        self.get_feed(&url, options).await
    }

    async fn get_acl(&self, _repo: &RepositoryData, object: &ObjectData) -> Result<Acl> {
        let url = required_link(object, ACL_REL, any_type)?;
        let root = self.get_xml(&url, &Options::new()).await?;
        Ok(parse::parse_acl(&root))
    }

    async fn apply_acl(
        &self,
        _repo: &RepositoryData,
        object: &ObjectData,
        acl: &Acl,
    ) -> Result<Acl> {
        let url = required_link(object, ACL_REL, any_type)?;
        let body = write::acl_xml(acl);
        let response = self
            .rest
            .put(&url, &Options::new(), CMIS_ACL_TYPE, body.into_bytes())
            .await?;
        Ok(parse::parse_acl(&XmlElement::parse(&response.body)?))
    }

    async fn checkout(&self, repo: &RepositoryData, document: &ObjectData) -> Result<ObjectData> {
        let url = collection(repo, CollectionKind::CheckedOut.as_str())?;
        let id = document
            .object_id()
            .ok_or_else(|| CmisError::InvalidArgument("document has no object id".into()))?;
        let body = write::object_id_entry(id.as_str());
        let response = self
            .rest
            .post(url, &Options::new(), ATOM_XML_ENTRY_TYPE, body.into_bytes())
            .await?;
        entry_from(response)
    }

    async fn cancel_checkout(&self, _repo: &RepositoryData, pwc: &ObjectData) -> Result<()> {
        self.rest.delete(&self_link(pwc)?, &Options::new()).await
    }

    async fn checkin(
        &self,
        _repo: &RepositoryData,
        pwc: &ObjectData,
        major: bool,
        comment: Option<&str>,
        options: &Options,
    ) -> Result<ObjectData> {
        let url = self_link(pwc)?;
        let mut params = options
            .clone()
            .with("checkin", "true")
            .with("major", major);
        if let Some(comment) = comment {
            params.set("checkinComment", comment);
        }
        let body = write::empty_entry();
        let response = self
            .rest
            .put(&url, &params, ATOM_XML_TYPE, body.into_bytes())
            .await?;
        entry_from(response)
    }

    async fn get_all_versions(
        &self,
        _repo: &RepositoryData,
        document: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>> {
        let url = required_link(document, VERSION_HISTORY_REL, any_type)?;
        self.get_feed(&url, options).await
    }

    async fn get_content_stream(
        &self,
        _repo: &RepositoryData,
        document: &ObjectData,
    ) -> Result<ContentStream> {
        let mut current = entry(document)?.clone();
        if single_content(&current)?.is_none() {
            // listings may omit atom:content; the entry itself has it
            let url = self_link(document)?;
            let root = self.get_xml(&url, &Options::new()).await?;
            current = parse::single_entry(&root)?.clone();
        }
        let content = single_content(&current)?
            .ok_or_else(|| CmisError::protocol("entry has no atom:content element"))?;
        let declared_type = content.attr("type").map(str::to_string);

        match content.attr("src") {
            Some(src) => {
                let response = self.rest.get(src, &Options::new()).await?;
                let mime_type = response
                    .header("Content-Type")
                    .map(str::to_string)
                    .or(declared_type)
                    .unwrap_or_else(|| ContentStream::DEFAULT_MIME_TYPE.to_string());
                Ok(ContentStream::new(mime_type, response.body))
            }
            None => {
                let mime_type =
                    declared_type.unwrap_or_else(|| ContentStream::DEFAULT_MIME_TYPE.to_string());
                let text = content.text();
                let data = if mime_type.ends_with("base64") {
                    STANDARD
                        .decode(text.trim())
                        .map_err(|e| CmisError::protocol(format!("invalid inline content: {}", e)))?
                } else {
                    text.into_bytes()
                };
                Ok(ContentStream::new(mime_type, data))
            }
        }
    }

    async fn set_content_stream(
        &self,
        _repo: &RepositoryData,
        document: &ObjectData,
        content: &ContentStream,
        change_token: Option<&str>,
    ) -> Result<Option<ObjectData>> {
        let src = content_src(document)?;
        let response = self
            .rest
            .put(
                &src,
                &change_token_options(change_token),
                &content.mime_type,
                content.data.clone(),
            )
            .await?;
        match non_empty_body(response) {
            Some(body) => {
                let root = XmlElement::parse(&body)?;
                Ok(Some(parse::parse_entry(parse::single_entry(&root)?)?))
            }
            None => Ok(None),
        }
    }

    async fn delete_content_stream(
        &self,
        _repo: &RepositoryData,
        document: &ObjectData,
        change_token: Option<&str>,
    ) -> Result<()> {
        let src = content_src(document)?;
        self.rest
            .delete(&src, &change_token_options(change_token))
            .await
    }

    async fn get_renditions(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<Vec<Rendition>> {
        let id = object
            .object_id()
            .ok_or_else(|| CmisError::InvalidArgument("object has no object id".into()))?;
        let root = self
            .get_by_template(repo, "objectbyid", &[("id", id.as_str())], options)
            .await?;
        Ok(parse::parse_renditions(parse::single_entry(&root)?))
    }

    async fn get_children(
        &self,
        _repo: &RepositoryData,
        folder: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>> {
        let url = children_link(folder)?;
        self.get_feed(&url, options).await
    }

    async fn get_descendants(
        &self,
        _repo: &RepositoryData,
        folder: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>> {
        let url = descendants_link(folder)?;
        self.get_feed(&url, options).await
    }

    async fn get_folder_tree(
        &self,
        _repo: &RepositoryData,
        folder: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>> {
        let url = required_link(folder, FOLDER_TREE_REL, any_type)?;
        self.get_feed(&url, options).await
    }

    async fn delete_tree(
        &self,
        _repo: &RepositoryData,
        folder: &ObjectData,
        options: &Options,
    ) -> Result<()> {
        let url = required_link(folder, DOWN_REL, is_tree_type)?;
        self.rest.delete(&url, options).await
    }

    async fn add_object(
        &self,
        _repo: &RepositoryData,
        folder: &ObjectData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<()> {
        let url = children_link(folder)?;
        let body = entry(object)?.to_xml();
        self.rest
            .post(&url, options, ATOM_XML_ENTRY_TYPE, body.into_bytes())
            .await?;
        Ok(())
    }

    async fn remove_object(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
        object: &ObjectData,
    ) -> Result<()> {
        let url = collection(repo, CollectionKind::Unfiled.as_str())?;
        let folder_id = folder
            .object_id()
            .ok_or_else(|| CmisError::InvalidArgument("folder has no object id".into()))?;
        let options = Options::new().with("removeFrom", folder_id);
        let body = entry(object)?.to_xml();
        self.rest
            .post(url, &options, ATOM_XML_ENTRY_TYPE, body.into_bytes())
            .await?;
        Ok(())
    }

    async fn navigate(
        &self,
        _repo: &RepositoryData,
        nav: &PageNav,
        link: PageLink,
    ) -> Result<Page<ObjectData>> {
        let url = page_link(nav, link)?;
        self.get_feed(url, &Options::new()).await
    }

    async fn navigate_changes(
        &self,
        _repo: &RepositoryData,
        nav: &PageNav,
        link: PageLink,
    ) -> Result<Page<ChangeEntry>> {
        let url = page_link(nav, link)?;
        let root = self.get_xml(url, &Options::new()).await?;
        parse::parse_change_feed(&root)
    }
}

fn content_src(document: &ObjectData) -> Result<String> {
    content_element(entry(document)?)
        .and_then(|c| c.attr("src"))
        .map(str::to_string)
        .ok_or_else(|| CmisError::not_supported("could not determine the content stream URL"))
}

fn page_link(nav: &PageNav, link: PageLink) -> Result<&str> {
    nav.link(link).ok_or_else(|| {
        CmisError::not_supported(format!("result page has no '{}' link", link.rel()))
    })
}
