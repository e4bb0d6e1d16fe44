//! binding::browser
//!
//! The Browser (JSON) binding.
//!
//! Reads are GETs against two base URLs advertised per repository, with a
//! `cmisselector` naming what to return:
//!
//! - `rootFolderUrl?objectId=..&cmisselector=object|children|parents|...`
//! - `repositoryUrl?cmisselector=typeChildren|typeDefinition|checkedOut|...`
//!
//! Writes are form POSTs carrying a `cmisaction`; uploads with content use
//! `multipart/form-data`.
//!
//! Listings report `hasMoreItems` and `numItems` but no paging links, so
//! page navigation is not supported. Neither is the unfiled collection.
//!
//! # Modules
//!
//! - [`json`] - Response decoding
//! - [`form`] - Form encoding of properties, options and ACE changes

pub(crate) mod form;
pub(crate) mod json;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use self::form::{Form, FORM_TYPE};
use super::rest::{non_empty_body, RestClient};
use super::{
    Binding, BindingKind, CollectionKind, ObjectData, Page, PageLink, PageNav, RawRepository,
    RepositoryData,
};
use crate::error::{CmisError, Result};
use crate::model::{
    Acl, ChangeEntry, CmisId, ContentStream, Options, Properties, Rendition, TypeDefinition,
};
use crate::transport::multipart::FilePart;
use crate::transport::{Credentials, HttpResponse, Transport};

/// Browser binding over a [`Transport`].
#[derive(Debug, Clone)]
pub struct BrowserBinding {
    service_url: String,
    rest: RestClient,
}

/// The two base URLs of a repository.
struct Urls<'a> {
    repository: &'a str,
    root_folder: &'a str,
}

fn urls(repo: &RepositoryData) -> Result<Urls<'_>> {
    match &repo.raw {
        RawRepository::Json {
            repository_url,
            root_folder_url,
        } => Ok(Urls {
            repository: repository_url,
            root_folder: root_folder_url,
        }),
        RawRepository::Atom(_) => Err(CmisError::protocol(
            "repository was not loaded through the Browser binding",
        )),
    }
}

fn id_of(data: &ObjectData) -> Result<CmisId> {
    data.object_id()
        .ok_or_else(|| CmisError::InvalidArgument("object has no object id".into()))
}

fn with_query(base: &str, params: &[(&str, &str)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish();
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base, separator, query)
}

fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn object_from(response: HttpResponse) -> Result<ObjectData> {
    json::parse_object(&json::parse_body(&response.body)?)
}

fn not_paged(link: PageLink) -> CmisError {
    CmisError::not_supported(format!(
        "the Browser binding has no '{}' page link; page with skipCount instead",
        link.rel()
    ))
}

impl BrowserBinding {
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

    async fn get_json(&self, url: &str, options: &Options) -> Result<Value> {
        let response = self.rest.get(url, options).await?;
        json::parse_body(&response.body)
    }

    /// GET `rootFolderUrl?objectId=..&cmisselector=..`.
    async fn object_selector(
        &self,
        repo: &RepositoryData,
        object_id: &str,
        selector: &str,
        options: &Options,
    ) -> Result<Value> {
        let urls = urls(repo)?;
        debug!(selector, object_id, "browser object selector");
        let url = with_query(
            urls.root_folder,
            &[("objectId", object_id), ("cmisselector", selector)],
        );
        self.get_json(&url, options).await
    }

    /// GET `repositoryUrl?cmisselector=..`.
    async fn repository_selector(
        &self,
        repo: &RepositoryData,
        params: &[(&str, &str)],
        options: &Options,
    ) -> Result<Value> {
        let urls = urls(repo)?;
        let url = with_query(urls.repository, params);
        self.get_json(&url, options).await
    }

    async fn post_form(&self, url: &str, form: &Form) -> Result<HttpResponse> {
        debug!(action = form.get("cmisaction"), "browser form post");
        self.rest
            .post(url, &Options::new(), FORM_TYPE, form.encode())
            .await
    }

    /// POST to `rootFolderUrl`, decoding the returned object.
    async fn post_for_object(&self, repo: &RepositoryData, form: &Form) -> Result<ObjectData> {
        let response = self.post_form(urls(repo)?.root_folder, form).await?;
        object_from(response)
    }

    async fn post_multipart(
        &self,
        url: &str,
        form: &Form,
        content: &ContentStream,
    ) -> Result<HttpResponse> {
        let (content_type, body) = form.encode_multipart(Some(FilePart {
            mime_type: &content.mime_type,
            data: &content.data,
        }));
        debug!(action = form.get("cmisaction"), "browser multipart post");
        self.rest.post(url, &Options::new(), &content_type, body).await
    }
}

#[async_trait]
impl Binding for BrowserBinding {
    fn kind(&self) -> BindingKind {
        BindingKind::Browser
    }

    async fn get_repositories(&self) -> Result<Vec<RepositoryData>> {
        let root = self.get_json(&self.service_url, &Options::new()).await?;
        json::parse_repositories(&root)
    }

    async fn get_object(
        &self,
        repo: &RepositoryData,
        object_id: &str,
        options: &Options,
    ) -> Result<ObjectData> {
        let value = self.object_selector(repo, object_id, "object", options).await?;
        json::parse_object(&value)
    }

    async fn get_object_by_path(
        &self,
        repo: &RepositoryData,
        path: &str,
        options: &Options,
    ) -> Result<ObjectData> {
        let urls = urls(repo)?;
        let quoted = path
            .trim_start_matches('/')
            .split('/')
            .map(encode_segment)
            .collect::<Vec<_>>()
            .join("/");
        let base = format!("{}/{}", urls.root_folder.trim_end_matches('/'), quoted);
        let url = with_query(&base, &[("cmisselector", "object")]);
        json::parse_object(&self.get_json(&url, options).await?)
    }

    async fn get_type_definition(
        &self,
        repo: &RepositoryData,
        type_id: &str,
    ) -> Result<TypeDefinition> {
        let value = self
            .repository_selector(
                repo,
                &[("cmisselector", "typeDefinition"), ("typeId", type_id)],
                &Options::new(),
            )
            .await?;
        json::parse_type(&value)
    }

    async fn get_type_children(
        &self,
        repo: &RepositoryData,
        type_id: Option<&str>,
        options: &Options,
    ) -> Result<Vec<TypeDefinition>> {
        let mut params = vec![("cmisselector", "typeChildren")];
        if let Some(id) = type_id {
            params.push(("typeId", id));
        }
        let value = self.repository_selector(repo, &params, options).await?;
        json::parse_type_list(&value)
    }

    async fn get_type_descendants(
        &self,
        repo: &RepositoryData,
        type_id: Option<&str>,
        options: &Options,
    ) -> Result<Vec<TypeDefinition>> {
        let mut params = vec![("cmisselector", "typeDescendants")];
        if let Some(id) = type_id {
            params.push(("typeId", id));
        }
        let value = self.repository_selector(repo, &params, options).await?;
        json::parse_type_tree(&value)
    }

    async fn query(
        &self,
        repo: &RepositoryData,
        statement: &str,
        options: &Options,
    ) -> Result<Page<ObjectData>> {
        let form = Form::action("query")
            .field("statement", statement)
            .options(options);
        let response = self.post_form(urls(repo)?.repository, &form).await?;
        json::parse_query_results(&json::parse_body(&response.body)?)
    }

    async fn get_content_changes(
        &self,
        repo: &RepositoryData,
        options: &Options,
    ) -> Result<Page<ChangeEntry>> {
        let value = self
            .repository_selector(repo, &[("cmisselector", "contentChanges")], options)
            .await?;
        json::parse_change_list(&value)
    }

    async fn get_collection(
        &self,
        repo: &RepositoryData,
        kind: CollectionKind,
        options: &Options,
    ) -> Result<Page<ObjectData>> {
        match kind {
            CollectionKind::Root => {
                let url = with_query(urls(repo)?.root_folder, &[("cmisselector", "children")]);
                json::parse_object_list(&self.get_json(&url, options).await?)
            }
            CollectionKind::CheckedOut => {
                let value = self
                    .repository_selector(repo, &[("cmisselector", "checkedOut")], options)
                    .await?;
                json::parse_object_list(&value)
            }
            CollectionKind::Unfiled => Err(CmisError::not_supported(
                "the Browser binding has no unfiled collection",
            )),
        }
    }

    async fn create_folder(
        &self,
        repo: &RepositoryData,
        parent: &ObjectData,
        properties: &Properties,
    ) -> Result<ObjectData> {
        let form = Form::action("createFolder")
            .object_id(id_of(parent)?)
            .properties(properties);
        self.post_for_object(repo, &form).await
    }

    async fn create_document(
        &self,
        repo: &RepositoryData,
        parent: Option<&ObjectData>,
        properties: &Properties,
        content: Option<&ContentStream>,
        options: &Options,
    ) -> Result<ObjectData> {
        let parent = parent.ok_or_else(|| {
            CmisError::not_supported("the Browser binding cannot create unfiled documents")
        })?;
        let form = Form::action("createDocument")
            .object_id(id_of(parent)?)
            .properties(properties)
            .options(options);
        let url = urls(repo)?.root_folder;
        let response = match content {
            Some(content) => self.post_multipart(url, &form, content).await?,
            None => self.post_form(url, &form).await?,
        };
        object_from(response)
    }

    async fn create_relationship(
        &self,
        repo: &RepositoryData,
        _source: &ObjectData,
        properties: &Properties,
    ) -> Result<ObjectData> {
        let form = Form::action("createRelationship").properties(properties);
        let response = self.post_form(urls(repo)?.repository, &form).await?;
        object_from(response)
    }

    async fn get_object_parents(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<Vec<ObjectData>> {
        let id = id_of(object)?;
        let allowed = match &object.allowable_actions {
            Some(actions) => actions.is_allowed("canGetObjectParents"),
            None => {
                let reloaded = self
                    .get_object(repo, id.as_str(), &Options::new().include_allowable_actions(true))
                    .await?;
                reloaded
                    .allowable_actions
                    .is_some_and(|a| a.is_allowed("canGetObjectParents"))
            }
        };
        if !allowed {
            return Err(CmisError::not_supported(format!(
                "object {} does not allow canGetObjectParents",
                id
            )));
        }
        let value = self.object_selector(repo, id.as_str(), "parents", options).await?;
        json::parse_parents(&value)
    }

    async fn get_folder_parent(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
    ) -> Result<Option<ObjectData>> {
        if folder.properties.get_str("cmis:parentId").is_none() {
            return Ok(None);
        }
        let value = self
            .object_selector(repo, id_of(folder)?.as_str(), "parent", &Options::new())
            .await?;
        json::parse_object(&value).map(Some)
    }

    async fn update_properties(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        properties: &Properties,
        change_token: Option<&str>,
    ) -> Result<ObjectData> {
        let form = Form::action("update")
            .object_id(id_of(object)?)
            .change_token(change_token)
            .properties(properties);
        self.post_for_object(repo, &form).await
    }

    async fn move_object(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        source_folder_id: &str,
        target_folder: &ObjectData,
    ) -> Result<()> {
        let form = Form::action("move")
            .object_id(id_of(object)?)
            .field("sourceFolderId", source_folder_id)
            .field("targetFolderId", id_of(target_folder)?);
        self.post_form(urls(repo)?.root_folder, &form).await?;
        Ok(())
    }

    async fn delete_object(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<()> {
        let form = Form::action("delete")
            .object_id(id_of(object)?)
            .options(options);
        self.post_form(urls(repo)?.root_folder, &form).await?;
        Ok(())
    }

    async fn get_relationships(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>> {
        let value = self
            .object_selector(repo, id_of(object)?.as_str(), "relationships", options)
            .await?;
        json::parse_object_list(&value)
    }

    async fn get_acl(&self, repo: &RepositoryData, object: &ObjectData) -> Result<Acl> {
        let value = self
            .object_selector(
                repo,
                id_of(object)?.as_str(),
                "object",
                &Options::new().include_acl(true),
            )
            .await?;
        match value.get("acl") {
            Some(acl) => json::parse_acl(acl),
            None => Ok(Acl::new()),
        }
    }

    async fn apply_acl(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        acl: &Acl,
    ) -> Result<Acl> {
        let current = self.get_acl(repo, object).await?;
        let form = Form::action("applyACL")
            .object_id(id_of(object)?)
            .acl_changes(acl, &current);
        let response = self.post_form(urls(repo)?.root_folder, &form).await?;
        let value = json::parse_body(&response.body)?;
        json::parse_acl(value.get("acl").unwrap_or(&value))
    }

    async fn checkout(&self, repo: &RepositoryData, document: &ObjectData) -> Result<ObjectData> {
        let form = Form::action("checkOut").object_id(id_of(document)?);
        self.post_for_object(repo, &form).await
    }

    async fn cancel_checkout(&self, repo: &RepositoryData, pwc: &ObjectData) -> Result<()> {
        let form = Form::action("cancelCheckOut").object_id(id_of(pwc)?);
        self.post_form(urls(repo)?.root_folder, &form).await?;
        Ok(())
    }

    async fn checkin(
        &self,
        repo: &RepositoryData,
        pwc: &ObjectData,
        major: bool,
        comment: Option<&str>,
        options: &Options,
    ) -> Result<ObjectData> {
        let mut form = Form::action("checkIn")
            .object_id(id_of(pwc)?)
            .field("major", major.to_string());
        if let Some(comment) = comment {
            form = form.field("checkinComment", comment);
        }
        self.post_for_object(repo, &form.options(options)).await
    }

    async fn get_all_versions(
        &self,
        repo: &RepositoryData,
        document: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>> {
        let value = self
            .object_selector(repo, id_of(document)?.as_str(), "versions", options)
            .await?;
        json::parse_object_array(&value)
    }

    async fn get_content_stream(
        &self,
        repo: &RepositoryData,
        document: &ObjectData,
    ) -> Result<ContentStream> {
        let urls = urls(repo)?;
        let url = with_query(
            urls.root_folder,
            &[("objectId", id_of(document)?.as_str()), ("cmisselector", "content")],
        );
        let response = self.rest.get(&url, &Options::new()).await?;
        let mime_type = response
            .header("Content-Type")
            .or_else(|| document.properties.get_str("cmis:contentStreamMimeType"))
            .unwrap_or(ContentStream::DEFAULT_MIME_TYPE)
            .to_string();
        Ok(ContentStream::new(mime_type, response.body))
    }

    async fn set_content_stream(
        &self,
        repo: &RepositoryData,
        document: &ObjectData,
        content: &ContentStream,
        change_token: Option<&str>,
    ) -> Result<Option<ObjectData>> {
        let form = Form::action("setContent")
            .object_id(id_of(document)?)
            .change_token(change_token);
        let response = self
            .post_multipart(urls(repo)?.root_folder, &form, content)
            .await?;
        match non_empty_body(response) {
            Some(body) => Ok(Some(json::parse_object(&json::parse_body(&body)?)?)),
            None => Ok(None),
        }
    }

    async fn delete_content_stream(
        &self,
        repo: &RepositoryData,
        document: &ObjectData,
        change_token: Option<&str>,
    ) -> Result<()> {
        let form = Form::action("deleteContent")
            .object_id(id_of(document)?)
            .change_token(change_token);
        self.post_form(urls(repo)?.root_folder, &form).await?;
        Ok(())
    }

    async fn get_renditions(
        &self,
        repo: &RepositoryData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<Vec<Rendition>> {
        let options = Options::new().rendition_filter("*").merged(options);
        let value = self
            .object_selector(repo, id_of(object)?.as_str(), "renditions", &options)
            .await?;
        json::parse_renditions(&value)
    }

    async fn get_children(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>> {
        let value = self
            .object_selector(repo, id_of(folder)?.as_str(), "children", options)
            .await?;
        json::parse_object_list(&value)
    }

    async fn get_descendants(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>> {
        let value = self
            .object_selector(repo, id_of(folder)?.as_str(), "descendants", options)
            .await?;
        json::parse_object_tree(&value)
    }

    async fn get_folder_tree(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
        options: &Options,
    ) -> Result<Page<ObjectData>> {
        let value = self
            .object_selector(repo, id_of(folder)?.as_str(), "foldertree", options)
            .await?;
        json::parse_object_tree(&value)
    }

    async fn delete_tree(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
        options: &Options,
    ) -> Result<()> {
        let form = Form::action("deleteTree")
            .object_id(id_of(folder)?)
            .options(options);
        self.post_form(urls(repo)?.root_folder, &form).await?;
        Ok(())
    }

    async fn add_object(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
        object: &ObjectData,
        options: &Options,
    ) -> Result<()> {
        let form = Form::action("addObjectToFolder")
            .field("folderId", id_of(folder)?)
            .object_id(id_of(object)?)
            .options(options);
        self.post_form(urls(repo)?.root_folder, &form).await?;
        Ok(())
    }

    async fn remove_object(
        &self,
        repo: &RepositoryData,
        folder: &ObjectData,
        object: &ObjectData,
    ) -> Result<()> {
        let form = Form::action("removeObjectFromFolder")
            .field("folderId", id_of(folder)?)
            .object_id(id_of(object)?);
        self.post_form(urls(repo)?.root_folder, &form).await?;
        Ok(())
    }

    async fn navigate(
        &self,
        _repo: &RepositoryData,
        _nav: &PageNav,
        link: PageLink,
    ) -> Result<Page<ObjectData>> {
        Err(not_paged(link))
    }

    async fn navigate_changes(
        &self,
        _repo: &RepositoryData,
        _nav: &PageNav,
        link: PageLink,
    ) -> Result<Page<ChangeEntry>> {
        Err(not_paged(link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use crate::transport::Method;
    use serde_json::json;

    const SERVICE_URL: &str = "http://h/browser";
    const ROOT: &str = "http://h/browser/A1/root";
    const REPO: &str = "http://h/browser/A1";

    fn service() -> String {
        json!({
            "A1": {
                "repositoryId": "A1",
                "repositoryName": "Test",
                "rootFolderId": "100",
                "repositoryUrl": REPO,
                "rootFolderUrl": ROOT,
                "capabilities": {"capabilityACL": "manage"}
            }
        })
        .to_string()
    }

    fn doc(actions: Option<Value>) -> String {
        let mut value = json!({
            "properties": {
                "cmis:objectId": {"id": "cmis:objectId", "type": "id", "value": "doc-1"},
                "cmis:baseTypeId": {"id": "cmis:baseTypeId", "type": "id", "value": "cmis:document"},
                "cmis:name": {"id": "cmis:name", "type": "string", "value": "note.txt"},
                "cmis:contentStreamMimeType": {"id": "cmis:contentStreamMimeType", "type": "string", "value": "text/plain"}
            }
        });
        if let Some(actions) = actions {
            value["allowableActions"] = actions;
        }
        value.to_string()
    }

    async fn setup() -> (MockTransport, BrowserBinding, RepositoryData) {
        let transport = MockTransport::new();
        transport.respond(Method::Get, SERVICE_URL, 200, service());
        let binding = BrowserBinding::new(SERVICE_URL, Arc::new(transport.clone()), None);
        let repo = binding.get_repositories().await.unwrap().remove(0);
        transport.clear_requests();
        (transport, binding, repo)
    }

    async fn loaded_doc(
        transport: &MockTransport,
        binding: &BrowserBinding,
        repo: &RepositoryData,
        actions: Option<Value>,
    ) -> ObjectData {
        transport.respond(Method::Get, format!("{}?objectId=doc-1", ROOT), 200, doc(actions));
        let data = binding.get_object(repo, "doc-1", &Options::new()).await.unwrap();
        transport.clear_requests();
        data
    }

    fn form_of(body: &str) -> Vec<(String, String)> {
        url::form_urlencoded::parse(body.as_bytes()).into_owned().collect()
    }

    fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
        fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    mod reads {
        use super::*;

        #[tokio::test]
        async fn object_selector_url() {
            let (transport, binding, repo) = setup().await;
            transport.respond(Method::Get, ROOT, 200, doc(None));
            let data = binding
                .get_object(&repo, "doc-1", &Options::new().filter("*"))
                .await
                .unwrap();
            assert_eq!(data.object_id(), Some(CmisId::new("doc-1")));
            assert_eq!(
                transport.last_request().unwrap().url,
                "http://h/browser/A1/root?objectId=doc-1&cmisselector=object&filter=*"
            );
        }

        #[tokio::test]
        async fn path_is_quoted_onto_root_url() {
            let (transport, binding, repo) = setup().await;
            transport.respond(Method::Get, ROOT, 200, doc(None));
            binding
                .get_object_by_path(&repo, "/My Docs/note.txt", &Options::new())
                .await
                .unwrap();
            assert_eq!(
                transport.last_request().unwrap().url,
                "http://h/browser/A1/root/My%20Docs/note.txt?cmisselector=object"
            );
        }

        #[tokio::test]
        async fn type_definition_on_repository_url() {
            let (transport, binding, repo) = setup().await;
            transport.respond(
                Method::Get,
                REPO,
                200,
                json!({"id": "cmis:folder", "baseId": "cmis:folder"}).to_string(),
            );
            let def = binding.get_type_definition(&repo, "cmis:folder").await.unwrap();
            assert_eq!(def.id, "cmis:folder");
            assert_eq!(
                transport.last_request().unwrap().url,
                "http://h/browser/A1?cmisselector=typeDefinition&typeId=cmis%3Afolder"
            );
        }

        #[tokio::test]
        async fn content_uses_response_type() {
            let (transport, binding, repo) = setup().await;
            let data = loaded_doc(&transport, &binding, &repo, None).await;
            transport.respond(Method::Get, format!("{}?objectId=doc-1&cmisselector=content", ROOT), 200, "hello");

            let stream = binding.get_content_stream(&repo, &data).await.unwrap();
            assert_eq!(stream.text(), "hello");
            assert_eq!(stream.mime_type, "text/plain");
        }
    }

    mod parents {
        use super::*;

        #[tokio::test]
        async fn reloads_allowable_actions_first() {
            let (transport, binding, repo) = setup().await;
            let data = loaded_doc(&transport, &binding, &repo, None).await;
            transport.respond(
                Method::Get,
                format!("{}?objectId=doc-1&cmisselector=object", ROOT),
                200,
                doc(Some(json!({"canGetObjectParents": true}))),
            );
            transport.respond(
                Method::Get,
                format!("{}?objectId=doc-1&cmisselector=parents", ROOT),
                200,
                json!([{"object": serde_json::from_str::<Value>(&doc(None)).unwrap(), "relativePathSegment": "note.txt"}])
                    .to_string(),
            );

            let parents = binding
                .get_object_parents(&repo, &data, &Options::new())
                .await
                .unwrap();
            assert_eq!(parents.len(), 1);
            assert_eq!(parents[0].relative_path_segment.as_deref(), Some("note.txt"));
            let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
            assert!(urls[0].contains("includeAllowableActions=true"));
            assert!(urls[1].contains("cmisselector=parents"));
        }

        #[tokio::test]
        async fn refused_without_permission() {
            let (transport, binding, repo) = setup().await;
            let data = loaded_doc(
                &transport,
                &binding,
                &repo,
                Some(json!({"canGetObjectParents": false})),
            )
            .await;
            let err = binding
                .get_object_parents(&repo, &data, &Options::new())
                .await
                .unwrap_err();
            assert!(err.is_not_supported());
            assert!(transport.requests().is_empty());
        }
    }

    mod writes {
        use super::*;

        #[tokio::test]
        async fn update_posts_form() {
            let (transport, binding, repo) = setup().await;
            let data = loaded_doc(&transport, &binding, &repo, None).await;
            transport.respond(Method::Post, ROOT, 200, doc(None));

            let props = Properties::new().with("cmis:name", "renamed.txt");
            binding
                .update_properties(&repo, &data, &props, Some("tok-1"))
                .await
                .unwrap();

            let post = transport.last_request().unwrap();
            assert_eq!(post.url, ROOT);
            assert_eq!(post.header("Content-Type"), Some(FORM_TYPE));
            let fields = form_of(&post.body_text());
            assert_eq!(field(&fields, "cmisaction"), Some("update"));
            assert_eq!(field(&fields, "objectId"), Some("doc-1"));
            assert_eq!(field(&fields, "changeToken"), Some("tok-1"));
            assert_eq!(field(&fields, "propertyValue[0]"), Some("renamed.txt"));
        }

        #[tokio::test]
        async fn document_with_content_is_multipart() {
            let (transport, binding, repo) = setup().await;
            let folder = loaded_doc(&transport, &binding, &repo, None).await;
            transport.respond(Method::Post, ROOT, 201, doc(None));

            let props = Properties::new()
                .with("cmis:name", "a.txt")
                .with("cmis:objectTypeId", CmisId::new("cmis:document"));
            let content = ContentStream::new("text/plain", b"hello".to_vec());
            binding
                .create_document(&repo, Some(&folder), &props, Some(&content), &Options::new())
                .await
                .unwrap();

            let post = transport.last_request().unwrap();
            assert!(post
                .header("Content-Type")
                .unwrap()
                .starts_with("multipart/form-data; boundary="));
            let body = post.body_text();
            assert!(body.contains("createDocument"));
            assert!(body.contains("filename=\"a.txt\""));
            assert!(body.contains("hello"));
        }

        #[tokio::test]
        async fn unfiled_documents_are_not_supported() {
            let (transport, binding, repo) = setup().await;
            let err = binding
                .create_document(&repo, None, &Properties::new(), None, &Options::new())
                .await
                .unwrap_err();
            assert!(err.is_not_supported());
            assert!(transport.requests().is_empty());
        }

        #[tokio::test]
        async fn checkin_fields() {
            let (transport, binding, repo) = setup().await;
            let pwc = loaded_doc(&transport, &binding, &repo, None).await;
            transport.respond(Method::Post, ROOT, 200, doc(None));
            binding
                .checkin(&repo, &pwc, true, Some("done"), &Options::new())
                .await
                .unwrap();
            let fields = form_of(&transport.last_request().unwrap().body_text());
            assert_eq!(field(&fields, "cmisaction"), Some("checkIn"));
            assert_eq!(field(&fields, "major"), Some("true"));
            assert_eq!(field(&fields, "checkinComment"), Some("done"));
        }

        #[tokio::test]
        async fn apply_acl_diffs_against_server() {
            let (transport, binding, repo) = setup().await;
            let data = loaded_doc(&transport, &binding, &repo, None).await;
            let server_acl = json!({
                "aces": [{"principal": {"principalId": "guest"}, "permissions": ["cmis:read"], "isDirect": true}]
            });
            let mut with_acl: Value = serde_json::from_str(&doc(None)).unwrap();
            with_acl["acl"] = server_acl;
            transport.respond(
                Method::Get,
                format!("{}?objectId=doc-1&cmisselector=object&includeACL", ROOT),
                200,
                with_acl.to_string(),
            );
            transport.respond(
                Method::Post,
                ROOT,
                200,
                json!({"aces": [{"principal": {"principalId": "jdoe"}, "permissions": ["cmis:all"], "isDirect": true}]})
                    .to_string(),
            );

            let mut acl = Acl::new();
            acl.add_entry("jdoe", ["cmis:all"], true);
            let result = binding.apply_acl(&repo, &data, &acl).await.unwrap();
            assert!(result.get("jdoe").is_some());

            let fields = form_of(&transport.last_request().unwrap().body_text());
            assert_eq!(field(&fields, "addACEPrincipal[0]"), Some("jdoe"));
            assert_eq!(field(&fields, "removeACEPrincipal[0]"), Some("guest"));
        }
    }

    #[tokio::test]
    async fn paging_and_unfiled_are_not_supported() {
        let (_transport, binding, repo) = setup().await;
        let nav = PageNav {
            has_more_items: Some(true),
            ..PageNav::default()
        };
        assert!(binding
            .navigate(&repo, &nav, PageLink::Next)
            .await
            .unwrap_err()
            .is_not_supported());
        assert!(binding
            .get_collection(&repo, CollectionKind::Unfiled, &Options::new())
            .await
            .unwrap_err()
            .is_not_supported());
    }
}
