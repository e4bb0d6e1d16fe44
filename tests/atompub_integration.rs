//! Integration tests for the AtomPub binding.
//!
//! These tests drive the public API (client, repository, object model,
//! result sets) over an in-memory transport with canned Atom documents.

use std::sync::Arc;

use cmisclient::model::{Acl, ReturnVersion};
use cmisclient::transport::{Credentials, Method, MockTransport};
use cmisclient::{CmisClient, CmisError, Options, Properties, Repository};

// =============================================================================
// Fixtures
// =============================================================================

const SERVICE_URL: &str = "http://h/atom";

const CAPABILITIES: &str = r#"<cmis:capabilityACL>manage</cmis:capabilityACL>
        <cmis:capabilityChanges>none</cmis:capabilityChanges>
        <cmis:capabilityUnfiling>false</cmis:capabilityUnfiling>
        <cmis:capabilityGetDescendants>false</cmis:capabilityGetDescendants>
        <cmis:capabilityGetFolderTree>false</cmis:capabilityGetFolderTree>"#;

/// A service document advertising one repository with `capabilities`.
fn service(capabilities: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<app:service xmlns:app="http://www.w3.org/2007/app" xmlns:atom="http://www.w3.org/2005/Atom"
    xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/"
    xmlns:cmisra="http://docs.oasis-open.org/ns/cmis/restatom/200908/">
  <app:workspace>
    <cmisra:repositoryInfo>
      <cmis:repositoryId>repo</cmis:repositoryId>
      <cmis:repositoryName>Test Repository</cmis:repositoryName>
      <cmis:rootFolderId>root</cmis:rootFolderId>
      <cmis:capabilities>
        {capabilities}
      </cmis:capabilities>
    </cmisra:repositoryInfo>
    <app:collection href="http://h/atom/children?id=root"><cmisra:collectionType>root</cmisra:collectionType></app:collection>
    <app:collection href="http://h/atom/query"><cmisra:collectionType>query</cmisra:collectionType></app:collection>
    <app:collection href="http://h/atom/checkedout"><cmisra:collectionType>checkedout</cmisra:collectionType></app:collection>
    <cmisra:uritemplate>
      <cmisra:template>http://h/atom/id?id={{id}}&amp;filter={{filter}}&amp;includeAllowableActions={{includeAllowableActions}}</cmisra:template>
      <cmisra:type>objectbyid</cmisra:type>
    </cmisra:uritemplate>
    <cmisra:uritemplate>
      <cmisra:template>http://h/atom/path?path={{path}}&amp;filter={{filter}}</cmisra:template>
      <cmisra:type>objectbypath</cmisra:type>
    </cmisra:uritemplate>
  </app:workspace>
</app:service>"#,
        capabilities = capabilities
    )
}

const NS: &str = r#"xmlns="http://www.w3.org/2005/Atom"
    xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/"
    xmlns:cmisra="http://docs.oasis-open.org/ns/cmis/restatom/200908/""#;

/// An entry body (without the XML declaration) for an object.
fn entry_body(id: &str, base: &str, name: &str, links: &str, extra: &str) -> String {
    format!(
        r#"<entry {ns}>
  <title>{name}</title>
  <link rel="self" href="http://h/atom/entry?id={id}"/>
  {links}
  <cmisra:object>
    <cmis:properties>
      <cmis:propertyId propertyDefinitionId="cmis:objectId"><cmis:value>{id}</cmis:value></cmis:propertyId>
      <cmis:propertyId propertyDefinitionId="cmis:baseTypeId"><cmis:value>{base}</cmis:value></cmis:propertyId>
      <cmis:propertyString propertyDefinitionId="cmis:name"><cmis:value>{name}</cmis:value></cmis:propertyString>
      <cmis:propertyString propertyDefinitionId="cmis:changeToken"><cmis:value>tok-{id}</cmis:value></cmis:propertyString>
    </cmis:properties>
    {extra}
  </cmisra:object>
</entry>"#,
        ns = NS,
        id = id,
        base = base,
        name = name,
        links = links,
        extra = extra
    )
}

fn root_entry() -> String {
    entry_body(
        "root",
        "cmis:folder",
        "",
        r#"<link rel="down" type="application/atom+xml;type=feed" href="http://h/atom/children?id=root"/>"#,
        "",
    )
}

fn doc_entry(extra: &str) -> String {
    entry_body(
        "doc-1",
        "cmis:document",
        "note.txt",
        r#"<link rel="http://docs.oasis-open.org/ns/cmis/link/200908/acl" href="http://h/atom/acl?id=doc-1"/>"#,
        extra,
    )
}

fn feed(links: &str, entries: &[String]) -> String {
    let entries: Vec<String> = entries
        .iter()
        .map(|e| e.replacen(&format!("<entry {}>", NS), "<entry>", 1))
        .collect();
    format!("<feed {}>\n{}\n{}\n</feed>", NS, links, entries.join("\n"))
}

struct TestService {
    transport: MockTransport,
    repo: Repository,
}

impl TestService {
    async fn new() -> Self {
        Self::with_capabilities(CAPABILITIES).await
    }

    async fn with_capabilities(capabilities: &str) -> Self {
        let transport = MockTransport::new();
        transport.respond(Method::Get, SERVICE_URL, 200, service(capabilities));
        transport.respond(Method::Get, "http://h/atom/id?id=root", 200, root_entry());
        transport.respond(Method::Get, "http://h/atom/id?id=doc-1", 200, doc_entry(""));

        let client = CmisClient::with_transport(
            SERVICE_URL,
            Arc::new(transport.clone()),
            Some(Credentials::new("admin", "secret")),
            None,
        )
        .expect("client");
        let repo = client.get_default_repository().await.expect("repository");
        transport.clear_requests();
        Self { transport, repo }
    }
}

// =============================================================================
// Discovery and navigation
// =============================================================================

#[tokio::test]
async fn discovery_reads_repository_info() {
    let service = TestService::new().await;
    assert_eq!(service.repo.id(), "repo");
    assert_eq!(
        service.repo.name().await.unwrap().as_deref(),
        Some("Test Repository")
    );
    // metadata is cached from discovery
    assert!(service.transport.requests().is_empty());
}

#[tokio::test]
async fn requests_carry_credentials() {
    let service = TestService::new().await;
    service.repo.get_root_folder().await.unwrap();
    let request = service.transport.last_request().unwrap();
    assert_eq!(request.username.as_deref(), Some("admin"));
}

#[tokio::test]
async fn children_page_through_next_links() {
    let service = TestService::new().await;
    let page_one = feed(
        r#"<link rel="next" href="http://h/atom/children?id=root&amp;skipCount=1"/>
<cmisra:numItems>2</cmisra:numItems>"#,
        &[doc_entry("")],
    );
    let page_two = feed(
        "",
        &[entry_body("doc-2", "cmis:document", "second.txt", "", "")],
    );
    service
        .transport
        .respond(Method::Get, "http://h/atom/children?id=root", 200, page_one);
    service.transport.respond(
        Method::Get,
        "http://h/atom/children?id=root&skipCount=1",
        200,
        page_two,
    );

    let root = service.repo.get_root_folder().await.unwrap();
    let mut children = root.get_children(&Options::new()).await.unwrap();
    assert_eq!(children.num_items(), Some(2));
    assert!(children.has_object("doc-1"));
    assert!(children.has_next());
    assert!(!children.has_prev());

    children.next_page().await.unwrap();
    let names: Vec<&str> = children
        .results()
        .iter()
        .filter_map(|c| c.object().name())
        .collect();
    assert_eq!(names, vec!["second.txt"]);
    assert!(!children.has_next());
    assert_eq!(
        service.transport.last_request().unwrap().url,
        "http://h/atom/children?id=root&skipCount=1"
    );
}

#[tokio::test]
async fn missing_page_link_is_not_supported() {
    let service = TestService::new().await;
    service
        .transport
        .respond(Method::Get, "http://h/atom/children?id=root", 200, feed("", &[]));
    let root = service.repo.get_root_folder().await.unwrap();
    let mut children = root.get_children(&Options::new()).await.unwrap();
    assert!(children.is_empty());
    assert!(!children.has_next());
    let err = children.prev_page().await.unwrap_err();
    assert!(err.is_not_supported());
}

#[tokio::test]
async fn query_results() {
    let service = TestService::new().await;
    service.transport.respond(
        Method::Post,
        "http://h/atom/query",
        200,
        feed(
            "",
            &[
                doc_entry(""),
                entry_body("doc-2", "cmis:document", "b.txt", "", ""),
            ],
        ),
    );

    let mut results = service
        .repo
        .query("SELECT * FROM cmis:document", &Options::new().max_items(10))
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.results()[1].as_document().is_some());

    let post = service.transport.last_request().unwrap();
    assert!(post.body_text().contains("SELECT * FROM cmis:document"));
    assert!(post.body_text().contains("<maxItems>10</maxItems>"));
}

// =============================================================================
// Error taxonomy and capability gating
// =============================================================================

#[tokio::test]
async fn http_statuses_map_to_error_kinds() {
    let service = TestService::new().await;

    let err = service
        .repo
        .get_object("missing", &Options::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CmisError::ObjectNotFound(_)));

    service
        .transport
        .respond(Method::Get, "http://h/atom/id?id=secret", 403, "forbidden");
    let err = service
        .repo
        .get_object("secret", &Options::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CmisError::PermissionDenied(_)));

    service
        .transport
        .respond(Method::Put, "http://h/atom/entry?id=doc-1", 409, "stale");
    let mut doc = service.repo.get_object("doc-1", &Options::new()).await.unwrap();
    let err = doc
        .object_mut()
        .update_properties(&Properties::new().with("cmis:name", "x.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, CmisError::UpdateConflict(_)));
    let put = service.transport.last_request().unwrap();
    assert!(put.url.contains("changeToken=tok-doc-1"));
}

#[tokio::test]
async fn content_changes_refused_before_any_request() {
    let service = TestService::new().await;
    let err = service
        .repo
        .get_content_changes(&Options::new())
        .await
        .unwrap_err();
    assert!(err.is_not_supported());
    assert!(service.transport.requests().is_empty());
}

#[tokio::test]
async fn unfiled_document_needs_unfiling() {
    let service = TestService::new().await;
    let err = service
        .repo
        .create_document("orphan.txt", Properties::new(), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CmisError::InvalidArgument(_)));
    assert!(service.transport.requests().is_empty());
}

#[tokio::test]
async fn acl_calls_refused_without_acl_capability() {
    let service = TestService::with_capabilities(
        "<cmis:capabilityACL>none</cmis:capabilityACL>",
    )
    .await;
    let mut doc = service.repo.get_object("doc-1", &Options::new()).await.unwrap();
    service.transport.clear_requests();

    let err = doc.object().get_acl().await.unwrap_err();
    assert!(err.is_not_supported());

    let mut acl = Acl::new();
    acl.add_entry("jdoe", ["cmis:read"], true);
    let err = doc.object_mut().apply_acl(&acl).await.unwrap_err();
    assert!(err.is_not_supported());
    assert!(service.transport.requests().is_empty());
}

#[tokio::test]
async fn discover_only_acl_can_read_but_not_apply() {
    let service = TestService::with_capabilities(
        "<cmis:capabilityACL>discover</cmis:capabilityACL>",
    )
    .await;
    service.transport.respond(
        Method::Get,
        "http://h/atom/acl?id=doc-1",
        200,
        r#"<cmis:acl xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/">
  <cmis:permission>
    <cmis:principal><cmis:principalId>jdoe</cmis:principalId></cmis:principal>
    <cmis:permission>cmis:read</cmis:permission>
    <cmis:direct>true</cmis:direct>
  </cmis:permission>
</cmis:acl>"#,
    );
    let mut doc = service.repo.get_object("doc-1", &Options::new()).await.unwrap();

    let acl = doc.object().get_acl().await.unwrap();
    assert_eq!(acl.get("jdoe").unwrap().permissions, vec!["cmis:read"]);
    service.transport.clear_requests();

    let err = doc.object_mut().apply_acl(&acl).await.unwrap_err();
    assert!(err.is_not_supported());
    assert!(service.transport.requests().is_empty());
}

#[tokio::test]
async fn tree_calls_refused_without_capabilities() {
    let service = TestService::new().await;
    let root = service.repo.get_root_folder().await.unwrap();
    service.transport.clear_requests();

    let err = root.get_descendants(None, &Options::new()).await.unwrap_err();
    assert!(err.is_not_supported());
    let err = root.get_tree(Some(2), &Options::new()).await.unwrap_err();
    assert!(err.is_not_supported());
    let err = root.delete_tree(&Options::new()).await.unwrap_err();
    assert!(err.is_not_supported());
    assert!(service.transport.requests().is_empty());
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn create_document_from_string_posts_inline_content() {
    let service = TestService::new().await;
    service
        .transport
        .respond(Method::Post, "http://h/atom/children?id=root", 201, doc_entry(""));

    let root = service.repo.get_root_folder().await.unwrap();
    let doc = root
        .create_document_from_string("note.txt", Properties::new(), "hello", None)
        .await
        .unwrap();
    assert_eq!(doc.name(), Some("note.txt"));

    let post = service.transport.last_request().unwrap();
    assert_eq!(post.method, Method::Post);
    let body = post.body_text();
    assert!(body.contains("<cmisra:mediatype>text/plain</cmisra:mediatype>"));
    assert!(body.contains("<cmisra:base64>aGVsbG8=</cmisra:base64>"));
    assert!(body.contains("cmis:document"));
}

#[tokio::test]
async fn checkout_then_cancel() {
    let service = TestService::new().await;
    let actions = "<cmis:allowableActions><cmis:canCheckOut>true</cmis:canCheckOut></cmis:allowableActions>";
    service
        .transport
        .respond(Method::Get, "http://h/atom/id?id=doc-1", 200, doc_entry(actions));
    let pwc_entry = entry_body("pwc-1", "cmis:document", "note.txt", "", "").replace(
        "</cmis:properties>",
        r#"<cmis:propertyBoolean propertyDefinitionId="cmis:isPrivateWorkingCopy"><cmis:value>true</cmis:value></cmis:propertyBoolean></cmis:properties>"#,
    );
    service
        .transport
        .respond(Method::Post, "http://h/atom/checkedout", 201, pwc_entry);
    service
        .transport
        .respond(Method::Delete, "http://h/atom/entry?id=pwc-1", 204, "");

    let mut doc = service
        .repo
        .get_object("doc-1", &Options::new())
        .await
        .unwrap()
        .into_document()
        .unwrap();
    let mut pwc = doc.checkout().await.unwrap();
    assert!(pwc.is_private_working_copy());
    assert_eq!(pwc.object_id().map(|id| id.as_str()), Some("pwc-1"));

    pwc.cancel_checkout().await.unwrap();
    let delete = service.transport.last_request().unwrap();
    assert_eq!(delete.method, Method::Delete);
    assert_eq!(delete.url, "http://h/atom/entry?id=pwc-1");
}

#[tokio::test]
async fn checkout_refused_without_allowable_action() {
    let service = TestService::new().await;
    let actions = "<cmis:allowableActions><cmis:canCheckOut>false</cmis:canCheckOut></cmis:allowableActions>";
    service
        .transport
        .respond(Method::Get, "http://h/atom/id?id=doc-1", 200, doc_entry(actions));

    let mut doc = service
        .repo
        .get_object("doc-1", &Options::new())
        .await
        .unwrap()
        .into_document()
        .unwrap();
    let err = doc.checkout().await.unwrap_err();
    assert!(err.is_not_supported());
    assert!(service.transport.requests_with(Method::Post).is_empty());
}

#[tokio::test]
async fn apply_acl_puts_direct_entries() {
    let service = TestService::new().await;
    service.transport.respond(
        Method::Put,
        "http://h/atom/acl?id=doc-1",
        200,
        r#"<cmis:acl xmlns:cmis="http://docs.oasis-open.org/ns/cmis/core/200908/">
  <cmis:permission>
    <cmis:principal><cmis:principalId>jdoe</cmis:principalId></cmis:principal>
    <cmis:permission>cmis:write</cmis:permission>
    <cmis:direct>true</cmis:direct>
  </cmis:permission>
</cmis:acl>"#,
    );

    let mut doc = service.repo.get_object("doc-1", &Options::new()).await.unwrap();
    let mut acl = Acl::new();
    acl.add_entry("jdoe", ["cmis:write"], true);
    let applied = doc.object_mut().apply_acl(&acl).await.unwrap();
    assert_eq!(applied.get("jdoe").unwrap().permissions, vec!["cmis:write"]);

    let put = service.transport.last_request().unwrap();
    assert_eq!(put.header("Content-Type"), Some("application/cmisacl+xml"));
    assert!(put.body_text().contains("<cmis:principalId>jdoe</cmis:principalId>"));
}

#[tokio::test]
async fn update_properties_sends_change_token_and_takes_new_state() {
    let service = TestService::new().await;
    let renamed = entry_body(
        "doc-1",
        "cmis:document",
        "renamed.txt",
        r#"<link rel="http://docs.oasis-open.org/ns/cmis/link/200908/acl" href="http://h/atom/acl?id=doc-1"/>"#,
        "",
    );
    service
        .transport
        .respond(Method::Put, "http://h/atom/entry?id=doc-1", 200, renamed);

    let mut doc = service.repo.get_object("doc-1", &Options::new()).await.unwrap();
    assert_eq!(doc.object().name(), Some("note.txt"));
    doc.object_mut()
        .update_properties(&Properties::new().with("cmis:name", "renamed.txt"))
        .await
        .unwrap();
    assert_eq!(doc.object().name(), Some("renamed.txt"));

    let put = service.transport.last_request().unwrap();
    assert_eq!(put.method, Method::Put);
    assert_eq!(put.url, "http://h/atom/entry?id=doc-1&changeToken=tok-doc-1");
    assert!(put.body_text().contains("renamed.txt"));
}

// =============================================================================
// Versioning and identity
// =============================================================================

fn pwc_entry() -> String {
    entry_body("pwc-1", "cmis:document", "note.txt", "", "").replace(
        "</cmis:properties>",
        r#"<cmis:propertyBoolean propertyDefinitionId="cmis:isPrivateWorkingCopy"><cmis:value>true</cmis:value></cmis:propertyBoolean></cmis:properties>"#,
    )
}

#[tokio::test]
async fn checkin_returns_the_new_version() {
    let service = TestService::new().await;
    let version = entry_body("doc-2", "cmis:document", "note.txt", "", "");
    service
        .transport
        .respond(Method::Get, "http://h/atom/id?id=pwc-1", 200, pwc_entry());
    service
        .transport
        .respond(Method::Put, "http://h/atom/entry?id=pwc-1", 200, version.clone());
    service
        .transport
        .respond(Method::Get, "http://h/atom/id?id=doc-2", 200, version);

    let pwc = service
        .repo
        .get_object("pwc-1", &Options::new())
        .await
        .unwrap()
        .into_document()
        .unwrap();
    assert!(pwc.is_private_working_copy());

    let released = pwc
        .checkin(Some("second draft"), true, &Options::new())
        .await
        .unwrap();
    assert_eq!(released.object_id().map(|id| id.as_str()), Some("doc-2"));
    assert!(!released.is_private_working_copy());

    let puts = service.transport.requests_with(Method::Put);
    assert_eq!(puts.len(), 1);
    assert_eq!(
        puts[0].url,
        "http://h/atom/entry?id=pwc-1&checkin=true&checkinComment=second+draft&major=true"
    );
    // the new version is reloaded, not the consumed working copy
    let last = service.transport.last_request().unwrap();
    assert_eq!(last.method, Method::Get);
    assert!(last.url.starts_with("http://h/atom/id?id=doc-2"));
}

#[tokio::test]
async fn minor_checkin_sends_major_false() {
    let service = TestService::new().await;
    let version = entry_body("doc-2", "cmis:document", "note.txt", "", "");
    service
        .transport
        .respond(Method::Get, "http://h/atom/id?id=pwc-1", 200, pwc_entry());
    service
        .transport
        .respond(Method::Put, "http://h/atom/entry?id=pwc-1", 200, version.clone());
    service
        .transport
        .respond(Method::Get, "http://h/atom/id?id=doc-2", 200, version);

    let pwc = service
        .repo
        .get_object("pwc-1", &Options::new())
        .await
        .unwrap()
        .into_document()
        .unwrap();
    pwc.checkin(None, false, &Options::new()).await.unwrap();

    let put = &service.transport.requests_with(Method::Put)[0];
    assert_eq!(put.url, "http://h/atom/entry?id=pwc-1&checkin=true&major=false");
}

#[tokio::test]
async fn latest_version_lookup_sends_return_version() {
    let service = TestService::new().await;
    service.transport.respond(
        Method::Get,
        "http://h/atom/id?id=doc-1&filter=&includeAllowableActions=false&returnVersion=latest",
        200,
        entry_body("doc-3", "cmis:document", "note.txt", "", ""),
    );

    let doc = service
        .repo
        .get_object("doc-1", &Options::new())
        .await
        .unwrap()
        .into_document()
        .unwrap();
    let latest = doc.get_latest_version(false).await.unwrap();
    assert_eq!(latest.object_id().map(|id| id.as_str()), Some("doc-3"));
    assert!(service
        .transport
        .last_request()
        .unwrap()
        .url
        .ends_with("&returnVersion=latest"));
}

#[tokio::test]
async fn reload_with_return_version_moves_to_the_returned_id() {
    let service = TestService::new().await;
    let latest = entry_body("doc-3", "cmis:document", "note.txt", "", "");
    service.transport.respond(
        Method::Get,
        "http://h/atom/id?id=doc-1&filter=&includeAllowableActions=false&returnVersion=latestmajor",
        200,
        latest.clone(),
    );
    service
        .transport
        .respond(Method::Get, "http://h/atom/id?id=doc-3", 200, latest);

    let mut doc = service.repo.get_object("doc-1", &Options::new()).await.unwrap();
    doc.object_mut()
        .reload_with(&Options::new().return_version(ReturnVersion::LatestMajor))
        .await
        .unwrap();
    assert_eq!(
        doc.object().object_id().map(|id| id.as_str()),
        Some("doc-3")
    );

    // returnVersion is not kept for later reloads
    doc.object_mut().reload().await.unwrap();
    assert_eq!(
        service.transport.last_request().unwrap().url,
        "http://h/atom/id?id=doc-3&filter=&includeAllowableActions=false"
    );
}

#[tokio::test]
async fn path_and_id_lookups_agree() {
    let service = TestService::new().await;
    service
        .transport
        .respond(Method::Get, "http://h/atom/path", 200, doc_entry(""));

    let by_path = service
        .repo
        .get_object_by_path("/note.txt", &Options::new())
        .await
        .unwrap();
    let by_id = service.repo.get_object("doc-1", &Options::new()).await.unwrap();
    assert_eq!(by_path.object().object_id(), by_id.object().object_id());
    assert!(by_path.object().object_id().is_some());

    let requests = service.transport.requests();
    assert_eq!(requests[0].url, "http://h/atom/path?path=/note.txt&filter=");
}
