//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! Each handler takes an open [`Repository`] (or the client) and a writer,
//! so output can be captured in tests.

use std::io::Write;

use anyhow::{Context, Result};

use crate::cli::Command;
use crate::client::CmisClient;
use crate::config::ClientConfig;
use crate::model::{Options, SpecializedObject};
use crate::repository::Repository;

/// Dispatch a command against the configured service.
pub async fn dispatch(command: Command, config: &ClientConfig) -> Result<()> {
    let client = CmisClient::from_config(config)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Command::Repos = command {
        return repos(&client, &mut out).await;
    }

    let repo = open_repository(&client, config.repository_id.as_deref()).await?;
    match command {
        Command::Repos => Ok(()),
        Command::Info => info(&repo, &mut out).await,
        Command::Caps => caps(&repo, &mut out).await,
        Command::Ls { path, max_items } => ls(&repo, &path, max_items, &mut out).await,
        Command::Cat { path } => cat(&repo, &path, &mut out).await,
        Command::Query {
            statement,
            max_items,
        } => query(&repo, &statement, max_items, &mut out).await,
        Command::Types { type_id } => types(&repo, type_id.as_deref(), &mut out).await,
        Command::Versions { path } => versions(&repo, &path, &mut out).await,
    }
}

async fn open_repository(client: &CmisClient, repository_id: Option<&str>) -> Result<Repository> {
    let repo = match repository_id {
        Some(id) => client.get_repository(id).await,
        None => client.get_default_repository().await,
    };
    repo.with_context(|| format!("cannot open a repository at {}", client.service_url()))
}

fn listing_options(max_items: Option<u32>) -> Options {
    match max_items {
        Some(n) => Options::new().max_items(n),
        None => Options::new(),
    }
}

/// One listing line: a type marker, the name and the id.
fn object_line(object: &SpecializedObject) -> String {
    let object = object.object();
    let marker = match object.base_type().map(|b| b.as_str()) {
        Some("cmis:folder") => 'd',
        Some("cmis:relationship") => 'r',
        Some("cmis:policy") => 'p',
        _ => '-',
    };
    format!(
        "{} {}\t{}",
        marker,
        object.name().unwrap_or("?"),
        object.object_id().map(|id| id.as_str()).unwrap_or("")
    )
}

pub async fn repos(client: &CmisClient, out: &mut impl Write) -> Result<()> {
    for repo in client.get_repositories().await? {
        writeln!(out, "{}\t{}", repo.id, repo.name.as_deref().unwrap_or(""))?;
    }
    Ok(())
}

pub async fn info(repo: &Repository, out: &mut impl Write) -> Result<()> {
    for (key, value) in repo.get_repository_info().await?.iter() {
        writeln!(out, "{}: {}", key, value.unwrap_or(""))?;
    }
    Ok(())
}

pub async fn caps(repo: &Repository, out: &mut impl Write) -> Result<()> {
    for (name, value) in repo.get_capabilities().await?.iter() {
        writeln!(out, "{}: {}", name, value)?;
    }
    Ok(())
}

pub async fn ls(
    repo: &Repository,
    path: &str,
    max_items: Option<u32>,
    out: &mut impl Write,
) -> Result<()> {
    let folder = repo
        .get_object_by_path(path, &Options::new())
        .await?
        .into_folder()
        .with_context(|| format!("'{}' is not a folder", path))?;
    let mut children = folder.get_children(&listing_options(max_items)).await?;
    for child in children.results() {
        writeln!(out, "{}", object_line(child))?;
    }
    if children.has_next() {
        writeln!(out, "(more items)")?;
    }
    Ok(())
}

pub async fn cat(repo: &Repository, path: &str, out: &mut impl Write) -> Result<()> {
    let document = repo
        .get_object_by_path(path, &Options::new())
        .await?
        .into_document()
        .with_context(|| format!("'{}' is not a document", path))?;
    let content = document.get_content_stream().await?;
    out.write_all(&content.data)?;
    Ok(())
}

pub async fn query(
    repo: &Repository,
    statement: &str,
    max_items: Option<u32>,
    out: &mut impl Write,
) -> Result<()> {
    let mut results = repo.query(statement, &listing_options(max_items)).await?;
    for result in results.results() {
        let pairs: Vec<String> = result
            .object()
            .properties()
            .iter()
            .map(|(id, value)| format!("{}={}", id, value.to_wire_strings().join(",")))
            .collect();
        writeln!(out, "{}", pairs.join("  "))?;
    }
    Ok(())
}

pub async fn types(repo: &Repository, type_id: Option<&str>, out: &mut impl Write) -> Result<()> {
    let types = match type_id {
        Some(id) => repo.get_type_children(Some(id)).await?,
        None => repo.get_type_definitions().await?,
    };
    for object_type in &types {
        writeln!(
            out,
            "{}\t{}",
            object_type.id(),
            object_type.display_name().unwrap_or("")
        )?;
    }
    Ok(())
}

pub async fn versions(repo: &Repository, path: &str, out: &mut impl Write) -> Result<()> {
    let document = repo
        .get_object_by_path(path, &Options::new())
        .await?
        .into_document()
        .with_context(|| format!("'{}' is not a document", path))?;
    for version in document.get_all_versions(&Options::new()).await? {
        let props = version.object().properties();
        writeln!(
            out,
            "{}\t{}\t{}",
            props.get_str("cmis:versionLabel").unwrap_or("-"),
            props.get_str("cmis:name").unwrap_or("?"),
            version.object().object_id().map(|id| id.as_str()).unwrap_or("")
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use crate::transport::Method;
    use serde_json::json;
    use std::sync::Arc;

    const URL: &str = "http://h/cmis/browser";
    const ROOT: &str = "http://h/cmis/browser/A1/root";

    fn prop(id: &str, kind: &str, value: &str) -> serde_json::Value {
        json!({"id": id, "type": kind, "value": value})
    }

    fn object(id: &str, base: &str, name: &str) -> serde_json::Value {
        json!({"properties": {
            "cmis:objectId": prop("cmis:objectId", "id", id),
            "cmis:baseTypeId": prop("cmis:baseTypeId", "id", base),
            "cmis:name": prop("cmis:name", "string", name),
        }})
    }

    async fn setup() -> (MockTransport, CmisClient, Repository) {
        let transport = MockTransport::new();
        transport.respond(
            Method::Get,
            URL,
            200,
            json!({"A1": {"repositoryId": "A1", "repositoryName": "Main", "rootFolderId": "100",
                          "repositoryUrl": "http://h/cmis/browser/A1", "rootFolderUrl": ROOT,
                          "capabilities": {"capabilityQuery": "bothcombined"}}})
            .to_string(),
        );
        let client = CmisClient::with_transport(URL, Arc::new(transport.clone()), None, None).unwrap();
        let repo = client.get_default_repository().await.unwrap();
        (transport, client, repo)
    }

    fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn repos_lists_ids_and_names() {
        let (_transport, client, _repo) = setup().await;
        let mut out = Vec::new();
        repos(&client, &mut out).await.unwrap();
        assert_eq!(text(out), "A1\tMain\n");
    }

    #[tokio::test]
    async fn info_and_caps() {
        let (_transport, _client, repo) = setup().await;
        let mut out = Vec::new();
        info(&repo, &mut out).await.unwrap();
        assert!(text(out).contains("repositoryName: Main"));

        let mut out = Vec::new();
        caps(&repo, &mut out).await.unwrap();
        assert_eq!(text(out), "Query: bothcombined\n");
    }

    #[tokio::test]
    async fn ls_marks_folders() {
        let (transport, _client, repo) = setup().await;
        transport.respond(
            Method::Get,
            format!("{}/Sites?cmisselector=object", ROOT),
            200,
            object("f1", "cmis:folder", "Sites").to_string(),
        );
        transport.respond(
            Method::Get,
            format!("{}?objectId=f1&cmisselector=children", ROOT),
            200,
            json!({"objects": [
                {"object": object("f2", "cmis:folder", "Team")},
                {"object": object("d1", "cmis:document", "a.txt")}
            ], "hasMoreItems": false, "numItems": 2})
            .to_string(),
        );

        let mut out = Vec::new();
        ls(&repo, "/Sites", None, &mut out).await.unwrap();
        assert_eq!(text(out), "d Team\tf2\n- a.txt\td1\n");
    }

    #[tokio::test]
    async fn ls_rejects_documents() {
        let (transport, _client, repo) = setup().await;
        transport.respond(
            Method::Get,
            format!("{}/a.txt?cmisselector=object", ROOT),
            200,
            object("d1", "cmis:document", "a.txt").to_string(),
        );
        let err = ls(&repo, "/a.txt", None, &mut Vec::new()).await.unwrap_err();
        assert!(err.to_string().contains("not a folder"));
    }

    #[tokio::test]
    async fn cat_writes_content() {
        let (transport, _client, repo) = setup().await;
        transport.respond(
            Method::Get,
            format!("{}/a.txt?cmisselector=object", ROOT),
            200,
            object("d1", "cmis:document", "a.txt").to_string(),
        );
        transport.respond(
            Method::Get,
            format!("{}?objectId=d1&cmisselector=content", ROOT),
            200,
            "file body",
        );
        let mut out = Vec::new();
        cat(&repo, "/a.txt", &mut out).await.unwrap();
        assert_eq!(text(out), "file body");
    }
}
