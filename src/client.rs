//! client
//!
//! Entry point: connects to a CMIS service URL and hands out
//! [`Repository`] handles.
//!
//! # Example
//!
//! ```ignore
//! use cmisclient::CmisClient;
//!
//! let client = CmisClient::new("http://localhost:8080/cmis/atom", "admin", "admin")?;
//! let repo = client.get_default_repository().await?;
//! let root = repo.get_root_folder().await?;
//! for child in root.get_children(&Default::default()).await? {
//!     println!("{}", child.object().name().unwrap_or("?"));
//! }
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::binding::{create_binding, Binding, BindingKind, RepositoryData};
use crate::config::ClientConfig;
use crate::error::{CmisError, Result};
use crate::repository::Repository;
use crate::transport::{Credentials, HttpOptions, ReqwestTransport, Transport};

/// Id and name of a repository advertised by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositorySummary {
    pub id: String,
    pub name: Option<String>,
}

/// A connection to one CMIS service endpoint.
#[derive(Clone)]
pub struct CmisClient {
    service_url: String,
    binding: Arc<dyn Binding>,
}

impl std::fmt::Debug for CmisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmisClient")
            .field("service_url", &self.service_url)
            .field("binding", &self.binding.kind())
            .finish()
    }
}

impl CmisClient {
    /// Connect with basic credentials over the default HTTP transport.
    ///
    /// The binding is detected from the URL path.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the binding cannot be detected, `Connection`
    /// when the HTTP client cannot be built.
    pub fn new(service_url: &str, username: &str, password: &str) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(HttpOptions::default())?);
        Self::with_transport(
            service_url,
            transport,
            Some(Credentials::new(username, password)),
            None,
        )
    }

    /// Connect over a caller-supplied transport.
    ///
    /// `binding` names the wire binding (`atompub` or `browser`); `None`
    /// detects it from the URL.
    pub fn with_transport(
        service_url: &str,
        transport: Arc<dyn Transport>,
        credentials: Option<Credentials>,
        binding: Option<&str>,
    ) -> Result<Self> {
        let binding = create_binding(service_url, transport, credentials, binding)?;
        debug!(url = service_url, binding = %binding.kind(), "created client");
        Ok(Self {
            service_url: service_url.to_string(),
            binding,
        })
    }

    /// Build a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the configuration does not validate.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| CmisError::InvalidArgument(e.to_string()))?;
        let transport = Arc::new(ReqwestTransport::new(HttpOptions {
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        })?);
        Self::with_transport(
            config.url(),
            transport,
            config.credentials(),
            config.binding.as_deref(),
        )
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub fn binding_kind(&self) -> BindingKind {
        self.binding.kind()
    }

    async fn discover(&self) -> Result<Vec<RepositoryData>> {
        let repositories = self.binding.get_repositories().await?;
        info!(count = repositories.len(), url = %self.service_url, "discovered repositories");
        Ok(repositories)
    }

    /// Id and name of every repository the service advertises.
    pub async fn get_repositories(&self) -> Result<Vec<RepositorySummary>> {
        Ok(self
            .discover()
            .await?
            .iter()
            .map(|data| RepositorySummary {
                id: data.id().to_string(),
                name: data.info.name().map(str::to_string),
            })
            .collect())
    }

    /// The repository with `repository_id`.
    ///
    /// # Errors
    ///
    /// `ObjectNotFound` when the service does not advertise it.
    pub async fn get_repository(&self, repository_id: &str) -> Result<Repository> {
        self.discover()
            .await?
            .into_iter()
            .find(|data| data.id() == repository_id)
            .map(|data| Repository::new(Arc::clone(&self.binding), data))
            .ok_or_else(|| {
                CmisError::ObjectNotFound(format!(
                    "repository '{}' is not advertised by {}",
                    repository_id, self.service_url
                ))
            })
    }

    /// The first repository the service advertises.
    ///
    /// # Errors
    ///
    /// `ObjectNotFound` when the service advertises none.
    pub async fn get_default_repository(&self) -> Result<Repository> {
        self.discover()
            .await?
            .into_iter()
            .next()
            .map(|data| Repository::new(Arc::clone(&self.binding), data))
            .ok_or_else(|| {
                CmisError::ObjectNotFound(format!("{} advertises no repositories", self.service_url))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use crate::transport::Method;

    const URL: &str = "http://h/cmis/browser";

    fn client(transport: &MockTransport) -> CmisClient {
        CmisClient::with_transport(URL, Arc::new(transport.clone()), None, None).unwrap()
    }

    fn service_body() -> String {
        serde_json::json!({
            "A1": {"repositoryId": "A1", "repositoryName": "Main", "rootFolderId": "100",
                   "repositoryUrl": "http://h/cmis/browser/A1", "rootFolderUrl": "http://h/cmis/browser/A1/root"},
            "B2": {"repositoryId": "B2", "rootFolderId": "200",
                   "repositoryUrl": "http://h/cmis/browser/B2", "rootFolderUrl": "http://h/cmis/browser/B2/root"}
        })
        .to_string()
    }

    #[test]
    fn binding_detected_from_url() {
        let transport = MockTransport::new();
        assert_eq!(client(&transport).binding_kind(), BindingKind::Browser);
        let err = CmisClient::with_transport("http://h/cmis", Arc::new(transport), None, None)
            .unwrap_err();
        assert!(matches!(err, CmisError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn summaries() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, URL, 200, service_body());
        let repos = client(&transport).get_repositories().await.unwrap();
        assert_eq!(
            repos,
            vec![
                RepositorySummary { id: "A1".into(), name: Some("Main".into()) },
                RepositorySummary { id: "B2".into(), name: None },
            ]
        );
    }

    #[tokio::test]
    async fn repository_by_id_and_default() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, URL, 200, service_body());
        let client = client(&transport);

        assert_eq!(client.get_repository("B2").await.unwrap().id(), "B2");
        assert_eq!(client.get_default_repository().await.unwrap().id(), "A1");
        let err = client.get_repository("nope").await.unwrap_err();
        assert!(matches!(err, CmisError::ObjectNotFound(_)));
    }

    #[tokio::test]
    async fn empty_service_has_no_default() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, URL, 200, "{}");
        let err = client(&transport).get_default_repository().await.unwrap_err();
        assert!(matches!(err, CmisError::ObjectNotFound(_)));
    }
}
