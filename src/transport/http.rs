//! transport::http
//!
//! [`Transport`] implementation on top of `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client;
use tracing::debug;

use super::{HttpRequest, HttpResponse, Method, Transport};
use crate::error::{CmisError, Result};

/// Default User-Agent header value.
const USER_AGENT_VALUE: &str = concat!("cmisclient/", env!("CARGO_PKG_VERSION"));

/// Options for building a [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Overrides the default User-Agent.
    pub user_agent: Option<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
        }
    }
}

/// `reqwest`-backed HTTP transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with the given options.
    ///
    /// # Errors
    ///
    /// Returns `CmisError::Connection` if the TLS backend cannot be initialized.
    pub fn new(options: HttpOptions) -> Result<Self> {
        let user_agent = options
            .user_agent
            .unwrap_or_else(|| USER_AGENT_VALUE.to_string());
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| CmisError::Connection(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn headers(request: &HttpRequest) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| CmisError::InvalidArgument(format!("bad header name: {}", e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| CmisError::InvalidArgument(format!("bad header value: {}", e)))?;
            headers.insert(name, value);
        }
        if !headers.contains_key(USER_AGENT) {
            headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        }
        Ok(headers)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let headers = Self::headers(&request)?;
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
            Method::Put => self.client.put(&request.url),
            Method::Delete => self.client.delete(&request.url),
        }
        .headers(headers);

        if let Some(creds) = &request.credentials {
            builder = builder.basic_auth(&creds.username, Some(&creds.password));
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        debug!(method = %request.method, url = %request.url, "sending request");
        let response = builder
            .send()
            .await
            .map_err(|e| CmisError::Connection(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| CmisError::Connection(e.to_string()))?
            .to_vec();
        debug!(status, bytes = body.len(), "received response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
