//! transport
//!
//! Raw HTTP exchange used by both bindings.
//!
//! # Architecture
//!
//! The [`Transport`] trait is the lowest seam in the client. It moves bytes
//! and reports status codes; it knows nothing about CMIS, XML, or JSON.
//! Status interpretation happens one layer up, in the binding's REST helper.
//!
//! # Modules
//!
//! - [`http`] - `reqwest`-backed implementation
//! - [`mock`] - In-memory implementation for deterministic tests
//! - [`multipart`] - `multipart/form-data` body encoder for content uploads
//!
//! # Example
//!
//! ```ignore
//! use cmisclient::transport::{Credentials, HttpRequest, Method, Transport};
//! use cmisclient::transport::http::ReqwestTransport;
//!
//! let transport = ReqwestTransport::new(Default::default())?;
//! let response = transport
//!     .execute(HttpRequest::new(Method::Get, "http://localhost:8080/cmis/atom")
//!         .with_credentials(Credentials::new("admin", "admin")))
//!     .await?;
//! assert_eq!(response.status, 200);
//! ```

pub mod http;
pub mod mock;
pub mod multipart;

pub use http::{HttpOptions, ReqwestTransport};
pub use mock::MockTransport;

use async_trait::async_trait;

use crate::error::Result;

/// HTTP methods used by the CMIS bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Upper-case method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Basic-auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Custom Debug to avoid exposing the password
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// An outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL including the query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub credentials: Option<Credentials>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            credentials: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the `Content-Type` header and body together.
    pub fn with_content(self, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        self.with_header("Content-Type", content_type).with_body(body)
    }
}

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The HTTP primitive the bindings are built on.
///
/// Implementations return `Ok` for every completed exchange, including
/// 4xx and 5xx responses. `Err` is reserved for exchanges that could not
/// complete, reported as [`CmisError::Connection`].
///
/// [`CmisError::Connection`]: crate::error::CmisError::Connection
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Perform one request.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    async fn get(&self, url: &str, headers: Vec<(String, String)>) -> Result<HttpResponse> {
        let mut request = HttpRequest::new(Method::Get, url);
        request.headers = headers;
        self.execute(request).await
    }

    async fn post(
        &self,
        url: &str,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Result<HttpResponse> {
        let mut request = HttpRequest::new(Method::Post, url).with_body(body);
        request.headers = headers;
        self.execute(request).await
    }

    async fn put(
        &self,
        url: &str,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Result<HttpResponse> {
        let mut request = HttpRequest::new(Method::Put, url).with_body(body);
        request.headers = headers;
        self.execute(request).await
    }

    async fn delete(&self, url: &str, headers: Vec<(String, String)>) -> Result<HttpResponse> {
        let mut request = HttpRequest::new(Method::Delete, url);
        request.headers = headers;
        self.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials::new("admin", "s3cret");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn response_header_lookup_ignores_case() {
        let response = HttpResponse::new(200, "").with_header("Content-Type", "text/plain");
        assert_eq!(response.header("content-type"), Some("text/plain"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(201, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }

    #[test]
    fn with_content_sets_header_and_body() {
        let req = HttpRequest::new(Method::Post, "http://x/").with_content("text/plain", b"hi".to_vec());
        assert_eq!(req.headers, vec![("Content-Type".to_string(), "text/plain".to_string())]);
        assert_eq!(req.body.as_deref(), Some(&b"hi"[..]));
    }
}
