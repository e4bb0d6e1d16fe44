//! transport::mock
//!
//! In-memory transport for deterministic tests.
//!
//! # Design
//!
//! Responses are registered per method and URL prefix. When several routes
//! match a request, the longest prefix wins. A route holding more than one
//! response hands them out in order and keeps repeating the last one, which
//! lets a test script "before" and "after" states of the same resource.
//! Requests with no matching route receive a 404.
//!
//! # Example
//!
//! ```
//! use cmisclient::transport::mock::MockTransport;
//! use cmisclient::transport::{Method, Transport};
//!
//! # tokio_test::block_on(async {
//! let transport = MockTransport::new();
//! transport.respond(Method::Get, "http://cmis/obj?id=a", 200, "first");
//! transport.respond(Method::Get, "http://cmis/obj?id=a", 200, "second");
//!
//! let r1 = transport.get("http://cmis/obj?id=a&filter=", vec![]).await.unwrap();
//! let r2 = transport.get("http://cmis/obj?id=a&filter=", vec![]).await.unwrap();
//! let r3 = transport.get("http://cmis/obj?id=a&filter=", vec![]).await.unwrap();
//! assert_eq!(r1.body, b"first");
//! assert_eq!(r2.body, b"second");
//! assert_eq!(r3.body, b"second");
//! assert_eq!(transport.requests().len(), 3);
//! # });
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{HttpRequest, HttpResponse, Method, Transport};
use crate::error::{CmisError, Result};

/// Mock transport for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    routes: Vec<Route>,
    fail_on: Option<FailOn>,
    requests: Vec<RecordedRequest>,
}

#[derive(Debug)]
struct Route {
    method: Method,
    prefix: String,
    responses: VecDeque<HttpResponse>,
}

/// Configuration for which request should fail at the connection level.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Every request fails with the given error.
    Any(CmisError),
    /// Requests whose URL starts with the prefix fail.
    Url(String, CmisError),
}

/// A request seen by the mock, kept for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub username: Option<String>,
}

impl RecordedRequest {
    /// Body decoded as UTF-8 (lossy), empty when absent.
    pub fn body_text(&self) -> String {
        self.body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl MockTransport {
    /// Create an empty mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for requests matching `method` and `url_prefix`.
    pub fn respond(
        &self,
        method: Method,
        url_prefix: impl Into<String>,
        status: u16,
        body: impl Into<Vec<u8>>,
    ) {
        self.respond_with(method, url_prefix, HttpResponse::new(status, body));
    }

    /// Queue a fully built response.
    pub fn respond_with(&self, method: Method, url_prefix: impl Into<String>, response: HttpResponse) {
        let prefix = url_prefix.into();
        let mut inner = self.state();
        if let Some(route) = inner
            .routes
            .iter_mut()
            .find(|r| r.method == method && r.prefix == prefix)
        {
            route.responses.push_back(response);
            return;
        }
        inner.routes.push(Route {
            method,
            prefix,
            responses: VecDeque::from(vec![response]),
        });
    }

    /// Configure the mock to fail.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.state();
            inner.fail_on = Some(fail_on);
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.state();
        inner.fail_on = None;
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        let inner = self.state();
        inner.requests.clone()
    }

    /// Recorded requests with the given method.
    pub fn requests_with(&self, method: Method) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        let inner = self.state();
        inner.requests.last().cloned()
    }

    /// Clear recorded requests.
    pub fn clear_requests(&self) {
        let mut inner = self.state();
        inner.requests.clear();
    }

    fn state(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_fail(inner: &MockTransportInner, url: &str) -> Result<()> {
        match &inner.fail_on {
            Some(FailOn::Any(err)) => Err(err.clone()),
            Some(FailOn::Url(prefix, err)) if url.starts_with(prefix.as_str()) => Err(err.clone()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut inner = self.state();
        inner.requests.push(RecordedRequest {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
            username: request.credentials.as_ref().map(|c| c.username.clone()),
        });

        Self::check_fail(&inner, &request.url)?;

        let route = inner
            .routes
            .iter_mut()
            .filter(|r| r.method == request.method && request.url.starts_with(r.prefix.as_str()))
            .max_by_key(|r| r.prefix.len());

        let response = match route {
            Some(route) if route.responses.len() > 1 => route.responses.pop_front(),
            Some(route) => route.responses.front().cloned(),
            None => None,
        };

        Ok(response.unwrap_or_else(|| {
            HttpResponse::new(404, format!("no mock route for {} {}", request.method, request.url))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Credentials;

    #[tokio::test]
    async fn longest_prefix_wins() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "http://h/a", 200, "short");
        transport.respond(Method::Get, "http://h/a/b", 200, "long");

        let r = transport.get("http://h/a/b/c", vec![]).await.unwrap();
        assert_eq!(r.body, b"long");
        let r = transport.get("http://h/a/x", vec![]).await.unwrap();
        assert_eq!(r.body, b"short");
    }

    #[tokio::test]
    async fn method_must_match() {
        let transport = MockTransport::new();
        transport.respond(Method::Post, "http://h/", 201, "created");

        let r = transport.get("http://h/", vec![]).await.unwrap();
        assert_eq!(r.status, 404);
    }

    #[tokio::test]
    async fn records_credentials_username_only() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "http://h/", 200, "");
        transport
            .execute(
                HttpRequest::new(Method::Get, "http://h/").with_credentials(Credentials::new("u", "p")),
            )
            .await
            .unwrap();

        let req = transport.last_request().unwrap();
        assert_eq!(req.username.as_deref(), Some("u"));
    }

    #[tokio::test]
    async fn fail_on_url_prefix() {
        let transport = MockTransport::new()
            .fail_on(FailOn::Url("http://down/".into(), CmisError::Connection("refused".into())));
        transport.respond(Method::Get, "http://up/", 200, "ok");

        assert!(transport.get("http://up/", vec![]).await.is_ok());
        assert!(matches!(
            transport.get("http://down/x", vec![]).await,
            Err(CmisError::Connection(_))
        ));

        transport.clear_fail_on();
        assert_eq!(transport.get("http://down/x", vec![]).await.unwrap().status, 404);
    }

    #[tokio::test]
    async fn clear_requests() {
        let transport = MockTransport::new();
        transport.get("http://h/", vec![]).await.unwrap();
        assert_eq!(transport.requests().len(), 1);
        transport.clear_requests();
        assert!(transport.requests().is_empty());
    }
}
