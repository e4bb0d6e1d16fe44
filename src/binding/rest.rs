//! binding::rest
//!
//! HTTP helper shared by both bindings. This is the one place where a
//! response status becomes a [`CmisError`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{CmisError, Result};
use crate::model::Options;
use crate::transport::{Credentials, HttpRequest, HttpResponse, Method, Transport};

#[derive(Debug, Clone)]
pub(crate) struct RestClient {
    transport: Arc<dyn Transport>,
    credentials: Option<Credentials>,
}

impl RestClient {
    pub fn new(transport: Arc<dyn Transport>, credentials: Option<Credentials>) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    /// GET `url` with `options` appended as query parameters.
    pub async fn get(&self, url: &str, options: &Options) -> Result<HttpResponse> {
        let url = options.append_to(url);
        self.send(HttpRequest::new(Method::Get, url)).await
    }

    pub async fn post(
        &self,
        url: &str,
        options: &Options,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<HttpResponse> {
        let url = options.append_to(url);
        self.send(HttpRequest::new(Method::Post, url).with_content(content_type, body))
            .await
    }

    pub async fn put(
        &self,
        url: &str,
        options: &Options,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<HttpResponse> {
        let url = options.append_to(url);
        self.send(HttpRequest::new(Method::Put, url).with_content(content_type, body))
            .await
    }

    pub async fn delete(&self, url: &str, options: &Options) -> Result<()> {
        let url = options.append_to(url);
        self.send(HttpRequest::new(Method::Delete, url)).await?;
        Ok(())
    }

    async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        if let Some(credentials) = &self.credentials {
            request = request.with_credentials(credentials.clone());
        }
        let method = request.method;
        let url = request.url.clone();
        debug!(%method, %url, "cmis request");

        let response = self.transport.execute(request).await?;
        check_status(method, &url, response)
    }
}

/// Pass 2xx responses through and translate everything else.
pub(crate) fn check_status(method: Method, url: &str, response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }
    warn!(%method, url, status = response.status, "cmis request failed");
    Err(CmisError::from_status(response.status, &response.body))
}

/// The response body, or `None` when the server sent nothing.
pub(crate) fn non_empty_body(response: HttpResponse) -> Option<Vec<u8>> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    fn client(transport: &MockTransport) -> RestClient {
        RestClient::new(
            Arc::new(transport.clone()),
            Some(Credentials::new("admin", "admin")),
        )
    }

    #[tokio::test]
    async fn get_appends_options_and_credentials() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "http://h/obj", 200, "ok");

        let opts = Options::new().max_items(3);
        let response = client(&transport).get("http://h/obj?id=1", &opts).await.unwrap();
        assert_eq!(response.body, b"ok");

        let recorded = transport.last_request().unwrap();
        assert_eq!(recorded.url, "http://h/obj?id=1&maxItems=3");
        assert_eq!(recorded.username.as_deref(), Some("admin"));
    }

    mod status_mapping {
        use super::*;

        #[tokio::test]
        async fn not_found() {
            let transport = MockTransport::new();
            let err = client(&transport)
                .get("http://h/missing", &Options::new())
                .await
                .unwrap_err();
            assert!(matches!(err, CmisError::ObjectNotFound(_)));
        }

        #[tokio::test]
        async fn conflict_on_put() {
            let transport = MockTransport::new();
            transport.respond(Method::Put, "http://h/obj", 409, "stale token");
            let err = client(&transport)
                .put("http://h/obj", &Options::new(), "text/plain", b"x".to_vec())
                .await
                .unwrap_err();
            assert!(matches!(err, CmisError::UpdateConflict(msg) if msg.contains("stale")));
        }

        #[tokio::test]
        async fn delete_forbidden() {
            let transport = MockTransport::new();
            transport.respond(Method::Delete, "http://h/obj", 403, "");
            let err = client(&transport)
                .delete("http://h/obj", &Options::new())
                .await
                .unwrap_err();
            assert!(matches!(err, CmisError::PermissionDenied(_)));
        }
    }

    #[test]
    fn empty_bodies() {
        assert_eq!(non_empty_body(HttpResponse::new(204, "")), None);
        assert_eq!(non_empty_body(HttpResponse::new(201, " \n")), None);
        assert_eq!(non_empty_body(HttpResponse::new(201, "<x/>")), Some(b"<x/>".to_vec()));
    }
}
