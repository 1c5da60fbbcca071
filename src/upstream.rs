use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, Method, StatusCode, header},
};

use crate::error::GatewayError;

// Connection-scoped headers that must not be relayed by a proxy, plus the ones the
// HTTP stack recomputes for the new hop.
const HOP_BY_HOP_HEADERS: [&str; 10] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Removes hop-by-hop headers, `host` and `content-length` in place.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

/// A request the guard allowed, ready to be relayed.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    /// Path plus query string, e.g. `/admin/courses?page=2`.
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The upstream's answer, relayed back as-is (minus hop-by-hop headers).
/// The body is streamed, never buffered by the gateway.
#[derive(Debug)]
pub struct ForwardResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

/// Upstream
///
/// The UI origin behind the gateway. A trait so handlers can be exercised
/// against `MockUpstream` without a network.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn forward(&self, request: ForwardRequest) -> Result<ForwardResponse, GatewayError>;
}

/// UpstreamState
///
/// The concrete type used to share the upstream through the application state.
pub type UpstreamState = Arc<dyn Upstream>;

/// HttpUpstream
///
/// Relays requests over HTTP with `reqwest`. Redirects are not followed: the client
/// must see the upstream's own redirects.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUpstream {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn target_url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn forward(&self, request: ForwardRequest) -> Result<ForwardResponse, GatewayError> {
        let mut headers = request.headers;
        strip_hop_by_hop(&mut headers);

        let url = self.target_url(&request.path_and_query);
        tracing::debug!(method = %request.method, url = %url, "forwarding to upstream");

        let response = self
            .client
            .request(request.method, url)
            .headers(headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let mut headers = response.headers().clone();
        strip_hop_by_hop(&mut headers);

        Ok(ForwardResponse {
            status,
            headers,
            body: Body::from_stream(response.bytes_stream()),
        })
    }
}

/// MockUpstream
///
/// In-memory upstream for tests. Answers `200` with a body naming the request it
/// received, or with a fixed body when built with `with_body`. Fails every call
/// when built with `new_failing`.
#[derive(Clone, Default)]
pub struct MockUpstream {
    /// When true, all calls return a simulated transport failure.
    pub should_fail: bool,
    /// Replaces the echoed request description when set.
    pub body: Option<Bytes>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            body: None,
        }
    }

    pub fn with_body(body: impl Into<Bytes>) -> Self {
        Self {
            should_fail: false,
            body: Some(body.into()),
        }
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn forward(&self, request: ForwardRequest) -> Result<ForwardResponse, GatewayError> {
        if self.should_fail {
            return Err(GatewayError::Upstream(
                "Mock Upstream Error: Simulation requested".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-upstream"),
            header::HeaderValue::from_static("mock"),
        );

        let body = match &self.body {
            Some(body) => body.clone(),
            None => {
                let mut echo =
                    format!("{} {}", request.method, request.path_and_query).into_bytes();
                if !request.body.is_empty() {
                    echo.push(b'\n');
                    echo.extend_from_slice(&request.body);
                }
                Bytes::from(echo)
            }
        };

        Ok(ForwardResponse {
            status: StatusCode::OK,
            headers,
            body: Body::from(body),
        })
    }
}
