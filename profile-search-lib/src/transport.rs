//! HTTP transport used by probe executions.
//!
//! The engine only talks to the [`Transport`] and [`ProbeClient`] traits, so
//! tests can substitute an in-memory transport. [`ReqwestTransport`] is the
//! production implementation.

use crate::error::ProbeError;
use crate::types::RunConfig;
use std::future::Future;
use std::time::Duration;

/// Accept header sent with every probe request.
pub const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Accept-Language header sent with every probe request.
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// A GET request ready to be sent by a [`ProbeClient`].
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    url: reqwest::Url,
    headers: Vec<(&'static str, String)>,
}

impl ProbeRequest {
    /// Build a GET request with the browser-like header set.
    ///
    /// Fails with [`ProbeError::RequestBuild`] when `url` does not parse.
    pub fn get(url: &str, user_agent: &str) -> Result<Self, ProbeError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| ProbeError::request_build(url, e.to_string()))?;

        Ok(Self {
            url: parsed,
            headers: vec![
                ("User-Agent", user_agent.to_string()),
                ("Accept", ACCEPT.to_string()),
                ("Accept-Language", ACCEPT_LANGUAGE.to_string()),
            ],
        })
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    pub fn headers(&self) -> &[(&'static str, String)] {
        &self.headers
    }

    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A fully buffered HTTP response.
///
/// The body is read once by the transport and then shared by reference with
/// the predicate and the extractor.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ProbeResponse {
    pub fn new<B: Into<Vec<u8>>>(status: u16, body: B) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for HTTP 404.
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Decode the body as UTF-8.
    ///
    /// A body that is not valid UTF-8 is reported as a validation error so the
    /// executor retries it.
    pub fn text(&self) -> Result<&str, ProbeError> {
        std::str::from_utf8(&self.body).map_err(|e| {
            ProbeError::validation(
                "response",
                format!("body is not valid UTF-8: {}", e),
            )
        })
    }
}

/// Provider of HTTP clients, one per attempt.
pub trait Transport: Send + Sync {
    type Client: ProbeClient + Send + Sync;

    /// Build a client configured from `config`.
    fn acquire(&self, config: &RunConfig) -> Result<Self::Client, ProbeError>;
}

/// A client able to send one probe request.
pub trait ProbeClient {
    fn send(
        &self,
        request: ProbeRequest,
    ) -> impl Future<Output = Result<ProbeResponse, ProbeError>> + Send;
}

/// Transport backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for ReqwestTransport {
    type Client = HttpClient;

    fn acquire(&self, config: &RunConfig) -> Result<HttpClient, ProbeError> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(100);

        match config.pick_proxy() {
            Some(proxy_url) => match reqwest::Proxy::all(proxy_url) {
                Ok(proxy) => {
                    tracing::debug!(proxy = proxy_url, "using proxy");
                    builder = builder.proxy(proxy);
                }
                Err(e) => {
                    // Never fall back to a direct connection when a proxy was asked for.
                    return Err(ProbeError::config(format!(
                        "Invalid proxy URL '{}': {}",
                        proxy_url, e
                    )));
                }
            },
            None => {
                builder = builder.no_proxy();
            }
        }

        let client = builder.build().map_err(|e| {
            ProbeError::network_with_source("Failed to create HTTP client", e.to_string())
        })?;

        Ok(HttpClient {
            client,
            timeout: config.timeout,
        })
    }
}

/// A configured `reqwest` client for a single attempt.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ProbeClient for HttpClient {
    async fn send(&self, request: ProbeRequest) -> Result<ProbeResponse, ProbeError> {
        let url = request.url().to_string();
        let mut builder = self.client.get(request.url().clone());
        for (name, value) in request.headers() {
            builder = builder.header(*name, value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.classify(&url, e))?;
        let status = response.status().as_u16();

        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(&url, e))?;

        tracing::trace!(url = %url, status, bytes = body.len(), "response received");

        Ok(ProbeResponse {
            status,
            body: body.to_vec(),
        })
    }
}

impl HttpClient {
    fn classify(&self, url: &str, err: reqwest::Error) -> ProbeError {
        if err.is_timeout() {
            ProbeError::timeout(format!("GET {}", url), self.timeout)
        } else {
            err.into()
        }
    }
}
