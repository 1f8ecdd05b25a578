//! Thin HTTP transport over reqwest
//!
//! Every ERP write is a state transition, so the transport never resends a
//! request on its own. Retry policy lives with the callers that know which
//! operations are safe to repeat (the lifecycle driver and the resource
//! accessors). This wrapper only owns connection setup, timeouts, default
//! headers and the mapping of transport failures into [`ErpError::Network`].

use std::time::Duration;

use paybridge_domain::{ErpError, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, IntoUrl, Method, RequestBuilder, Response};
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client used by the ERP adapter.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Client with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::Config`] when the underlying client cannot be
    /// constructed.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Builder for customized settings.
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Start building a request.
    pub fn request(&self, method: Method, url: impl IntoUrl) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Execute a request exactly once.
    ///
    /// Non-success statuses are not errors at this layer; callers inspect
    /// the response and classify the body themselves.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::Network`] on connect, timeout and other
    /// transport failures.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = request.build().map_err(|err| ErpError::Network(err.to_string()))?;
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self.client.execute(request).await.map_err(transport_error)?;
        debug!(%method, %url, status = %response.status(), "http request completed");
        Ok(response)
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: String,
    default_headers: HeaderMap,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("paybridge/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HeaderMap::new(),
        }
    }
}

impl HttpClientBuilder {
    /// Per-request timeout, connection setup included.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// User-agent string sent with every request.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Headers attached to every request, e.g. authorization.
    #[must_use]
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`ErpError::Config`] when reqwest rejects the settings.
    pub fn build(self) -> Result<HttpClient> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .default_headers(self.default_headers)
            .build()
            .map_err(|err| ErpError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(HttpClient { client })
    }
}

fn transport_error(err: reqwest::Error) -> ErpError {
    if err.is_timeout() {
        ErpError::Network(format!("request timed out: {err}"))
    } else if err.is_connect() {
        ErpError::Network(format!("connection failed: {err}"))
    } else {
        ErpError::Network(err.to_string())
    }
}
