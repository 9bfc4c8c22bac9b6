//! HTTP transport for OneBusAway requests.
//!
//! [`Transport`] is the seam between the client logic (retry, parsing,
//! caching) and the network, so the client can be driven by
//! [`MockTransport`](super::MockTransport) in tests.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::client::ObaConfig;
use super::error::ObaError;

/// A GET request relative to the API base URL.
///
/// The API key is added by the transport, not stored here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObaRequest {
    /// Path below the base URL, e.g. `stop/1_10914.json`.
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl ObaRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Append a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

/// Something that can execute an [`ObaRequest`] and return the body.
pub trait Transport: Send + Sync {
    /// Perform the request once, without retrying.
    ///
    /// Non-success HTTP statuses are returned as errors (see
    /// [`error_for_status`]); the body of a 2xx response is returned as-is.
    fn get(&self, request: &ObaRequest) -> impl Future<Output = Result<String, ObaError>> + Send;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get(&self, request: &ObaRequest) -> impl Future<Output = Result<String, ObaError>> + Send {
        (**self).get(request)
    }
}

/// Map a non-success HTTP status to an error.
pub fn error_for_status(status: u16, body: String) -> ObaError {
    if status == 429 {
        ObaError::RateLimited
    } else {
        ObaError::Status {
            status,
            message: body,
        }
    }
}

/// reqwest-backed transport talking to a real OneBusAway server.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// Build a transport from the client configuration.
    pub fn new(config: &ObaConfig) -> Result<Self, ObaError> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| ObaError::InvalidConfig(format!("base URL {:?}: {e}", config.base_url)))?;

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .read_timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Full URL for a request, without the query string.
    pub fn url_for(&self, request: &ObaRequest) -> String {
        format!("{}/{}", self.base_url, request.path)
    }
}

impl Transport for HttpTransport {
    async fn get(&self, request: &ObaRequest) -> Result<String, ObaError> {
        let url = self.url_for(request);
        debug!(url = %url, "GET");

        let response = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(&request.query)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status.as_u16(), body));
        }

        Ok(response.text().await?)
    }
}
