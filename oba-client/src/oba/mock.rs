//! Mock transport for running without API access.
//!
//! Serves scripted responses keyed by request path, either inserted
//! programmatically or loaded from a directory tree that mirrors the API
//! layout (`stop/1_10914.json`, `arrivals-and-departures-for-stop/1_10914.json`).

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use super::error::ObaError;
use super::transport::{ObaRequest, Transport, error_for_status};

/// A scripted response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// HTTP 200 with this body.
    Body(String),
    /// A non-success HTTP status.
    Status(u16),
}

impl MockResponse {
    pub fn body(body: impl Into<String>) -> Self {
        MockResponse::Body(body.into())
    }

    fn into_result(self) -> Result<String, ObaError> {
        match self {
            MockResponse::Body(body) => Ok(body),
            MockResponse::Status(status) => Err(error_for_status(status, String::new())),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<String, VecDeque<MockResponse>>,
    requests: Vec<ObaRequest>,
}

/// Transport that replays scripted responses.
///
/// Each path has a queue of responses. Responses are consumed in order,
/// except the last one, which keeps being served. Unknown paths get a 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file under `data_dir`, keyed by its relative path.
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, ObaError> {
        let data_dir = data_dir.as_ref();
        let mock = Self::new();
        let loaded = mock.load_dir(data_dir, data_dir)?;

        if loaded == 0 {
            return Err(ObaError::InvalidConfig(format!(
                "no mock response files found in {data_dir:?}"
            )));
        }

        Ok(mock)
    }

    fn load_dir(&self, root: &Path, dir: &Path) -> Result<usize, ObaError> {
        let read_err = |e: std::io::Error| {
            ObaError::InvalidConfig(format!("failed to read mock data {dir:?}: {e}"))
        };

        let mut loaded = 0;
        for entry in std::fs::read_dir(dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();

            if path.is_dir() {
                loaded += self.load_dir(root, &path)?;
                continue;
            }

            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let key = path
                .strip_prefix(root)
                .map_err(|_| ObaError::InvalidConfig(format!("unexpected path {path:?}")))?
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let body = std::fs::read_to_string(&path).map_err(|e| {
                ObaError::InvalidConfig(format!("failed to read {path:?}: {e}"))
            })?;

            self.push(key, MockResponse::Body(body));
            loaded += 1;
        }

        Ok(loaded)
    }

    /// Queue a response for `path`.
    pub fn push(&self, path: impl Into<String>, response: MockResponse) -> &Self {
        self.lock()
            .routes
            .entry(path.into())
            .or_default()
            .push_back(response);
        self
    }

    /// Queue a 200 response with `body` for `path`.
    pub fn push_body(&self, path: impl Into<String>, body: impl Into<String>) -> &Self {
        self.push(path, MockResponse::body(body))
    }

    /// All requests served so far, in order.
    pub fn requests(&self) -> Vec<ObaRequest> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Number of requests made for a given path.
    pub fn count_for(&self, path: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn respond(&self, request: &ObaRequest) -> Result<String, ObaError> {
        let mut state = self.lock();
        state.requests.push(request.clone());

        let Some(queue) = state.routes.get_mut(&request.path) else {
            return Err(error_for_status(
                404,
                format!("no mock response for {}", request.path),
            ));
        };

        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match response {
            Some(response) => response.into_result(),
            None => Err(error_for_status(404, String::new())),
        }
    }
}

impl Transport for MockTransport {
    async fn get(&self, request: &ObaRequest) -> Result<String, ObaError> {
        self.respond(request)
    }
}
