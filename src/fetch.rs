//! Transport used by helpers to obtain raw bytes
//!
//! - [`FileFetcher`]: reads from a directory on local disk and reports status 0,
//!   the way browsers surface responses read straight from disk
//! - [`HttpFetcher`]: network requests through reqwest (feature `http`)
//! - [`MemoryFetcher`]: canned responses, used offline and in tests

use crate::error::TransportError;
use futures::future::BoxFuture;
use futures::FutureExt;
use hashbrown::HashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Status reported for a successful read from local disk
pub const LOCAL_STATUS: u16 = 0;

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        })
    }
}

/// Outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub body: Option<Vec<u8>>,
    /// Send cookies/credentials along with the request
    pub with_credentials: bool,
}

impl Request {
    /// Plain GET without credentials
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
            with_credentials: false,
        }
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// Completed response; failing statuses are still responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// 2xx, or the local-disk status 0
    pub fn is_success(&self) -> bool {
        is_success_status(self.status)
    }
}

/// Success statuses: `[200, 300)` and [`LOCAL_STATUS`]
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status) || status == LOCAL_STATUS
}

/// Source of responses for requests
pub trait Fetcher: Send + Sync {
    /// Issue a single request. No retry is attempted.
    fn fetch(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>>;
}

/// Reads request paths relative to a root directory
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    /// Create a new file fetcher rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, TransportError> {
        if url.contains("://") {
            return Err(TransportError::InvalidUrl(url.to_string()));
        }

        let relative = Path::new(url.trim_start_matches('/'));
        let escapes_root = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes_root {
            return Err(TransportError::InvalidUrl(url.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

impl Fetcher for FileFetcher {
    fn fetch(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
        async move {
            if request.method != Method::Get {
                return Ok(Response::new(405, Vec::new()));
            }

            let path = self.resolve(&request.url)?;
            match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(Response::new(LOCAL_STATUS, bytes)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Ok(Response::new(404, Vec::new()))
                }
                Err(e) => Err(TransportError::Io(e)),
            }
        }
        .boxed()
    }
}

/// In-memory responses keyed by URL, recording every request it sees
#[derive(Default)]
pub struct MemoryFetcher {
    responses: HashMap<String, Response>,
    requests: Mutex<Vec<Request>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer GET/POST/PUT requests for `url` with `status` and `body`
    pub fn with_response(mut self, url: impl Into<String>, status: u16, body: Vec<u8>) -> Self {
        self.responses.insert(url.into(), Response::new(status, body));
        self
    }

    /// Requests issued so far, oldest first
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
        let response = self
            .responses
            .get(&request.url)
            .cloned()
            .ok_or_else(|| TransportError::Http(format!("connection refused: {}", request.url)));
        self.requests.lock().push(request);
        futures::future::ready(response).boxed()
    }
}

#[cfg(feature = "http")]
pub use http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use super::{Fetcher, Method, Request, Response};
    use crate::error::TransportError;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use reqwest::Client;
    use std::time::Duration;
    use url::Url;

    /// Network fetcher
    pub struct HttpFetcher {
        client: Client,
        base_url: Option<Url>,
    }

    impl HttpFetcher {
        /// Create a new HTTP fetcher; relative request URLs are rejected
        pub fn new() -> Result<Self, TransportError> {
            let client = Client::builder()
                .timeout(Duration::from_secs(30))
                .user_agent(concat!("media-storage/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| TransportError::Http(format!("Failed to create HTTP client: {}", e)))?;

            Ok(Self {
                client,
                base_url: None,
            })
        }

        /// Resolve relative request URLs against `base`
        pub fn with_base_url(mut self, base: &str) -> Result<Self, TransportError> {
            let base = Url::parse(base).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", base, e)))?;
            self.base_url = Some(base);
            Ok(self)
        }

        pub(crate) fn resolve(&self, url: &str) -> Result<Url, TransportError> {
            match Url::parse(url) {
                Ok(url) => Ok(url),
                Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                    Some(base) => base
                        .join(url)
                        .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", url, e))),
                    None => Err(TransportError::InvalidUrl(url.to_string())),
                },
                Err(e) => Err(TransportError::InvalidUrl(format!("{}: {}", url, e))),
            }
        }
    }

    impl Fetcher for HttpFetcher {
        fn fetch(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
            async move {
                let url = self.resolve(&request.url)?;
                let method = match request.method {
                    Method::Get => reqwest::Method::GET,
                    Method::Post => reqwest::Method::POST,
                    Method::Put => reqwest::Method::PUT,
                };

                // Credentials are a browser concern; cookie handling is left to the client.
                log::trace!("{} {} (credentials: {})", request.method, url, request.with_credentials);

                let mut builder = self.client.request(method, url);
                if let Some(body) = request.body {
                    builder = builder.body(body);
                }

                let response = builder
                    .send()
                    .await
                    .map_err(|e| TransportError::Http(format!("HTTP request failed: {}", e)))?;
                let status = response.status().as_u16();
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| TransportError::Http(format!("Failed to read response: {}", e)))?;

                Ok(Response::new(status, body.to_vec()))
            }
            .boxed()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_http_fetcher_creation() {
            let fetcher = HttpFetcher::new();
            assert!(fetcher.is_ok());
        }

        #[test]
        fn test_relative_url_needs_base() {
            let fetcher = HttpFetcher::new().unwrap();
            assert!(matches!(
                fetcher.resolve("medialibraries/a.wav"),
                Err(TransportError::InvalidUrl(_))
            ));

            let fetcher = fetcher.with_base_url("http://localhost:8601/").unwrap();
            let url = fetcher.resolve("medialibraries/a.wav").unwrap();
            assert_eq!(url.as_str(), "http://localhost:8601/medialibraries/a.wav");
        }
    }
}
