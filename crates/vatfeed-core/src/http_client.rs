use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::ConfigError;

const USER_AGENT: &str = concat!("vatfeed/", env!("CARGO_PKG_VERSION"));

/// GET request issued against one feed mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: 10_000,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Status and raw body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// Fetch capability the sync engine depends on.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a>;
}

/// Transport options applied when building the reqwest client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub follow_redirects: bool,
    /// Mirrors are known to serve broken certificate chains, so peer
    /// verification is off unless asked for.
    pub verify_peer: bool,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            follow_redirects: true,
            verify_peer: false,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Transport that refuses every request; for cache-only operation.
#[derive(Debug, Default)]
pub struct OfflineHttpClient;

impl HttpClient for OfflineHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            Err(HttpError::new(format!(
                "network access disabled, refusing to fetch {}",
                request.url
            )))
        })
    }
}

/// Deterministic transport serving canned responses keyed by URL.
///
/// Unknown URLs fail as unreachable. Every requested URL is recorded, so
/// callers can assert on how often and in which order the network was hit.
#[derive(Debug, Default)]
pub struct StaticHttpClient {
    routes: Mutex<HashMap<String, Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StaticHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.with_response(url, Ok(HttpResponse::ok(body)))
    }

    pub fn with_response(
        self,
        url: impl Into<String>,
        response: Result<HttpResponse, HttpError>,
    ) -> Self {
        self.set_response(url, response);
        self
    }

    pub fn set_response(&self, url: impl Into<String>, response: Result<HttpResponse, HttpError>) {
        lock(&self.routes).insert(url.into(), response);
    }

    /// Requested URLs in order.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests)
            .iter()
            .map(|request| request.url.clone())
            .collect()
    }

    /// The most recent request as issued, timeout included.
    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

impl HttpClient for StaticHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        let response = lock(&self.routes)
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Err(HttpError::new(format!("could not resolve {}", request.url))));
        lock(&self.requests).push(request);
        Box::pin(async move { response })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Production transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    /// Builds the transport; a client that cannot honor `options` is an error.
    pub fn with_options(options: FetchOptions) -> Result<Self, ConfigError> {
        let redirect = if options.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(redirect)
            .danger_accept_invalid_certs(!options.verify_peer)
            .timeout(options.timeout)
            .build()
            .map_err(|error| ConfigError::Transport {
                message: error.to_string(),
            })?;

        Ok(Self {
            client: Arc::new(client),
        })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let response = self
                .client
                .get(&request.url)
                .timeout(Duration::from_millis(request.timeout_ms))
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        HttpError::new(format!("request timeout: {}", e))
                    } else if e.is_connect() {
                        HttpError::new(format!("connection failed: {}", e))
                    } else {
                        HttpError::new(format!("request failed: {}", e))
                    }
                })?;

            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| HttpError::new(format!("failed to read response body: {}", e)))?;

            Ok(HttpResponse {
                status,
                body: body.to_vec(),
            })
        })
    }
}
