//! HTTP boundary for list screens.
//!
//! # Responsibility
//! - Define the `HttpClient` seam used by screens.
//! - Provide a blocking `reqwest` implementation with a request timeout.
//!
//! # Invariants
//! - Only GET is issued; no headers, auth or query parameters are added.
//! - Non-2xx responses are errors, never bodies handed to the adapter.

use crate::config::AppConfig;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Debug)]
pub enum FetchError {
    /// Client construction, connection, timeout or body read failure.
    Transport(reqwest::Error),
    /// Server answered with a non-success status.
    Status { url: String, status: u16 },
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "request failed: {err}"),
            Self::Status { url, status } => write!(f, "GET {url} returned status {status}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Status { .. } => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

/// Blocking GET capability. Implementations must be callable from a worker
/// thread.
pub trait HttpClient: Send + Sync {
    /// Fetches `url` and returns the response body as text.
    fn get(&self, url: &str) -> FetchResult<String>;
}

/// `reqwest`-backed client.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::blocking::Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &AppConfig) -> FetchResult<Self> {
        Self::new(config.http_timeout)
    }
}

impl HttpClient for ReqwestHttpClient {
    fn get(&self, url: &str) -> FetchResult<String> {
        let started_at = Instant::now();
        let result = self
            .client
            .get(url)
            .send()
            .map_err(FetchError::from)
            .and_then(|response| {
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }
                Ok(response.text()?)
            });

        match &result {
            Ok(body) => info!(
                "event=http_get module=fetch status=ok url={} bytes={} duration_ms={}",
                url,
                body.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=http_get module=fetch status=error url={} duration_ms={} error={}",
                url,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}
