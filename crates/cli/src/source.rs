//! Loading the raw dataset text from a file or over HTTP

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Where the delimited KPI text comes from
#[derive(Debug, Clone)]
pub enum DataSource {
    File(PathBuf),
    Url(Url),
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Timeout and retry behavior for HTTP loads
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after the first attempt, for connection failures and timeouts only
    pub max_retries: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            max_retries: 3,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

/// Read the dataset text from `source`
pub fn load_text(source: &DataSource, policy: &FetchPolicy) -> Result<String> {
    match source {
        DataSource::File(path) => {
            info!("Reading dataset from {:?}", path);
            let text = std::fs::read_to_string(path).map_err(|e| {
                Error::Core(world_kpi_core::Error::FileReadError {
                    path: path.display().to_string(),
                    source: e,
                })
            })?;
            Ok(text)
        }
        DataSource::Url(url) => {
            info!("Fetching dataset from {}", url);
            HttpLoader::new(policy.clone())?.fetch(url)
        }
    }
}

/// Blocking HTTP client that retries transient failures
pub struct HttpLoader {
    client: reqwest::blocking::Client,
    policy: FetchPolicy,
}

impl HttpLoader {
    pub fn new(policy: FetchPolicy) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/plain, */*"));
        headers.insert(USER_AGENT, HeaderValue::from_static("world-kpi"));

        let client = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(policy.timeout)
            .build()?;

        Ok(Self { client, policy })
    }

    /// GET `url` and return the body text.
    ///
    /// Connection failures and timeouts are retried up to
    /// `policy.max_retries` times; an HTTP error status is returned at once.
    pub fn fetch(&self, url: &Url) -> Result<String> {
        let mut retries = 0;

        loop {
            match self.fetch_once(url) {
                Ok(body) => {
                    debug!("Fetched {} bytes from {}", body.len(), url);
                    return Ok(body);
                }
                Err(e) if is_retryable(&e) && retries < self.policy.max_retries => {
                    retries += 1;
                    warn!(
                        "Fetching {} failed ({}), retry {}/{}",
                        url,
                        describe_error(&e),
                        retries,
                        self.policy.max_retries
                    );
                    std::thread::sleep(self.policy.retry_delay);
                }
                Err(e) => {
                    return Err(Error::Fetch {
                        url: url.to_string(),
                        message: describe_error(&e),
                        retries,
                    });
                }
            }
        }
    }

    fn fetch_once(&self, url: &Url) -> std::result::Result<String, reqwest::Error> {
        self.client
            .get(url.clone())
            .send()?
            .error_for_status()?
            .text()
    }
}

/// Whether an error means no response arrived (worth retrying)
pub fn is_retryable(error: &reqwest::Error) -> bool {
    error.status().is_none() && (error.is_timeout() || error.is_connect() || error.is_request())
}

/// Human-readable message for a failed load
pub fn describe_error(error: &reqwest::Error) -> String {
    if let Some(status) = error.status() {
        let reason = status.canonical_reason().unwrap_or("Unknown error");
        return match status.as_u16() {
            400 => format!("Invalid request: {}", reason),
            404 => format!("Resource not found: {}", reason),
            500 => format!("Server error: {}", reason),
            code => format!("Server error ({}): {}", code, reason),
        };
    }

    if error.is_timeout() {
        "Request timed out. Please check your connection and try again.".to_string()
    } else if error.is_connect() || error.is_request() {
        "No response from server. Please check your connection and try again.".to_string()
    } else {
        format!("Request error: {}", error)
    }
}
