//! HTTP execution of resolved requests.
//!
//! This is the thin seam between the substitution engine and the external
//! HTTP client (reqwest). It validates the resolved URL, executes the request
//! with a configurable timeout, and captures the status, headers, and body
//! for the assertion stage. Transport failures are mapped into
//! [`RequestError`] and passed through unmodified; the harness never retries.

use super::{HttpMethod, ResolvedRequest};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Errors that can occur while executing a resolved request.
#[derive(Debug)]
pub enum RequestError {
    /// Network error: connection failure, DNS resolution, broken transfer.
    NetworkError(String),

    /// Request exceeded the configured timeout. Treated as a normal request
    /// failure by the runner, not a crash.
    Timeout,

    /// The resolved URL could not be parsed.
    InvalidUrl(String),

    /// TLS error during an HTTPS connection.
    TlsError(String),

    /// The client could not construct the outgoing request.
    BuildError(String),

    /// URL scheme is neither http nor https.
    UnsupportedProtocol(String),

    /// Response body could not be decoded as the requested representation.
    DecodeError(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            RequestError::Timeout => write!(f, "Request timed out"),
            RequestError::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            RequestError::TlsError(msg) => write!(f, "TLS/SSL error: {}", msg),
            RequestError::BuildError(msg) => write!(f, "Request build error: {}", msg),
            RequestError::UnsupportedProtocol(protocol) => {
                write!(f, "Unsupported protocol: {}", protocol)
            }
            RequestError::DecodeError(msg) => write!(f, "Response decode error: {}", msg),
        }
    }
}

impl std::error::Error for RequestError {}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RequestError::Timeout
        } else if err.is_builder() {
            RequestError::BuildError(err.to_string())
        } else if err.to_string().contains("certificate") || err.to_string().contains("TLS") {
            RequestError::TlsError(err.to_string())
        } else {
            RequestError::NetworkError(err.to_string())
        }
    }
}

impl From<url::ParseError> for RequestError {
    fn from(err: url::ParseError) -> Self {
        RequestError::InvalidUrl(err.to_string())
    }
}

/// Execution configuration for a single request.
#[derive(Debug, Clone)]
pub struct SendConfig {
    /// Total request timeout. Defaults to 30 seconds.
    pub timeout: Duration,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl SendConfig {
    /// Creates a configuration with the given timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// A captured HTTP response, recorded during a test's setup phase for the
/// assertion stage and for variable capture.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    /// HTTP status code (e.g. 200, 404).
    pub status_code: u16,

    /// HTTP status text (e.g. "OK", "Not Found").
    pub status_text: String,

    /// Response headers.
    pub headers: HashMap<String, String>,

    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl CapturedResponse {
    /// Creates an empty response with the given status.
    pub fn new(status_code: u16, status_text: impl Into<String>) -> Self {
        Self {
            status_code,
            status_text: status_text.into(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Returns true for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Looks a header up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the Content-Type header value, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Decodes the body as UTF-8 text.
    pub fn body_as_string(&self) -> Result<String, RequestError> {
        String::from_utf8(self.body.clone())
            .map_err(|e| RequestError::DecodeError(format!("body is not valid UTF-8: {}", e)))
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Result<Value, RequestError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| RequestError::DecodeError(format!("body is not valid JSON: {}", e)))
    }
}

/// Validates that a resolved URL is well-formed and http(s).
fn validate_url(url: &str) -> Result<(), RequestError> {
    let parsed = url::Url::parse(url)?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(RequestError::UnsupportedProtocol(format!(
            "Only HTTP and HTTPS are supported, got: {}",
            scheme
        )));
    }

    Ok(())
}

/// Executes a resolved request and captures the response.
///
/// Builds a reqwest client with the configured timeout, sends the request,
/// and records status, headers, and body. Timeouts and connection failures
/// come back as [`RequestError`] values for the assertion stage to inspect.
pub async fn send(
    request: &ResolvedRequest,
    config: &SendConfig,
) -> Result<CapturedResponse, RequestError> {
    validate_url(&request.url)?;

    let method = match request.method {
        HttpMethod::GET => reqwest::Method::GET,
        HttpMethod::POST => reqwest::Method::POST,
        HttpMethod::PUT => reqwest::Method::PUT,
        HttpMethod::DELETE => reqwest::Method::DELETE,
        HttpMethod::PATCH => reqwest::Method::PATCH,
        HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
        HttpMethod::HEAD => reqwest::Method::HEAD,
    };

    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| RequestError::BuildError(e.to_string()))?;

    let mut builder = client.request(method, &request.url);

    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }

    if let Some(body) = &request.body {
        builder = builder.json(body);
    }

    let response = builder.send().await.map_err(RequestError::from)?;

    let status_code = response.status().as_u16();
    let status_text = response
        .status()
        .canonical_reason()
        .unwrap_or("Unknown")
        .to_string();

    let mut headers = HashMap::new();
    for (name, value) in response.headers() {
        if let Ok(value_str) = value.to_str() {
            headers.insert(name.as_str().to_string(), value_str.to_string());
        }
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| RequestError::NetworkError(e.to_string()))?
        .to_vec();

    Ok(CapturedResponse {
        status_code,
        status_text,
        headers,
        body,
    })
}
