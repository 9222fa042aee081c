//! Request descriptors and the resolution step that prepares them for
//! sending.
//!
//! A [`RequestDescriptor`] is the templated form a test writes: method, URL,
//! headers, and optional JSON body, any string part of which may contain
//! `{{name}}` placeholders. [`build`] runs the resolver over every part and
//! produces a [`ResolvedRequest`] guaranteed free of unresolved markers,
//! ready for the HTTP client in [`send`](crate::request::send::send).

pub mod send;

pub use send::{send, CapturedResponse, RequestError, SendConfig};

use crate::resolver::{resolve_headers, resolve_json, resolve_str, ResolveError};
use crate::store::VariableStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP DELETE method - remove a resource
    DELETE,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP OPTIONS method - describe communication options
    OPTIONS,
    /// HTTP HEAD method - retrieve headers only
    HEAD,
}

impl HttpMethod {
    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
        }
    }

    /// Parses a string into an HttpMethod, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            "HEAD" => Some(HttpMethod::HEAD),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A templated request as written by a test.
///
/// The URL, header values, and string leaves of the body may all contain
/// `{{name}}` placeholders; nothing is resolved until [`build`] runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: HttpMethod,

    /// Target URL template, e.g. `{{server}}/events/{{last_event_id}}`.
    pub url: String,

    /// Header templates. Names are literal; values may contain placeholders.
    pub headers: HashMap<String, String>,

    /// Optional JSON body template. String leaves are resolved in typed mode
    /// so numeric variables keep their type.
    pub body: Option<Value>,
}

impl RequestDescriptor {
    /// Creates a descriptor with the given method and URL template.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Adds a header template, returning the descriptor for chaining.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the JSON body template, returning the descriptor for chaining.
    pub fn json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A fully resolved request: every part is guaranteed free of unresolved
/// markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRequest {
    /// HTTP method.
    pub method: HttpMethod,

    /// Resolved target URL.
    pub url: String,

    /// Resolved headers.
    pub headers: HashMap<String, String>,

    /// Resolved JSON body, if any.
    pub body: Option<Value>,
}

/// Resolves every templated part of a descriptor against the store.
///
/// The URL and header values are resolved in string mode; the body tree is
/// resolved with typed string leaves. Fails fast on the first unresolved
/// placeholder with no partial request produced.
///
/// # Examples
///
/// ```
/// use pm_harness::request::{build, HttpMethod, RequestDescriptor};
/// use pm_harness::store::{Namespace, VariableStore};
///
/// let mut store = VariableStore::new();
/// store.set(Namespace::Environment, "server", "https://api.test");
/// store.set(Namespace::Variables, "last_event_id", "42");
///
/// let descriptor = RequestDescriptor::new(
///     HttpMethod::GET,
///     "{{server}}/events/{{last_event_id}}/ticket_types",
/// );
///
/// let resolved = build(&descriptor, &store).unwrap();
/// assert_eq!(resolved.url, "https://api.test/events/42/ticket_types");
/// ```
pub fn build(
    descriptor: &RequestDescriptor,
    store: &VariableStore,
) -> Result<ResolvedRequest, ResolveError> {
    let url = resolve_str(&descriptor.url, store)?;
    let headers = resolve_headers(&descriptor.headers, store)?;
    let body = match &descriptor.body {
        Some(body) => Some(resolve_json(body, store)?),
        None => None,
    };

    Ok(ResolvedRequest {
        method: descriptor.method,
        url,
        headers,
        body,
    })
}
