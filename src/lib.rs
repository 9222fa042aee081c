//! Environment and template-substitution runtime for HTTP acceptance tests
//!
//! This crate provides the plumbing an API acceptance suite needs around its
//! requests: named variable namespaces, `{{name}}` template resolution, and
//! a small sequential runner that threads captured response values from one
//! test into the next.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - **store**: The two variable namespaces (`environment` and `variables`)
//!   plus the JSON environment file loader
//! - **resolver**: Template resolution in string, typed, and JSON-tree modes,
//!   including `{{$...}}` builtin variables
//! - **request**: Templated request descriptors, the resolution step that
//!   prepares them, and the reqwest-based sender
//! - **runner**: Test cases with checks and captures, run sequentially
//! - **session**: The per-suite façade owning the store
//!
//! # Resolution Model
//!
//! Templates use `{{name}}` markers. Lookup checks the test-scoped
//! `variables` namespace first and falls back to the suite-scoped
//! `environment`. Resolution fails fast: a missing variable or an
//! unterminated `{{` is an error naming the offending template, never a
//! silently passed-through marker. Nested values resolve recursively with a
//! depth limit and cycle detection, and `\{{` escapes a literal marker.
//!
//! # Usage
//!
//! ```
//! use pm_harness::request::{build, HttpMethod, RequestDescriptor};
//! use pm_harness::session::Session;
//!
//! let mut session = Session::new();
//! session.set_environment("server", "https://api.test");
//! session.capture("last_event_id", "42");
//!
//! let descriptor = RequestDescriptor::new(
//!     HttpMethod::GET,
//!     "{{server}}/events/{{last_event_id}}/ticket_types",
//! )
//! .header("Authorization", "Bearer {{org_member_token}}");
//!
//! // Resolution fails fast on the missing token.
//! assert!(build(&descriptor, session.store()).is_err());
//!
//! session.set_environment("org_member_token", "abc123");
//! let resolved = build(&descriptor, session.store()).unwrap();
//! assert_eq!(resolved.url, "https://api.test/events/42/ticket_types");
//! ```
//!
//! # Suite Runs
//!
//! [`runner::run_suite`] executes cases in order against one [`session::Session`];
//! captures made by earlier cases are visible to later ones, and
//! [`session::Session::reset_variables`] clears them between independent runs.

pub mod request;
pub mod resolver;
pub mod runner;
pub mod session;
pub mod store;

pub use request::{build, send, CapturedResponse, HttpMethod, RequestDescriptor, ResolvedRequest};
pub use resolver::{resolve_json, resolve_str, resolve_typed, ResolveError};
pub use runner::{run_case, run_suite, Capture, CaptureSource, TestCase, TestOutcome};
pub use session::Session;
pub use store::{Namespace, Scalar, VariableStore};
