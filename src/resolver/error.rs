//! Template resolution error types.
//!
//! Every resolver failure carries the offending key and/or template so that
//! a broken fixture fails the owning test with an attributable message
//! instead of a downstream assertion mystery.

use std::fmt;

/// Errors that can occur during template resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// A placeholder referenced a key absent from both the `variables` and
    /// `environment` namespaces. Never silently defaulted.
    UnresolvedVariable {
        /// The key that could not be found.
        name: String,
        /// The template the placeholder appeared in.
        template: String,
    },

    /// The template contains an unterminated `{{` marker. The template is
    /// rejected as a whole; no best-effort partial substitution.
    MalformedTemplate {
        /// The offending template.
        template: String,
    },

    /// Variable values referenced each other in a cycle, or nesting exceeded
    /// the recursion limit.
    CircularReference(String),

    /// A `{{$...}}` builtin was called with invalid arguments.
    InvalidBuiltin(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UnresolvedVariable { name, template } => write!(
                f,
                "Unresolved variable '{}' in template '{}'",
                name, template
            ),
            ResolveError::MalformedTemplate { template } => {
                write!(f, "Malformed template (unterminated '{{{{'): '{}'", template)
            }
            ResolveError::CircularReference(msg) => write!(f, "Circular reference: {}", msg),
            ResolveError::InvalidBuiltin(msg) => write!(f, "Invalid builtin variable: {}", msg),
        }
    }
}

impl std::error::Error for ResolveError {}
