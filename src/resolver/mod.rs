//! Template resolution engine.
//!
//! This module replaces `{{name}}` placeholders in request templates with
//! values from a [`VariableStore`](crate::store::VariableStore), looking up
//! the `variables` namespace first and falling back to `environment`.
//!
//! Three entry points cover the shapes a test works with:
//!
//! - [`resolve_str`] — string mode: every placeholder is substituted with the
//!   stringified value; the result is a plain string (URLs, header values).
//! - [`resolve_typed`] — typed mode: when the entire template is exactly one
//!   placeholder the stored value keeps its native type, so numeric and
//!   boolean variables round-trip into JSON bodies.
//! - [`resolve_json`] — walks a JSON value, resolving string leaves in typed
//!   mode and rebuilding the same shape.
//!
//! Resolution is fail-fast: a missing key fails the whole call with an error
//! naming the key and the template, and no partial output is produced. An
//! unterminated `{{` is rejected as malformed. Literal braces can be written
//! as `\{{` and `\}}`. Values may themselves contain placeholders; nesting is
//! bounded by a recursion limit with cycle detection.

pub mod dynamic;
pub mod error;

pub use error::ResolveError;

use crate::store::{Scalar, VariableStore};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Maximum nesting depth for variables whose values reference other
/// variables.
pub const MAX_RECURSION_DEPTH: usize = 10;

/// Private-use sentinels standing in for escaped braces during scanning.
const ESC_OPEN: char = '\u{E000}';
const ESC_CLOSE: char = '\u{E001}';

/// Cached pattern matching `{{identifier}}` spans, used for placeholder
/// listing. Compiled once.
static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("Failed to compile placeholder regex"));

/// Lists the placeholder identifiers referenced by a template, in order of
/// appearance, duplicates included. Escaped braces are ignored.
///
/// # Examples
///
/// ```
/// use pm_harness::resolver::find_placeholders;
///
/// let names = find_placeholders("{{server}}/events/{{last_event_id}}/ticket_types");
/// assert_eq!(names, vec!["server", "last_event_id"]);
/// ```
pub fn find_placeholders(template: &str) -> Vec<String> {
    let escaped = template.replace("\\{{", "").replace("\\}}", "");
    PLACEHOLDER_REGEX
        .captures_iter(&escaped)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Resolves a string template, substituting every placeholder with the
/// stringified value of the variable it names.
///
/// Lookup checks `variables` first, then `environment`; identifiers beginning
/// with `$` resolve to generated builtin values (see [`dynamic`]). A template
/// without markers is returned unchanged.
///
/// # Errors
///
/// [`ResolveError::UnresolvedVariable`] when a key is absent from both
/// namespaces, [`ResolveError::MalformedTemplate`] on an unterminated `{{`,
/// [`ResolveError::CircularReference`] when variable values form a cycle.
///
/// # Examples
///
/// ```
/// use pm_harness::resolver::resolve_str;
/// use pm_harness::store::{Namespace, VariableStore};
///
/// let mut store = VariableStore::new();
/// store.set(Namespace::Environment, "org_member_token", "abc123");
///
/// let header = resolve_str("Bearer {{org_member_token}}", &store).unwrap();
/// assert_eq!(header, "Bearer abc123");
/// ```
pub fn resolve_str(template: &str, store: &VariableStore) -> Result<String, ResolveError> {
    // Fast path: no markers and no escapes to rewrite.
    if !template.contains("{{") && !template.contains("\\}}") {
        return Ok(template.to_string());
    }

    resolve_with_depth(template, template, store, 0, &mut HashSet::new())
}

/// Resolves a template, preserving the variable's native type when the whole
/// template is exactly one placeholder.
///
/// `"{{count}}"` with `count = 7` yields `Scalar::Num(7)`; any template with
/// surrounding text falls back to string mode wrapped in `Scalar::Str`.
pub fn resolve_typed(template: &str, store: &VariableStore) -> Result<Scalar, ResolveError> {
    if let Some(name) = single_placeholder(template) {
        return resolve_name(name, template, store, 0, &mut HashSet::new());
    }

    resolve_str(template, store).map(Scalar::Str)
}

/// Recursively resolves every string leaf of a JSON value in typed mode,
/// rebuilding the same shape. Numbers, booleans, and null pass through
/// unchanged; object keys are not templates.
///
/// Fails as soon as any leaf fails; no partial structure is returned. Never
/// mutates the store.
pub fn resolve_json(value: &Value, store: &VariableStore) -> Result<Value, ResolveError> {
    match value {
        Value::String(s) => Ok(resolve_typed(s, store)?.into_json()),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(resolve_json(item, store)?);
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                out.insert(key.clone(), resolve_json(item, store)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

/// Resolves every value of a header map in string mode, preserving names.
pub fn resolve_headers(
    headers: &HashMap<String, String>,
    store: &VariableStore,
) -> Result<HashMap<String, String>, ResolveError> {
    let mut out = HashMap::with_capacity(headers.len());
    for (name, value) in headers {
        out.insert(name.clone(), resolve_str(value, store)?);
    }
    Ok(out)
}

/// Returns the identifier when the template is exactly one placeholder, with
/// no surrounding text beyond whitespace.
fn single_placeholder(template: &str) -> Option<&str> {
    let inner = template.trim().strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    let name = inner.trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Internal scanner with depth tracking and cycle detection.
///
/// `origin` is the template the caller passed in; errors always reference it
/// so a failure inside a nested variable value still points at the template
/// the test wrote.
fn resolve_with_depth(
    text: &str,
    origin: &str,
    store: &VariableStore,
    depth: usize,
    visiting: &mut HashSet<String>,
) -> Result<String, ResolveError> {
    if depth >= MAX_RECURSION_DEPTH {
        return Err(ResolveError::CircularReference(format!(
            "recursion limit exceeded while resolving '{}'",
            origin
        )));
    }

    // Escaped braces become sentinels so the scanner skips them.
    let escaped = text
        .replace("\\{{", &ESC_OPEN.to_string())
        .replace("\\}}", &ESC_CLOSE.to_string());

    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped.as_str();

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];

        let close = after
            .find("}}")
            .ok_or_else(|| ResolveError::MalformedTemplate {
                template: origin.to_string(),
            })?;

        let name = after[..close].trim();
        if name.is_empty() {
            return Err(ResolveError::MalformedTemplate {
                template: origin.to_string(),
            });
        }

        let scalar = resolve_name(name, origin, store, depth, visiting)?;
        out.push_str(&scalar.to_string());

        rest = &after[close + 2..];
    }
    out.push_str(rest);

    Ok(out
        .replace(ESC_OPEN, "{{")
        .replace(ESC_CLOSE, "}}"))
}

/// Looks an identifier up and resolves any placeholders inside its value.
fn resolve_name(
    name: &str,
    origin: &str,
    store: &VariableStore,
    depth: usize,
    visiting: &mut HashSet<String>,
) -> Result<Scalar, ResolveError> {
    if name.starts_with('$') {
        return dynamic::resolve_builtin(name, origin).map(Scalar::Str);
    }

    if visiting.contains(name) {
        return Err(ResolveError::CircularReference(format!(
            "variable '{}' participates in a reference cycle",
            name
        )));
    }

    let scalar = store
        .lookup(name)
        .cloned()
        .ok_or_else(|| ResolveError::UnresolvedVariable {
            name: name.to_string(),
            template: origin.to_string(),
        })?;

    if let Scalar::Str(value) = &scalar {
        if value.contains("{{") {
            visiting.insert(name.to_string());
            let resolved = resolve_with_depth(value, origin, store, depth + 1, visiting)?;
            visiting.remove(name);
            return Ok(Scalar::Str(resolved));
        }
    }

    Ok(scalar)
}
