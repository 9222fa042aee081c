//! Variable storage for the test harness.
//!
//! This module defines the two key/value namespaces every acceptance test
//! works against: `environment` (suite-scoped, loaded once from
//! configuration) and `variables` (test-scoped, written by captures from
//! earlier responses). Lookup precedence is `variables` first, then
//! `environment`.

pub mod loader;

pub use loader::{load_config, EnvError, EnvironmentConfig};

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::fmt;

/// A scalar variable value: string, number, boolean, or null.
///
/// Variables keep their JSON type so that typed resolution can round-trip a
/// numeric or boolean value back into a JSON body without stringifying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// JSON null. Substitutes as an empty string in string mode.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value (integer or float, arbitrary precision per serde_json).
    Num(Number),
    /// String value, substituted verbatim.
    Str(String),
}

impl Scalar {
    /// Converts a JSON value to a Scalar, if it is a scalar.
    ///
    /// Returns `None` for arrays and objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(Scalar::Num(n.clone())),
            Value::String(s) => Some(Scalar::Str(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Converts this scalar into the corresponding JSON value.
    pub fn into_json(self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Num(n) => Value::Number(n),
            Scalar::Str(s) => Value::String(s),
        }
    }

    /// Returns true if this scalar is a string.
    pub fn is_str(&self) -> bool {
        matches!(self, Scalar::Str(_))
    }

    /// Returns the string slice if this scalar is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    /// String-mode stringification: strings verbatim, numbers and booleans in
    /// their canonical JSON form, null as the empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Num(n) => write!(f, "{}", n),
            Scalar::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Num(Number::from(n))
    }
}

impl From<u64> for Scalar {
    fn from(n: u64) -> Self {
        Scalar::Num(Number::from(n))
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// The two variable scopes available to a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Suite-scoped variables loaded once from configuration
    /// (server base URL, service tokens, ...).
    Environment,
    /// Test-scoped variables captured from earlier responses
    /// (event ids, order ids, ...).
    Variables,
}

/// Holds the `environment` and `variables` namespaces for one suite run.
///
/// The store is an explicit value passed into every resolution call rather
/// than ambient global state, so running two suites concurrently only
/// requires two stores. Within one suite run mutation ordering is program
/// order; no locking is involved.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    environment: HashMap<String, Scalar>,
    variables: HashMap<String, Scalar>,
}

impl VariableStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with a pre-populated environment namespace.
    pub fn with_environment(environment: HashMap<String, Scalar>) -> Self {
        Self {
            environment,
            variables: HashMap::new(),
        }
    }

    fn namespace(&self, ns: Namespace) -> &HashMap<String, Scalar> {
        match ns {
            Namespace::Environment => &self.environment,
            Namespace::Variables => &self.variables,
        }
    }

    fn namespace_mut(&mut self, ns: Namespace) -> &mut HashMap<String, Scalar> {
        match ns {
            Namespace::Environment => &mut self.environment,
            Namespace::Variables => &mut self.variables,
        }
    }

    /// Pure lookup in a single namespace. Missing keys are `None`; the caller
    /// decides whether that is fatal.
    pub fn get(&self, ns: Namespace, key: &str) -> Option<&Scalar> {
        self.namespace(ns).get(key)
    }

    /// Sets a variable, overwriting any existing value (last write wins).
    pub fn set(&mut self, ns: Namespace, key: impl Into<String>, value: impl Into<Scalar>) {
        self.namespace_mut(ns).insert(key.into(), value.into());
    }

    /// Checks whether a key exists in a namespace.
    pub fn has(&self, ns: Namespace, key: &str) -> bool {
        self.namespace(ns).contains_key(key)
    }

    /// Looks a key up with the documented precedence: `variables` first,
    /// falling back to `environment`.
    pub fn lookup(&self, key: &str) -> Option<&Scalar> {
        self.variables
            .get(key)
            .or_else(|| self.environment.get(key))
    }

    /// Clears the test-scoped `variables` namespace.
    ///
    /// Used between independent suite runs to avoid cross-test leakage; the
    /// environment namespace survives.
    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }

    /// Returns the number of entries in a namespace.
    pub fn len(&self, ns: Namespace) -> usize {
        self.namespace(ns).len()
    }

    /// Checks whether a namespace has no entries.
    pub fn is_empty(&self, ns: Namespace) -> bool {
        self.namespace(ns).is_empty()
    }
}
