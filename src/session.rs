//! Suite session: the narrow façade test code talks to.
//!
//! A [`Session`] owns the [`VariableStore`] for one suite run and exposes
//! exactly the hook contract a test needs: `resolve` a template, `capture` a
//! value for later tests, and reset between runs. It is a plain owned value
//! passed explicitly into every call — two concurrent suites simply hold two
//! sessions.

use crate::resolver::{self, ResolveError};
use crate::store::{load_config, EnvError, Namespace, Scalar, VariableStore};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Per-suite state: environment variables loaded once at startup plus
/// test-scoped variables captured along the way.
#[derive(Debug, Clone, Default)]
pub struct Session {
    store: VariableStore,
}

impl Session {
    /// Creates a session with empty namespaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session from an already-built environment map.
    pub fn from_environment(environment: HashMap<String, Scalar>) -> Self {
        Self {
            store: VariableStore::with_environment(environment),
        }
    }

    /// Loads the environment from a `.pm-env.json` / `pm.env.json` file found
    /// in (or above) the workspace directory, merging shared variables with
    /// the active environment. A missing file yields an empty environment.
    pub fn from_workspace(workspace_path: &Path) -> Result<Self, EnvError> {
        let config = load_config(workspace_path)?;
        Ok(Self::from_environment(config.merged()))
    }

    /// Loads a specific named environment from the workspace configuration,
    /// ignoring the file's `active` selector.
    pub fn from_workspace_env(workspace_path: &Path, name: &str) -> Result<Self, EnvError> {
        let config = load_config(workspace_path)?;
        Ok(Self::from_environment(config.merged_for(name)?))
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    /// Mutable access to the underlying store.
    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }

    /// Resolves a string template against this session's store.
    pub fn resolve(&self, template: &str) -> Result<String, ResolveError> {
        resolver::resolve_str(template, &self.store)
    }

    /// Resolves a template preserving the variable's native type when the
    /// whole template is one placeholder.
    pub fn resolve_typed(&self, template: &str) -> Result<Scalar, ResolveError> {
        resolver::resolve_typed(template, &self.store)
    }

    /// Resolves every string leaf of a JSON value.
    pub fn resolve_json(&self, value: &Value) -> Result<Value, ResolveError> {
        resolver::resolve_json(value, &self.store)
    }

    /// Writes a value into the `variables` namespace for use by later tests
    /// in the same run.
    pub fn capture(&mut self, key: impl Into<String>, value: impl Into<Scalar>) {
        self.store.set(Namespace::Variables, key, value);
    }

    /// Writes a value into the `environment` namespace.
    pub fn set_environment(&mut self, key: impl Into<String>, value: impl Into<Scalar>) {
        self.store.set(Namespace::Environment, key, value);
    }

    /// Clears captured variables between independent suite runs; the
    /// environment survives.
    pub fn reset_variables(&mut self) {
        self.store.clear_variables();
    }
}
