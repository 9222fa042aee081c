//! Environment configuration loader.
//!
//! Loads the suite environment from a `.pm-env.json` or `pm.env.json` file,
//! searching the workspace directory and up to 3 parent directories. The file
//! defines named environments (dev, staging, ci, ...) plus optional shared
//! variables and an `active` selector:
//!
//! ```json
//! {
//!   "$shared": { "api_version": "v1" },
//!   "ci": { "server": "https://api.test", "org_member_token": "abc123" },
//!   "active": "ci"
//! }
//! ```
//!
//! Values keep their JSON scalar type; nested objects and arrays are
//! rejected. A missing file degrades to an empty configuration so suites can
//! run fully self-configured.

use super::Scalar;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading environment configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvError {
    /// Failed to parse JSON content.
    ParseError(String),

    /// The file parsed but its structure is not a valid environment
    /// definition.
    InvalidFormat(String),

    /// IO error occurred while reading the file.
    IoError(String),

    /// The requested environment name does not exist in the file.
    UnknownEnvironment(String),
}

impl std::fmt::Display for EnvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvError::ParseError(msg) => write!(f, "Failed to parse environment file: {}", msg),
            EnvError::InvalidFormat(msg) => write!(f, "Invalid environment format: {}", msg),
            EnvError::IoError(msg) => write!(f, "IO error: {}", msg),
            EnvError::UnknownEnvironment(name) => write!(f, "Environment '{}' not found", name),
        }
    }
}

impl std::error::Error for EnvError {}

impl From<io::Error> for EnvError {
    fn from(err: io::Error) -> Self {
        EnvError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for EnvError {
    fn from(err: serde_json::Error) -> Self {
        EnvError::ParseError(err.to_string())
    }
}

/// Supported configuration file names in order of preference.
const ENV_FILE_NAMES: &[&str] = &[".pm-env.json", "pm.env.json"];

/// Maximum number of parent directories to search.
const MAX_PARENT_SEARCH_DEPTH: usize = 3;

/// Parsed environment configuration: named environments, shared variables,
/// and the optional active selector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentConfig {
    /// Named environments mapping variable keys to scalar values.
    pub environments: HashMap<String, HashMap<String, Scalar>>,

    /// Shared variables merged into every environment.
    pub shared: HashMap<String, Scalar>,

    /// Name of the environment selected by the file, if any.
    pub active: Option<String>,
}

impl EnvironmentConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared variables overlaid with the active environment.
    ///
    /// Environment-specific values take precedence over shared ones. With no
    /// active environment only the shared variables are returned.
    pub fn merged(&self) -> HashMap<String, Scalar> {
        let mut merged = self.shared.clone();
        if let Some(env) = self
            .active
            .as_ref()
            .and_then(|name| self.environments.get(name))
        {
            merged.extend(env.clone());
        }
        merged
    }

    /// Returns shared variables overlaid with the named environment.
    pub fn merged_for(&self, name: &str) -> Result<HashMap<String, Scalar>, EnvError> {
        let env = self
            .environments
            .get(name)
            .ok_or_else(|| EnvError::UnknownEnvironment(name.to_string()))?;
        let mut merged = self.shared.clone();
        merged.extend(env.clone());
        Ok(merged)
    }

    /// Lists all environment names defined in the file.
    pub fn environment_names(&self) -> Vec<String> {
        self.environments.keys().cloned().collect()
    }
}

/// Loads environment configuration from the workspace.
///
/// Searches for a configuration file starting at `workspace_path` and
/// traversing up to 3 parent directories. Returns an empty configuration if
/// no file is found; returns an error only if a file exists but cannot be
/// read or parsed.
pub fn load_config(workspace_path: &Path) -> Result<EnvironmentConfig, EnvError> {
    let env_file = match find_config_file(workspace_path) {
        Some(path) => path,
        None => return Ok(EnvironmentConfig::new()),
    };

    let content = fs::read_to_string(&env_file)?;
    let raw: serde_json::Value = serde_json::from_str(&content)?;
    parse_config(raw)
}

/// Finds the configuration file by searching workspace and parent
/// directories.
fn find_config_file(workspace_path: &Path) -> Option<PathBuf> {
    let mut current_path = workspace_path.to_path_buf();

    for _ in 0..=MAX_PARENT_SEARCH_DEPTH {
        for filename in ENV_FILE_NAMES {
            let candidate = current_path.join(filename);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        match current_path.parent() {
            Some(parent) => current_path = parent.to_path_buf(),
            None => break,
        }
    }

    None
}

/// Parses the raw JSON into a validated configuration.
fn parse_config(raw: serde_json::Value) -> Result<EnvironmentConfig, EnvError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| EnvError::InvalidFormat("Root must be a JSON object".to_string()))?;

    let mut config = EnvironmentConfig::new();

    for (key, value) in obj.iter() {
        match key.as_str() {
            "shared" | "$shared" => {
                config.shared = parse_variable_map(value, "shared")?;
            }

            "active" | "$active" => {
                config.active = value.as_str().map(|s| s.to_string());
            }

            env_name => {
                if !is_valid_identifier(env_name) {
                    return Err(EnvError::InvalidFormat(format!(
                        "Invalid environment name: '{}'. Names must be alphanumeric with underscores/hyphens",
                        env_name
                    )));
                }

                let variables = parse_variable_map(value, env_name)?;
                config.environments.insert(env_name.to_string(), variables);
            }
        }
    }

    if let Some(ref active_name) = config.active {
        if !config.environments.contains_key(active_name) {
            return Err(EnvError::InvalidFormat(format!(
                "Active environment '{}' does not exist",
                active_name
            )));
        }
    }

    Ok(config)
}

/// Parses a JSON object into a key → scalar map, rejecting container values.
fn parse_variable_map(
    value: &serde_json::Value,
    context: &str,
) -> Result<HashMap<String, Scalar>, EnvError> {
    let obj = value
        .as_object()
        .ok_or_else(|| EnvError::InvalidFormat(format!("'{}' must be a JSON object", context)))?;

    let mut map = HashMap::new();

    for (key, val) in obj.iter() {
        let scalar = Scalar::from_json(val).ok_or_else(|| {
            EnvError::InvalidFormat(format!(
                "Variable '{}' in '{}' has invalid type (must be string, number, boolean, or null)",
                key, context
            ))
        })?;
        map.insert(key.clone(), scalar);
    }

    Ok(map)
}

/// Validates an environment name.
///
/// Names must start with a letter or underscore, continue with alphanumerics,
/// underscores, or hyphens, and not collide with the reserved `shared` /
/// `active` keys.
fn is_valid_identifier(name: &str) -> bool {
    if name == "shared" || name == "active" || name.starts_with('$') {
        return false;
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
