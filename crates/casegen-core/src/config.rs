//! Project configuration for case generation

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::overrides::{ExplicitOverrides, OverrideError};

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OpenAPI spec path (local file)
    pub spec: PathBuf,

    /// Operation to generate cases for, e.g. "POST /users"
    #[serde(default)]
    pub operation: Option<String>,

    /// Number of cases to draw
    #[serde(default = "default_count")]
    pub count: u32,

    /// Seed for reproducible sequences (random when unset)
    #[serde(default)]
    pub seed: Option<u64>,

    /// Explicit overrides, same shape as a case:
    /// `body`, `path_parameters`, `headers`, `cookies`, `query`
    #[serde(default)]
    pub overrides: Option<serde_json::Value>,
}

const fn default_count() -> u32 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spec: PathBuf::from("openapi.yaml"),
            operation: None,
            count: default_count(),
            seed: None,
            overrides: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid overrides: {0}")]
    Overrides(#[from] OverrideError),
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?
        };
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load from default location (.casegen.toml)
    ///
    /// # Errors
    ///
    /// Returns error if a candidate file exists but cannot be loaded
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_default_in(Path::new("."))
    }

    /// Look for the default config files inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns error if a candidate file exists but cannot be loaded
    pub fn load_default_in(dir: &Path) -> Result<Self, ConfigError> {
        let candidates = [".casegen.toml", ".casegen.json", "casegen.toml"];

        for name in candidates {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        // No config file, return default
        Ok(Self::default())
    }

    /// Parse the configured overrides into their typed form.
    ///
    /// # Errors
    ///
    /// Returns error if the overrides table has the wrong shape
    pub fn explicit_overrides(&self) -> Result<ExplicitOverrides, ConfigError> {
        match &self.overrides {
            Some(value) => Ok(ExplicitOverrides::from_value(value)?),
            None => Ok(ExplicitOverrides::default()),
        }
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# casegen configuration

# OpenAPI spec (local file path)
spec = "openapi.yaml"

# Operation to generate cases for
operation = "POST /users"

# Number of cases to draw
count = 10

# Fixed seed for reproducible output (random when omitted)
# seed = 42

# Explicit overrides: pinned values appear verbatim in every case,
# even when they violate the schema. Missing required fields are generated.
# [overrides]
# body = { name = "fixed" }
#
# [overrides.headers]
# X-Request-Id = "abc"
#
# [overrides.query]
# limit = 0
"#
    }
}
