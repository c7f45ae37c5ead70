//! Configuration loading, persistence and validation.

mod store;
mod types;
mod validation;

pub use store::{ConfigurationStore, CONFIGURATION_FILE_NAME};
pub use types::*;
pub use validation::ConfigurationError;

use crate::error::{LifecycleError, Result};
use std::path::Path;

impl Configuration {
    /// Load configuration from a YAML or JSON file (chosen by extension).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);

        if is_yaml {
            Self::from_yaml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Run every check and return the failures (empty when valid).
    pub fn validate(&self) -> Vec<ConfigurationError> {
        validation::validate(self)
    }

    /// Validate, turning any failure into an error.
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::InvalidConfiguration(errors))
        }
    }
}
