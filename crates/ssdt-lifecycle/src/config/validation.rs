//! Configuration validation.
//!
//! All checks run and every failure is reported, so a settings editor can show
//! them side by side.

use std::fmt;
use std::path::Path;

use super::Configuration;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    /// Name of the offending property (camelCase, as on disk).
    pub property: &'static str,
    pub message: String,
}

impl ConfigurationError {
    fn new(property: &'static str, message: impl Into<String>) -> Self {
        Self {
            property,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.message)
    }
}

/// Validate the configuration, returning every failure found.
pub fn validate(config: &Configuration) -> Vec<ConfigurationError> {
    let mut errors = Vec::new();

    if config.artifacts_path.trim().is_empty() {
        errors.push(ConfigurationError::new(
            "artifactsPath",
            "Path cannot be empty.",
        ));
    } else if Path::new(&config.artifacts_path).is_absolute() {
        errors.push(ConfigurationError::new(
            "artifactsPath",
            "Path must be relative to the project directory.",
        ));
    }

    if config.publish_profile_path.trim().is_empty() {
        errors.push(ConfigurationError::new(
            "publishProfilePath",
            "Path cannot be empty.",
        ));
    } else if !config.publish_profile_path.to_lowercase().ends_with(".publish.xml") {
        errors.push(ConfigurationError::new(
            "publishProfilePath",
            "Profile file name must end with *.publish.xml.",
        ));
    }

    if config.sql_package_path.trim().is_empty() {
        errors.push(ConfigurationError::new(
            "sqlPackagePath",
            "Path cannot be empty.",
        ));
    }

    if config.unnamed_constraint_drop_behavior().is_none() {
        errors.push(ConfigurationError::new(
            "replaceUnnamedDefaultConstraintDrops",
            "Behavior for unnamed default constraint drops is ambiguous.",
        ));
    }

    errors
}
