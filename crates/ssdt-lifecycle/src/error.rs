//! Error types for the deployment pipeline.

use thiserror::Error;

use crate::config::ConfigurationError;

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Configuration error (malformed pattern, missing value, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration failed validation with one or more errors
    #[error("Configuration is invalid: {}", format_configuration_errors(.0))]
    InvalidConfiguration(Vec<ConfigurationError>),

    /// Environment error (missing tool, project or profile file)
    #[error("Environment error: {0}")]
    Environment(String),

    /// Schema compare engine reported one or more failures
    #[error("Schema compare failed: {}", .0.join("; "))]
    Engine(Vec<String>),

    /// Another run of the same kind is already in progress
    #[error("A {0} run is already in progress")]
    AlreadyRunning(&'static str),

    /// Build of the database project failed to start
    #[error("Build failed: {0}")]
    Build(String),

    /// Malformed XML in a project file, publish profile or deploy report
    #[error("XML error: {0}")]
    Xml(String),

    /// Dacpac archive could not be read
    #[error("Archive error: {0}")]
    Archive(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Run was cancelled (Ctrl-C, host shutdown, etc.)
    #[error("Run cancelled")]
    Cancelled,
}

fn format_configuration_errors(errors: &[ConfigurationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<quick_xml::Error> for LifecycleError {
    fn from(err: quick_xml::Error) -> Self {
        LifecycleError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for LifecycleError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        LifecycleError::Xml(err.to_string())
    }
}

impl From<zip::result::ZipError> for LifecycleError {
    fn from(err: zip::result::ZipError) -> Self {
        LifecycleError::Archive(err.to_string())
    }
}

impl LifecycleError {
    /// Create an Environment error
    pub fn environment(message: impl Into<String>) -> Self {
        LifecycleError::Environment(message.into())
    }

    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        LifecycleError::Config(message.into())
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            LifecycleError::Config(_) | LifecycleError::InvalidConfiguration(_) => 2,
            LifecycleError::Cancelled => 130,
            _ => 1,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;
