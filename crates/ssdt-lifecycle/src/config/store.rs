//! Project-keyed configuration persistence.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::Configuration;
use crate::core::Project;
use crate::error::Result;

/// Settings file stored next to the project file.
pub const CONFIGURATION_FILE_NAME: &str = "ssdtlifecycle.json";

/// Loads and saves the configuration of a project.
#[derive(Debug, Default, Clone)]
pub struct ConfigurationStore;

impl ConfigurationStore {
    pub fn new() -> Self {
        Self
    }

    /// Location of the settings file for a project.
    pub fn path_for(project: &Project) -> PathBuf {
        project.directory().join(CONFIGURATION_FILE_NAME)
    }

    /// Load the stored configuration, or the defaults if none exists yet.
    pub fn load_or_default(&self, project: &Project) -> Result<Configuration> {
        let path = Self::path_for(project);
        if !path.exists() {
            debug!("No configuration at {:?}, using defaults", path);
            return Ok(Configuration::default());
        }
        Configuration::load(&path)
    }

    /// Persist the configuration (create-or-truncate).
    pub fn save(&self, project: &Project, config: &Configuration) -> Result<()> {
        let path = Self::path_for(project);
        write_json(&path, config)?;
        info!("Saved configuration for {} to {:?}", project.name, path);
        Ok(())
    }
}

fn write_json(path: &Path, config: &Configuration) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}
