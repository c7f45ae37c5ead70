//! The database project under migration and its MSBuild properties.

use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{LifecycleError, Result};
use crate::version::Version;

const DEFAULT_OUTPUT_PATH: &str = "bin\\Debug\\";
const DEFAULT_DAC_VERSION: Version = Version::new(1, 0, 0, 0);

/// A SQL Server database project (`.sqlproj`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Display name.
    pub name: String,

    /// Full path of the project file.
    pub full_path: PathBuf,

    /// Properties loaded at the start of a pipeline run.
    pub properties: ProjectProperties,
}

/// Properties read from the project file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectProperties {
    /// Name of the produced dacpac (without extension).
    pub sql_target_name: Option<String>,

    /// Absolute build output directory.
    pub binary_directory: Option<PathBuf>,

    /// Currently configured dacpac version.
    pub dac_version: Option<Version>,
}

impl Project {
    pub fn new(name: impl Into<String>, full_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            full_path: full_path.into(),
            properties: ProjectProperties::default(),
        }
    }

    /// Create a project from its file path, naming it after the file stem.
    pub fn from_path(full_path: impl Into<PathBuf>) -> Self {
        let full_path = full_path.into();
        let name = full_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Database")
            .to_string();
        Self::new(name, full_path)
    }

    /// Directory containing the project file.
    pub fn directory(&self) -> &Path {
        self.full_path.parent().unwrap_or(Path::new("."))
    }

    /// Populate [`ProjectProperties`] from the project file content.
    pub fn load_properties(&mut self, project_xml: &str) -> Result<()> {
        let raw = RawProperties::parse(project_xml)?;

        let target_name = raw
            .sql_target_name
            .or(raw.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.name.clone());

        let output_path = raw
            .output_path
            .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string());
        let binary_directory = self.directory().join(normalize_separators(&output_path));

        let dac_version = match raw.dac_version {
            Some(v) => v.parse::<Version>().map_err(|_| {
                LifecycleError::config(format!(
                    "Project {} has an invalid DacVersion '{}'",
                    self.name, v
                ))
            })?,
            None => DEFAULT_DAC_VERSION,
        };

        self.properties = ProjectProperties {
            sql_target_name: Some(target_name),
            binary_directory: Some(binary_directory),
            dac_version: Some(dac_version),
        };
        Ok(())
    }

    /// Target name, once properties are loaded.
    pub fn target_name(&self) -> Result<&str> {
        self.properties
            .sql_target_name
            .as_deref()
            .ok_or_else(|| LifecycleError::config("Project properties have not been loaded"))
    }
}

/// MSBuild paths use backslashes regardless of platform.
fn normalize_separators(path: &str) -> PathBuf {
    path.split(['\\', '/'])
        .filter(|part| !part.is_empty())
        .collect()
}

/// First occurrence of each property of interest.
#[derive(Debug, Default)]
struct RawProperties {
    name: Option<String>,
    sql_target_name: Option<String>,
    output_path: Option<String>,
    dac_version: Option<String>,
}

impl RawProperties {
    fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut props = RawProperties::default();
        let mut current: Option<String> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    current = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
                Event::End(_) => current = None,
                Event::Text(t) => {
                    let value = t.unescape()?.trim().to_string();
                    let slot = match current.as_deref() {
                        Some("Name") => &mut props.name,
                        Some("SqlTargetName") => &mut props.sql_target_name,
                        Some("OutputPath") => &mut props.output_path,
                        Some("DacVersion") => &mut props.dac_version,
                        _ => continue,
                    };
                    if slot.is_none() && !value.is_empty() {
                        *slot = Some(value);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(props)
    }
}
