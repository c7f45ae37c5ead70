//! Configuration type definitions.

use serde::{Deserialize, Serialize};

use crate::version::VersionPattern;

/// User-adjustable settings for one database project.
///
/// Field names are camelCase on disk so the settings file stays compatible
/// with files edited by other tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Artifacts directory, relative to the project directory.
    #[serde(default = "default_artifacts_path")]
    pub artifacts_path: String,

    /// Publish profile, relative to the project directory.
    #[serde(default)]
    pub publish_profile_path: String,

    /// SqlPackage executable (absolute path or a name resolved from PATH).
    #[serde(default = "default_sql_package_path")]
    pub sql_package_path: String,

    /// Build the project before a script is created (default: true).
    #[serde(default = "default_true")]
    pub build_before_script_creation: bool,

    /// Also create the XML deploy report.
    #[serde(default)]
    pub create_documentation_with_script_creation: bool,

    /// Dotted pattern used to render versions.
    #[serde(default)]
    pub version_pattern: VersionPattern,

    /// Text prepended to the deploy script.
    #[serde(default)]
    pub custom_header: String,

    /// Text appended to the deploy script.
    #[serde(default)]
    pub custom_footer: String,

    /// Comment out the batches containing unnamed default constraint drops.
    #[serde(default)]
    pub comment_out_unnamed_default_constraint_drops: bool,

    /// Replace unnamed default constraint drops with a catalog lookup.
    #[serde(default)]
    pub replace_unnamed_default_constraint_drops: bool,

    /// Record deployments in the `[dbo].[__DacpacVersion]` table.
    #[serde(default)]
    pub track_dacpac_version: bool,

    /// Delete the project's refactor log once a versioned script exists.
    #[serde(default)]
    pub delete_refactor_log_after_versioned_script_generation: bool,

    /// Delete the `latest` artifacts once a versioned script exists.
    #[serde(default)]
    pub delete_latest_after_versioned_script_generation: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            artifacts_path: default_artifacts_path(),
            publish_profile_path: String::new(),
            sql_package_path: default_sql_package_path(),
            build_before_script_creation: true,
            create_documentation_with_script_creation: false,
            version_pattern: VersionPattern::default(),
            custom_header: String::new(),
            custom_footer: String::new(),
            comment_out_unnamed_default_constraint_drops: false,
            replace_unnamed_default_constraint_drops: false,
            track_dacpac_version: false,
            delete_refactor_log_after_versioned_script_generation: false,
            delete_latest_after_versioned_script_generation: false,
        }
    }
}

/// How generic `DROP CONSTRAINT ;` statements are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnnamedConstraintDropBehavior {
    /// Leave the statements untouched.
    Keep,
    CommentOut,
    Replace,
}

impl Configuration {
    /// Resolved unnamed constraint drop behavior; `None` if ambiguous.
    pub fn unnamed_constraint_drop_behavior(&self) -> Option<UnnamedConstraintDropBehavior> {
        match (
            self.comment_out_unnamed_default_constraint_drops,
            self.replace_unnamed_default_constraint_drops,
        ) {
            (true, true) => None,
            (true, false) => Some(UnnamedConstraintDropBehavior::CommentOut),
            (false, true) => Some(UnnamedConstraintDropBehavior::Replace),
            (false, false) => Some(UnnamedConstraintDropBehavior::Keep),
        }
    }
}

fn default_artifacts_path() -> String {
    "_Deployment".to_string()
}

fn default_sql_package_path() -> String {
    "SqlPackage".to_string()
}

fn default_true() -> bool {
    true
}
