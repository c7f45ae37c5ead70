//! # ssdt-lifecycle
//!
//! Versioned deployment artifacts for SQL Server database projects.
//!
//! This library turns the dacpacs built from a database project into a
//! versioned history of migration scripts:
//!
//! - **Scaffold** copies the build output as the first version
//! - **Create script** compares a previous version with the current build
//!   and writes the deploy script (and optionally the deploy report)
//! - **Script modifiers** add headers and footers, track deployments in the
//!   target database, repair drops of unnamed default constraints and strip
//!   SqlCmd statements
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ssdt_lifecycle::{
//!     Configuration, DeploymentService, DotnetBuildService, LocalFileSystem, Project,
//!     SqlPackageEngine, Version,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> ssdt_lifecycle::Result<()> {
//!     let project = Project::from_path("Library/Library.sqlproj");
//!     let config = Configuration::load("Library/ssdtlifecycle.json")?;
//!     let service = DeploymentService::new(
//!         Arc::new(LocalFileSystem),
//!         Arc::new(DotnetBuildService::new()),
//!         Arc::new(SqlPackageEngine::new(config.sql_package_path.clone())),
//!     );
//!     let summary = service
//!         .create_script(project, config, Version::new(1, 0, 0, 0), false, &CancellationToken::new())
//!         .await?;
//!     println!("{:?}", summary.deploy_script_path);
//!     Ok(())
//! }
//! ```

pub mod build;
pub mod config;
pub mod core;
pub mod dac;
pub mod error;
pub mod fs;
pub mod logging;
pub mod orchestrator;
pub mod process;
pub mod script;
pub mod version;

// Re-exports for convenient access
pub use build::DotnetBuildService;
pub use config::{Configuration, ConfigurationError, ConfigurationStore, UnnamedConstraintDropBehavior};
pub use core::{BuildService, DefaultConstraint, FileSystem, PathCollection, Project};
pub use dac::{DacAccess, DeployFiles, SchemaCompareEngine, SqlPackageEngine};
pub use error::{LifecycleError, Result};
pub use fs::LocalFileSystem;
pub use orchestrator::{DeploymentService, PipelineState, RunKind, RunStatus, RunSummary, StateModel};
pub use script::{ModifierPipeline, ModifierPriority, ModifierRegistry, ScriptModificationModel};
pub use version::{Version, VersionPattern};
