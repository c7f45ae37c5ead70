//! Core domain types and collaborator traits.
//!
//! - [`Project`] / [`ProjectProperties`]: the database project under migration
//! - [`PathCollection`]: absolute paths resolved for one run
//! - [`DefaultConstraint`]: default constraint identity used for drop repair
//! - [`FileSystem`] / [`BuildService`]: external collaborators

pub mod constraint;
pub mod paths;
pub mod project;
pub mod traits;

pub use constraint::DefaultConstraint;
pub use paths::{
    DeploySourcePaths, DeployTargetPaths, DirectoryPaths, PathCollection, LATEST_DIRECTORY_NAME,
};
pub use project::{Project, ProjectProperties};
pub use traits::{BuildService, CopyFailure, FileSystem};
