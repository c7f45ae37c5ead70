//! Collaborator traits the pipeline depends on.
//!
//! - [`FileSystem`]: file access for reading projects and writing artifacts
//! - [`BuildService`]: builds the database project
//!
//! The orchestrator works with `Arc<dyn ...>` so tests can swap in
//! in-memory implementations.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::Project;
use crate::error::Result;

/// A file that could not be copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFailure {
    pub source: PathBuf,
    pub message: String,
}

/// File system access used by work units.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Read a whole text file.
    async fn read_file(&self, path: &Path) -> Result<String>;

    /// Write a text file, creating parent directories. Existing files are truncated.
    async fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Check whether a file or directory exists.
    async fn exists(&self, path: &Path) -> bool;

    /// Immediate subdirectories of `path`.
    async fn list_directories(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Files directly in `path` whose extension matches (case-insensitive).
    async fn list_files(&self, path: &Path, extension: &str) -> Result<Vec<PathBuf>>;

    /// Copy each file into `target_directory`, keeping file names.
    ///
    /// Returns the failures; the remaining files are still copied.
    async fn copy_files(&self, sources: &[PathBuf], target_directory: &Path) -> Vec<CopyFailure>;

    /// Delete a file.
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// Recursively delete a directory, continuing past failures.
    ///
    /// Returns a message for every entry that could not be removed.
    async fn delete_directory(&self, path: &Path) -> Vec<String>;
}

/// Builds a database project.
///
/// Success is judged by the caller from the build output on disk.
#[async_trait]
pub trait BuildService: Send + Sync {
    async fn build(&self, project: &Project, cancel: &CancellationToken) -> Result<()>;
}
