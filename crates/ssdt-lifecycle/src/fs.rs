//! Local disk implementation of [`FileSystem`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::core::{CopyFailure, FileSystem};
use crate::error::Result;

/// [`FileSystem`] backed by `tokio::fs`.
#[derive(Debug, Default, Clone)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn read_file(&self, path: &Path) -> Result<String> {
        Ok(tokio::fs::read_to_string(path).await?)
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        debug!("Wrote {} bytes to {:?}", content.len(), path);
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn list_directories(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut directories = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                directories.push(entry.path());
            }
        }
        directories.sort();
        Ok(directories)
    }

    async fn list_files(&self, path: &Path, extension: &str) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(extension))
                .unwrap_or(false);
            if matches && entry.file_type().await?.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    async fn copy_files(&self, sources: &[PathBuf], target_directory: &Path) -> Vec<CopyFailure> {
        let mut failures = Vec::new();

        if let Err(e) = tokio::fs::create_dir_all(target_directory).await {
            return sources
                .iter()
                .map(|source| CopyFailure {
                    source: source.clone(),
                    message: e.to_string(),
                })
                .collect();
        }

        for source in sources {
            let Some(file_name) = source.file_name() else {
                failures.push(CopyFailure {
                    source: source.clone(),
                    message: "path has no file name".to_string(),
                });
                continue;
            };
            let target = target_directory.join(file_name);
            match tokio::fs::copy(source, &target).await {
                Ok(bytes) => debug!("Copied {:?} to {:?} ({} bytes)", source, target, bytes),
                Err(e) => failures.push(CopyFailure {
                    source: source.clone(),
                    message: e.to_string(),
                }),
            }
        }

        failures
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }

    async fn delete_directory(&self, path: &Path) -> Vec<String> {
        let mut errors = Vec::new();
        delete_tree(path, &mut errors).await;
        errors
    }
}

/// Depth-first removal that keeps going after failures.
async fn delete_tree(root: &Path, errors: &mut Vec<String>) {
    let mut stack = vec![(root.to_path_buf(), false)];

    while let Some((dir, visited)) = stack.pop() {
        if visited {
            if let Err(e) = tokio::fs::remove_dir(&dir).await {
                errors.push(format!("{}: {}", dir.display(), e));
            }
            continue;
        }

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                errors.push(format!("{}: {}", dir.display(), e));
                continue;
            }
        };

        stack.push((dir.clone(), true));
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    errors.push(format!("{}: {}", dir.display(), e));
                    break;
                }
            };
            let path = entry.path();
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                stack.push((path, false));
            } else if let Err(e) = tokio::fs::remove_file(&path).await {
                errors.push(format!("{}: {}", path.display(), e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let path = dir.path().join("a").join("b").join("script.sql");

        fs.write_file(&path, "PRINT 1").await.unwrap();
        assert_eq!(fs.read_file(&path).await.unwrap(), "PRINT 1");

        fs.write_file(&path, "PRINT 2").await.unwrap();
        assert_eq!(fs.read_file(&path).await.unwrap(), "PRINT 2");
    }

    #[tokio::test]
    async fn test_list_and_copy() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let bin = dir.path().join("bin");
        fs.write_file(&bin.join("Db.dacpac"), "x").await.unwrap();
        fs.write_file(&bin.join("master.DACPAC"), "y").await.unwrap();
        fs.write_file(&bin.join("Db.dll"), "z").await.unwrap();

        let files = fs.list_files(&bin, "dacpac").await.unwrap();
        assert_eq!(files.len(), 2);

        let mut sources = files.clone();
        sources.push(bin.join("missing.dacpac"));
        let failures = fs.copy_files(&sources, &dir.path().join("out")).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].source, bin.join("missing.dacpac"));
        assert!(fs.exists(&dir.path().join("out").join("Db.dacpac")).await);
    }

    #[tokio::test]
    async fn test_delete_directory_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let root = dir.path().join("latest");
        fs.write_file(&root.join("nested").join("a.sql"), "a").await.unwrap();
        fs.write_file(&root.join("b.dacpac"), "b").await.unwrap();

        assert_eq!(fs.list_directories(dir.path()).await.unwrap(), vec![root.clone()]);

        let errors = fs.delete_directory(&root).await;
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(!fs.exists(&root).await);
    }

    #[tokio::test]
    async fn test_delete_missing_directory_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let errors = LocalFileSystem::new()
            .delete_directory(&dir.path().join("nope"))
            .await;
        assert_eq!(errors.len(), 1);
    }
}
