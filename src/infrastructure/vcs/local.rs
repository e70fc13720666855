use crate::domain::value_objects::vcs_type::VcsType;
use crate::infrastructure::vcs::repo::{Repo, RepoOptions, VcsError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// A directory maintained by other tooling: a plain path, symlink
/// farm or copy that this tool references but never fetches.
pub struct LocalRepo {
    target_dir: PathBuf,
    options: RepoOptions,
}

impl LocalRepo {
    pub fn new(target_dir: PathBuf, options: RepoOptions) -> Self {
        Self {
            target_dir,
            options,
        }
    }
}

#[async_trait]
impl Repo for LocalRepo {
    fn vcs_type(&self) -> VcsType {
        VcsType::Local
    }

    fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    fn url(&self) -> &str {
        ""
    }

    fn options(&self) -> &RepoOptions {
        &self.options
    }

    /// Converging a local path only checks that it is there.
    async fn get_update(&self, _revision: &str) -> Result<(), VcsError> {
        if !self.target_dir.exists() {
            if self.options.offline {
                return Err(VcsError::offline_unavailable(
                    VcsType::Local,
                    &self.target_dir,
                    "",
                ));
            }
            // There is no source to materialize the path from either
            // way.
            return Err(VcsError::invalid_state(VcsType::Local, &self.target_dir));
        }
        info!("using local directory {}", self.target_dir.display());
        Ok(())
    }

    async fn parents(&self, _pip_compatible: bool) -> Result<Vec<String>, VcsError> {
        Ok(Vec::new())
    }

    async fn uncommitted_changes(&self) -> Result<bool, VcsError> {
        Ok(false)
    }

    async fn clean(&self) -> Result<(), VcsError> {
        Ok(())
    }

    /// Snapshot is a plain recursive copy.
    async fn archive(&self, target_path: &Path) -> Result<(), VcsError> {
        if !self.target_dir.is_dir() {
            return Err(VcsError::invalid_state(VcsType::Local, &self.target_dir));
        }
        std::fs::create_dir_all(target_path).map_err(|e| VcsError::io(target_path, e))?;
        for entry in WalkDir::new(&self.target_dir) {
            let entry = entry.map_err(|e| {
                let io = e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::Other, "walk aborted")
                });
                VcsError::io(&self.target_dir, io)
            })?;
            let rel = match entry.path().strip_prefix(&self.target_dir) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel,
                _ => continue,
            };
            let dest = target_path.join(rel);
            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest).map_err(|e| VcsError::io(&dest, e))?;
            } else {
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| VcsError::io(parent, e))?;
                }
                std::fs::copy(entry.path(), &dest).map_err(|e| VcsError::io(&dest, e))?;
            }
        }
        Ok(())
    }

    async fn revert(&self, _revision: &str) -> Result<(), VcsError> {
        Ok(())
    }
}
