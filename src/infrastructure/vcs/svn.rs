use crate::domain::value_objects::vcs_type::VcsType;
use crate::infrastructure::process::{CommandRunner, CommandSpec, SystemCommandRunner};
use crate::infrastructure::vcs::path_arg;
use crate::infrastructure::vcs::repo::{Repo, RepoOptions, VcsError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const SVN: &str = "svn";

/// Subversion checkout tied to a repository URL and revision.
///
/// Updating always runs `switch` before `update`: the URL may have
/// moved (between tags, typically) and plain `up` does not follow URL
/// changes. Network commands run `--non-interactive` so a credential
/// prompt can never hang an unattended run.
pub struct SvnRepo {
    target_dir: PathBuf,
    url: String,
    options: RepoOptions,
    runner: Arc<dyn CommandRunner>,
}

impl SvnRepo {
    pub fn new(target_dir: PathBuf, url: String, options: RepoOptions) -> Self {
        Self::with_runner(target_dir, url, options, Arc::new(SystemCommandRunner::new()))
    }

    /// Build a driver with a custom command runner (tests).
    pub fn with_runner(
        target_dir: PathBuf,
        url: String,
        options: RepoOptions,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            target_dir,
            url,
            options,
            runner,
        }
    }

    async fn svn(&self, args: &[&str]) -> Result<String, VcsError> {
        Ok(self
            .runner
            .run_checked(&CommandSpec::in_dir(SVN, args, &self.target_dir))
            .await?)
    }

    fn clear_locks_if_requested(&self) -> Result<(), VcsError> {
        if !self.options.clear_locks {
            return Ok(());
        }
        let lock = self.target_dir.join(".svn").join("lock");
        if lock.exists() {
            warn!("clearing stale svn lock {}", lock.display());
            std::fs::remove_file(&lock).map_err(|e| VcsError::io(&lock, e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl Repo for SvnRepo {
    fn vcs_type(&self) -> VcsType {
        VcsType::Svn
    }

    fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn options(&self) -> &RepoOptions {
        &self.options
    }

    async fn get_update(&self, revision: &str) -> Result<(), VcsError> {
        if !self.target_dir.exists() {
            if self.options.offline {
                return Err(VcsError::offline_unavailable(
                    VcsType::Svn,
                    &self.target_dir,
                    &self.url,
                ));
            }
            info!("{}> svn checkout {}", self.target_dir.display(), self.url);
            let mut args = vec!["checkout", "--non-interactive"];
            if !revision.is_empty() {
                args.extend(["--revision", revision]);
            }
            let target = path_arg(&self.target_dir);
            args.extend([self.url.as_str(), target.as_str()]);
            self.runner
                .run_checked(&CommandSpec::new(SVN, &args))
                .await?;
            return Ok(());
        }

        self.clear_locks_if_requested()?;

        if self.options.offline {
            info!(
                "offline mode: keeping checkout {} at its current revision",
                self.target_dir.display()
            );
            return Ok(());
        }

        // switch is necessary in order to move between tags
        info!("{}> svn switch {}", self.target_dir.display(), self.url);
        self.svn(&["switch", "--non-interactive", &self.url]).await?;

        info!(
            "{}> svn update {}",
            self.target_dir.display(),
            if revision.is_empty() { "(HEAD)" } else { revision }
        );
        let mut args = vec!["update", "--non-interactive"];
        if !revision.is_empty() {
            args.extend(["--revision", revision]);
        }
        self.svn(&args).await?;
        Ok(())
    }

    async fn parents(&self, _pip_compatible: bool) -> Result<Vec<String>, VcsError> {
        let out = self.svn(&["info", "--show-item", "revision"]).await?;
        Ok(out.split_whitespace().map(str::to_string).collect())
    }

    async fn uncommitted_changes(&self) -> Result<bool, VcsError> {
        // --quiet hides untracked files, leaving real modifications
        let out = self.svn(&["status", "--quiet"]).await?;
        Ok(!out.is_empty())
    }

    async fn clean(&self) -> Result<(), VcsError> {
        if !self.target_dir.is_dir() {
            return Ok(());
        }
        let out = self.svn(&["status", "--no-ignore"]).await?;
        for line in out.lines() {
            let flag = line.chars().next().unwrap_or(' ');
            if flag != '?' && flag != 'I' {
                continue;
            }
            // Status columns are fixed-width; the path starts at
            // column 8.
            let raw = line.get(8..).unwrap_or("").trim();
            if raw.is_empty() {
                continue;
            }
            let path = self.target_dir.join(raw);
            if path.is_dir() {
                std::fs::remove_dir_all(&path).map_err(|e| VcsError::io(&path, e))?;
            } else if path.exists() {
                std::fs::remove_file(&path).map_err(|e| VcsError::io(&path, e))?;
            }
        }
        Ok(())
    }

    async fn archive(&self, target_path: &Path) -> Result<(), VcsError> {
        if let Some(parent) = target_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| VcsError::io(parent, e))?;
        }
        self.svn(&["export", "--force", ".", &path_arg(target_path)])
            .await?;
        Ok(())
    }

    async fn revert(&self, revision: &str) -> Result<(), VcsError> {
        if !self.is_versioned() {
            return Err(VcsError::invalid_state(VcsType::Svn, &self.target_dir));
        }
        self.clear_locks_if_requested()?;
        self.svn(&["revert", "--recursive", "."]).await?;
        let mut args = vec!["update", "--non-interactive"];
        if !revision.is_empty() {
            args.extend(["--revision", revision]);
        }
        self.svn(&args).await?;
        Ok(())
    }
}
