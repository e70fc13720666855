use crate::domain::value_objects::vcs_type::VcsType;
use crate::infrastructure::process::{CommandRunner, CommandSpec, SystemCommandRunner};
use crate::infrastructure::vcs::path_arg;
use crate::infrastructure::vcs::repo::{Repo, RepoOptions, VcsError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const BZR: &str = "bzr";

/// Bazaar branch tied to a revision.
///
/// Branching uses `--stacked` to keep local storage small. Bazaar is
/// known to leave held locks behind after interrupted runs; the
/// `clear_locks` option removes them before any mutating command.
pub struct BzrRepo {
    target_dir: PathBuf,
    url: String,
    options: RepoOptions,
    runner: Arc<dyn CommandRunner>,
}

impl BzrRepo {
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

    async fn bzr(&self, args: &[&str]) -> Result<String, VcsError> {
        Ok(self
            .runner
            .run_checked(&CommandSpec::in_dir(BZR, args, &self.target_dir))
            .await?)
    }

    /// Remove the held-lock markers an interrupted bzr leaves behind.
    fn clear_locks_if_requested(&self) -> Result<(), VcsError> {
        if !self.options.clear_locks {
            return Ok(());
        }
        for section in ["branch", "checkout", "repository"] {
            let held = self
                .target_dir
                .join(".bzr")
                .join(section)
                .join("lock")
                .join("held");
            if held.exists() {
                warn!("clearing stale bzr lock {}", held.display());
                let result = if held.is_dir() {
                    std::fs::remove_dir_all(&held)
                } else {
                    std::fs::remove_file(&held)
                };
                result.map_err(|e| VcsError::io(&held, e))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Repo for BzrRepo {
    fn vcs_type(&self) -> VcsType {
        VcsType::Bzr
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
                    VcsType::Bzr,
                    &self.target_dir,
                    &self.url,
                ));
            }
            info!("{}> bzr branch --stacked {}", self.target_dir.display(), self.url);
            let mut args = vec!["branch", "--stacked"];
            if !revision.is_empty() {
                args.extend(["-r", revision]);
            }
            let target = path_arg(&self.target_dir);
            args.extend([self.url.as_str(), target.as_str()]);
            self.runner
                .run_checked(&CommandSpec::new(BZR, &args))
                .await?;
            return Ok(());
        }

        self.clear_locks_if_requested()?;

        if self.options.offline {
            info!(
                "offline mode: leaving {} untouched",
                self.target_dir.display()
            );
            return Ok(());
        }

        info!("{}> bzr pull {}", self.target_dir.display(), self.url);
        self.bzr(&["pull", &self.url]).await?;

        info!(
            "{}> bzr update {}",
            self.target_dir.display(),
            if revision.is_empty() { "(head)" } else { revision }
        );
        let mut args = vec!["update"];
        if !revision.is_empty() {
            args.extend(["-r", revision]);
        }
        self.bzr(&args).await?;
        Ok(())
    }

    /// Tree revision of the working copy.
    ///
    /// The default form is the dotted revision number; `pip_compatible`
    /// returns the globally unique revision id instead.
    async fn parents(&self, pip_compatible: bool) -> Result<Vec<String>, VcsError> {
        let out = self.bzr(&["revision-info", "--tree"]).await?;
        // "<revno> <revid>"
        let mut fields = out.split_whitespace();
        let revno = fields.next();
        let revid = fields.next();
        let wanted = if pip_compatible { revid } else { revno };
        Ok(wanted.map(str::to_string).into_iter().collect())
    }

    async fn uncommitted_changes(&self) -> Result<bool, VcsError> {
        let out = self.bzr(&["status"]).await?;
        Ok(!out.is_empty())
    }

    async fn clean(&self) -> Result<(), VcsError> {
        if !self.target_dir.is_dir() {
            return Ok(());
        }
        self.bzr(&["clean-tree", "--unknown", "--ignored", "--detritus", "--force"])
            .await?;
        Ok(())
    }

    async fn archive(&self, target_path: &Path) -> Result<(), VcsError> {
        if let Some(parent) = target_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| VcsError::io(parent, e))?;
        }
        self.bzr(&["export", &path_arg(target_path)]).await?;
        Ok(())
    }

    async fn revert(&self, revision: &str) -> Result<(), VcsError> {
        self.clear_locks_if_requested()?;
        self.bzr(&["revert"]).await?;
        if !revision.is_empty() {
            self.bzr(&["update", "-r", revision]).await?;
        }
        Ok(())
    }
}
