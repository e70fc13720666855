use crate::domain::value_objects::vcs_type::VcsType;
use crate::infrastructure::process::{CommandRunner, CommandSpec, SystemCommandRunner};
use crate::infrastructure::vcs::path_arg;
use crate::infrastructure::vcs::repo::{Repo, RepoOptions, VcsError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const HG: &str = "hg";

/// Mercurial working copy tied to a changeset, tag or branch.
pub struct HgRepo {
    target_dir: PathBuf,
    url: String,
    options: RepoOptions,
    runner: Arc<dyn CommandRunner>,
}

impl HgRepo {
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

    async fn hg(&self, args: &[&str]) -> Result<String, VcsError> {
        Ok(self
            .runner
            .run_checked(&CommandSpec::in_dir(HG, args, &self.target_dir))
            .await?)
    }
}

#[async_trait]
impl Repo for HgRepo {
    fn vcs_type(&self) -> VcsType {
        VcsType::Hg
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
                    VcsType::Hg,
                    &self.target_dir,
                    &self.url,
                ));
            }
            info!("{}> hg clone {}", self.target_dir.display(), self.url);
            let mut args = vec!["clone"];
            if !revision.is_empty() {
                args.extend(["-r", revision]);
            }
            let target = path_arg(&self.target_dir);
            args.extend([self.url.as_str(), target.as_str()]);
            self.runner
                .run_checked(&CommandSpec::new(HG, &args))
                .await?;
            return Ok(());
        }

        if self.options.offline {
            info!(
                "offline mode: leaving {} untouched",
                self.target_dir.display()
            );
            return Ok(());
        }

        info!("{}> hg pull", self.target_dir.display());
        self.hg(&["pull"]).await?;

        info!(
            "{}> hg update {}",
            self.target_dir.display(),
            if revision.is_empty() { "(tip)" } else { revision }
        );
        let mut args = vec!["update"];
        if !revision.is_empty() {
            args.extend(["-r", revision]);
        }
        self.hg(&args).await?;
        Ok(())
    }

    /// Parent changeset(s) of the working copy, two while a merge is
    /// in progress.
    async fn parents(&self, pip_compatible: bool) -> Result<Vec<String>, VcsError> {
        // pip pins need the full node; local revision numbers are more
        // readable everywhere else
        let template = if pip_compatible {
            "{node}\n"
        } else {
            "{rev}\n"
        };
        let out = self.hg(&["parents", "--template", template]).await?;
        Ok(out.split_whitespace().map(str::to_string).collect())
    }

    async fn uncommitted_changes(&self) -> Result<bool, VcsError> {
        let out = self.hg(&["status"]).await?;
        Ok(!out.is_empty())
    }

    async fn clean(&self) -> Result<(), VcsError> {
        if !self.target_dir.is_dir() {
            return Ok(());
        }
        // No purge extension required: list unknown and ignored files,
        // then delete them ourselves.
        let out = self
            .hg(&["status", "--no-status", "--unknown", "--ignored"])
            .await?;
        for line in out.lines() {
            let path = self.target_dir.join(line.trim());
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
        self.hg(&["archive", &path_arg(target_path)]).await?;
        Ok(())
    }

    async fn revert(&self, revision: &str) -> Result<(), VcsError> {
        let mut args = vec!["update", "--clean"];
        if !revision.is_empty() {
            args.extend(["-r", revision]);
        }
        self.hg(&args).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::process::command_runner::testing::ScriptedRunner;

    fn repo_at(dir: &Path, options: RepoOptions) -> (HgRepo, Arc<ScriptedRunner>) {
        let runner = Arc::new(ScriptedRunner::new());
        let repo = HgRepo::with_runner(
            dir.to_path_buf(),
            "https://example.com/b".to_string(),
            options,
            runner.clone(),
        );
        (repo, runner)
    }

    fn existing_clone() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".hg")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_offline_and_missing_fails_without_commands() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing");
        let (repo, runner) = repo_at(&target, RepoOptions::default().with_offline(true));

        let err = repo.get_update("default").await.unwrap_err();
        assert!(matches!(err, VcsError::OfflineUnavailable { .. }));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_offline_and_existing_skips_every_command() {
        let dir = existing_clone();
        let (repo, runner) = repo_at(dir.path(), RepoOptions::default().with_offline(true));

        repo.get_update("default").await.unwrap();
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fresh_clone_pins_revision() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("wc");
        let (repo, runner) = repo_at(&target, RepoOptions::default());

        repo.get_update("1.4").await.unwrap();
        assert_eq!(
            runner.command_lines(),
            vec![format!(
                "hg clone -r 1.4 https://example.com/b {}",
                target.display()
            )]
        );
    }

    #[tokio::test]
    async fn test_update_pulls_then_updates() {
        let dir = existing_clone();
        let (repo, runner) = repo_at(dir.path(), RepoOptions::default());

        repo.get_update("stable").await.unwrap();
        assert_eq!(
            runner.command_lines(),
            vec!["hg pull", "hg update -r stable"]
        );
    }

    #[tokio::test]
    async fn test_empty_revision_updates_to_tip() {
        let dir = existing_clone();
        let (repo, runner) = repo_at(dir.path(), RepoOptions::default());

        repo.get_update("").await.unwrap();
        assert_eq!(runner.command_lines(), vec!["hg pull", "hg update"]);
    }

    #[tokio::test]
    async fn test_parents_templates() {
        let dir = existing_clone();
        let (repo, runner) = repo_at(dir.path(), RepoOptions::default());

        runner.push_stdout("f00dfeed\n");
        let pins = repo.parents(true).await.unwrap();
        assert_eq!(pins, vec!["f00dfeed".to_string()]);

        runner.push_stdout("42\n");
        let revs = repo.parents(false).await.unwrap();
        assert_eq!(revs, vec!["42".to_string()]);

        let lines = runner.command_lines();
        assert!(lines[0].contains("{node}"));
        assert!(lines[1].contains("{rev}"));
    }

    #[tokio::test]
    async fn test_clean_removes_listed_files() {
        let dir = existing_clone();
        std::fs::write(dir.path().join("stray.pyc"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("build")).unwrap();

        let (repo, runner) = repo_at(dir.path(), RepoOptions::default());
        runner.push_stdout("stray.pyc\nbuild\n");

        repo.clean().await.unwrap();
        assert!(!dir.path().join("stray.pyc").exists());
        assert!(!dir.path().join("build").exists());
    }
}
