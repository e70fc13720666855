use crate::domain::value_objects::vcs_type::VcsType;
use crate::infrastructure::process::{CommandRunner, CommandSpec, SystemCommandRunner};
use crate::infrastructure::vcs::path_arg;
use crate::infrastructure::vcs::repo::{Repo, RepoOptions, VcsError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const GIT: &str = "git";
const ORIGIN: &str = "origin";

/// Git working copy tied to a reference branch, tag or commit.
///
/// Cloning is implemented as `init` + `remote add` + `fetch` +
/// `checkout` rather than a single `clone`, so the remote URL can be
/// rewritten with `set-url` on every later call; an upstream that
/// moved between runs never forces a fresh clone.
pub struct GitRepo {
    target_dir: PathBuf,
    url: String,
    options: RepoOptions,
    runner: Arc<dyn CommandRunner>,
}

impl GitRepo {
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

    fn spec(&self, args: &[&str]) -> CommandSpec {
        CommandSpec::in_dir(GIT, args, &self.target_dir)
    }

    /// Run git in the working copy, failing on non-zero exit.
    async fn git(&self, args: &[&str]) -> Result<String, VcsError> {
        Ok(self.runner.run_checked(&self.spec(args)).await?)
    }

    /// `checkout <name>` behaves identically for tags, hashes and
    /// branches, but only a branch checkout may be fast-forwarded
    /// against its remote counterpart afterwards.
    async fn is_a_branch(&self, revision: &str) -> Result<bool, VcsError> {
        let branches = self.git(&["branch", "--list", revision]).await?;
        Ok(!branches.is_empty())
    }

    /// Resolve the remote's default head for an empty revision spec.
    async fn default_branch(&self) -> Result<String, VcsError> {
        let out = self
            .git(&["ls-remote", "--symref", ORIGIN, "HEAD"])
            .await?;
        for line in out.lines() {
            if let Some(rest) = line.strip_prefix("ref: refs/heads/") {
                if let Some(name) = rest.split_whitespace().next() {
                    return Ok(name.to_string());
                }
            }
        }
        // The remote did not advertise a symref; detach at the fetched
        // tip instead.
        Ok("FETCH_HEAD".to_string())
    }

    /// The `merge` option: pull the revision into whatever branch is
    /// currently checked out instead of moving to it.
    async fn merge_from_source(&self, revision: &str) -> Result<(), VcsError> {
        if !self.is_versioned() {
            return Err(VcsError::invalid_state(VcsType::Git, &self.target_dir));
        }
        if self.options.offline {
            info!(
                "offline mode: not merging {} into {}",
                revision,
                self.target_dir.display()
            );
            return Ok(());
        }
        info!(
            "{}> git pull --no-edit {} {}",
            self.target_dir.display(),
            self.url,
            revision
        );
        self.git(&["pull", "--no-edit", &self.url, revision]).await?;
        Ok(())
    }
}

#[async_trait]
impl Repo for GitRepo {
    fn vcs_type(&self) -> VcsType {
        VcsType::Git
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
        if self.options.merge {
            return self.merge_from_source(revision).await;
        }

        if !self.target_dir.exists() {
            if self.options.offline {
                return Err(VcsError::offline_unavailable(
                    VcsType::Git,
                    &self.target_dir,
                    &self.url,
                ));
            }
            info!("{}> git init", self.target_dir.display());
            self.runner
                .run_checked(&CommandSpec::new(GIT, &["init", &path_arg(&self.target_dir)]))
                .await?;
            info!(
                "{}> git remote add {} {}",
                self.target_dir.display(),
                ORIGIN,
                self.url
            );
            self.git(&["remote", "add", ORIGIN, &self.url]).await?;
        } else if self.options.offline {
            info!(
                "offline mode: leaving {} untouched",
                self.target_dir.display()
            );
            return Ok(());
        }

        // The upstream URL may have changed since the last run; rewrite
        // it before fetching. A clone made outside this tool may lack
        // the remote entirely, so fall back to adding it.
        info!(
            "{}> git remote set-url {} {}",
            self.target_dir.display(),
            ORIGIN,
            self.url
        );
        let set_url = self
            .runner
            .output(&self.spec(&["remote", "set-url", ORIGIN, &self.url]))
            .await?;
        if !set_url.success() {
            self.git(&["remote", "add", ORIGIN, &self.url]).await?;
        }

        info!("{}> git fetch {}", self.target_dir.display(), ORIGIN);
        self.git(&["fetch", ORIGIN]).await?;

        let revision = if revision.is_empty() {
            self.default_branch().await?
        } else {
            revision.to_string()
        };

        info!("{}> git checkout {}", self.target_dir.display(), revision);
        self.git(&["checkout", &revision]).await?;

        if self.is_a_branch(&revision).await? {
            // fast forward
            info!(
                "{}> git merge --ff-only {}/{}",
                self.target_dir.display(),
                ORIGIN,
                revision
            );
            self.git(&["merge", "--ff-only", &format!("{ORIGIN}/{revision}")])
                .await?;
        }

        Ok(())
    }

    /// Full hash of the checked-out commit(s).
    ///
    /// `pip_compatible` is ignored: every Git revspec already is.
    async fn parents(&self, _pip_compatible: bool) -> Result<Vec<String>, VcsError> {
        let out = self.git(&["rev-parse", "--verify", "HEAD"]).await?;
        Ok(out.split_whitespace().map(str::to_string).collect())
    }

    async fn uncommitted_changes(&self) -> Result<bool, VcsError> {
        let out = self.git(&["status", "--short"]).await?;
        Ok(!out.is_empty())
    }

    async fn clean(&self) -> Result<(), VcsError> {
        if !self.target_dir.is_dir() {
            return Ok(());
        }
        self.git(&["clean", "-fdqx"]).await?;
        Ok(())
    }

    async fn archive(&self, target_path: &Path) -> Result<(), VcsError> {
        let head = self
            .parents(false)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VcsError::invalid_state(VcsType::Git, &self.target_dir))?;

        std::fs::create_dir_all(target_path).map_err(|e| VcsError::io(target_path, e))?;

        // `git archive` cannot stream into a directory uniformly across
        // supported tool versions; go through a tarball.
        let tarball = tempfile::Builder::new()
            .prefix("adsync-archive-")
            .suffix(".tar")
            .tempfile()
            .map_err(|e| VcsError::io(target_path, e))?;
        self.git(&["archive", &head, "-o", &path_arg(tarball.path())])
            .await?;

        let file =
            std::fs::File::open(tarball.path()).map_err(|e| VcsError::io(tarball.path(), e))?;
        tar::Archive::new(file)
            .unpack(target_path)
            .map_err(|e| VcsError::io(target_path, e))?;
        Ok(())
    }

    async fn revert(&self, revision: &str) -> Result<(), VcsError> {
        let revision = if revision.is_empty() { "HEAD" } else { revision };
        self.git(&["checkout", revision]).await?;
        if revision != "HEAD" && self.is_a_branch(revision).await? {
            self.git(&["reset", "--hard", &format!("{ORIGIN}/{revision}")])
                .await?;
        } else {
            self.git(&["reset", "--hard", revision]).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::process::command_runner::testing::ScriptedRunner;

    fn repo_at(dir: &Path, options: RepoOptions) -> (GitRepo, Arc<ScriptedRunner>) {
        let runner = Arc::new(ScriptedRunner::new());
        let repo = GitRepo::with_runner(
            dir.to_path_buf(),
            "https://example.com/a.git".to_string(),
            options,
            runner.clone(),
        );
        (repo, runner)
    }

    fn existing_clone() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_offline_and_missing_fails_without_commands() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing");
        let (repo, runner) = repo_at(&target, RepoOptions::default().with_offline(true));

        let err = repo.get_update("v1").await.unwrap_err();
        assert!(matches!(err, VcsError::OfflineUnavailable { .. }));
        assert!(runner.calls().is_empty());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_offline_and_existing_skips_every_command() {
        let dir = existing_clone();
        let (repo, runner) = repo_at(dir.path(), RepoOptions::default().with_offline(true));

        repo.get_update("main").await.unwrap();
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_sequence_for_tag() {
        let dir = existing_clone();
        let (repo, runner) = repo_at(dir.path(), RepoOptions::default());

        // set-url, fetch, checkout, branch --list (empty: not a branch)
        repo.get_update("v1").await.unwrap();
        assert_eq!(
            runner.command_lines(),
            vec![
                "git remote set-url origin https://example.com/a.git",
                "git fetch origin",
                "git checkout v1",
                "git branch --list v1",
            ]
        );
        for call in runner.calls() {
            assert_eq!(call.cwd.as_deref(), Some(dir.path()));
        }
    }

    #[tokio::test]
    async fn test_update_fast_forwards_branches_only() {
        let dir = existing_clone();
        let (repo, runner) = repo_at(dir.path(), RepoOptions::default());

        runner.push_stdout(""); // set-url
        runner.push_stdout(""); // fetch
        runner.push_stdout(""); // checkout
        runner.push_stdout("* main"); // branch --list: it is a branch

        repo.get_update("main").await.unwrap();
        assert_eq!(
            runner.command_lines().last().unwrap(),
            "git merge --ff-only origin/main"
        );
    }

    #[tokio::test]
    async fn test_fresh_clone_initializes_then_fetches() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("wc");
        let (repo, runner) = repo_at(&target, RepoOptions::default());

        repo.get_update("v1").await.unwrap();
        let lines = runner.command_lines();
        assert_eq!(lines[0], format!("git init {}", target.display()));
        assert_eq!(lines[1], "git remote add origin https://example.com/a.git");
        assert_eq!(lines[2], "git remote set-url origin https://example.com/a.git");
        assert_eq!(lines[3], "git fetch origin");
        assert_eq!(lines[4], "git checkout v1");

        // init runs from the parent's directory, everything else in
        // the working copy
        assert_eq!(runner.calls()[0].cwd, None);
        assert_eq!(runner.calls()[1].cwd.as_deref(), Some(target.as_path()));
    }

    #[tokio::test]
    async fn test_missing_remote_is_added_back() {
        let dir = existing_clone();
        let (repo, runner) = repo_at(dir.path(), RepoOptions::default());

        runner.push_failure(128, "error: No such remote 'origin'");

        repo.get_update("v1").await.unwrap();
        assert_eq!(
            runner.command_lines()[1],
            "git remote add origin https://example.com/a.git"
        );
    }

    #[tokio::test]
    async fn test_empty_revision_resolves_remote_default() {
        let dir = existing_clone();
        let (repo, runner) = repo_at(dir.path(), RepoOptions::default());

        runner.push_stdout(""); // set-url
        runner.push_stdout(""); // fetch
        runner.push_stdout("ref: refs/heads/main\tHEAD\nabc123\tHEAD"); // ls-remote
        runner.push_stdout(""); // checkout
        runner.push_stdout("* main"); // branch --list

        repo.get_update("").await.unwrap();
        let lines = runner.command_lines();
        assert!(lines.contains(&"git ls-remote --symref origin HEAD".to_string()));
        assert!(lines.contains(&"git checkout main".to_string()));
        assert_eq!(lines.last().unwrap(), "git merge --ff-only origin/main");
    }

    #[tokio::test]
    async fn test_merge_option_pulls_into_current_branch() {
        let dir = existing_clone();
        let (repo, runner) = repo_at(dir.path(), RepoOptions::default().with_merge(true));

        repo.get_update("feature").await.unwrap();
        assert_eq!(
            runner.command_lines(),
            vec!["git pull --no-edit https://example.com/a.git feature"]
        );
    }

    #[tokio::test]
    async fn test_merge_option_requires_working_copy() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing");
        let (repo, runner) = repo_at(&target, RepoOptions::default().with_merge(true));

        let err = repo.get_update("feature").await.unwrap_err();
        assert!(matches!(err, VcsError::InvalidRepositoryState { .. }));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_parents_returns_head_hash() {
        let dir = existing_clone();
        let (repo, runner) = repo_at(dir.path(), RepoOptions::default());

        runner.push_stdout("deadbeef\n");
        let parents = repo.parents(true).await.unwrap();
        assert_eq!(parents, vec!["deadbeef".to_string()]);
        assert_eq!(runner.command_lines(), vec!["git rev-parse --verify HEAD"]);
    }

    #[tokio::test]
    async fn test_command_failure_propagates() {
        let dir = existing_clone();
        let (repo, runner) = repo_at(dir.path(), RepoOptions::default());

        runner.push_stdout(""); // set-url
        runner.push_failure(128, "fatal: could not read from remote"); // fetch

        let err = repo.get_update("v1").await.unwrap_err();
        match err {
            VcsError::Command(e) => {
                assert!(e.to_string().contains("git fetch origin"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clean_skips_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing");
        let (repo, runner) = repo_at(&target, RepoOptions::default());

        repo.clean().await.unwrap();
        assert!(runner.calls().is_empty());
    }
}
