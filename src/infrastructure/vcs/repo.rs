use crate::domain::value_objects::vcs_type::VcsType;
use crate::infrastructure::process::CommandError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Cross-cutting behavior switches for one repository handle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepoOptions {
    /// Forbid any network operation; operate only on local state
    pub offline: bool,
    /// Remove stale VCS lock files before operating (Bazaar,
    /// Subversion)
    pub clear_locks: bool,
    /// Merge the requested revision into the current branch instead of
    /// checking it out (Git)
    pub merge: bool,
}

impl RepoOptions {
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_clear_locks(mut self, clear_locks: bool) -> Self {
        self.clear_locks = clear_locks;
        self
    }

    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }
}

/// Errors raised by the VCS drivers
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("{vcs} working copy {path} does not exist; cannot fetch it from {url} (offline mode)")]
    OfflineUnavailable {
        vcs: VcsType,
        path: PathBuf,
        url: String,
    },

    /// An underlying tool invocation failed; carries the command line,
    /// exit code and captured stderr
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("{path} is not a valid {vcs} working copy")]
    InvalidRepositoryState { vcs: VcsType, path: PathBuf },

    #[error("filesystem operation on {path} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VcsError {
    pub fn offline_unavailable(vcs: VcsType, path: &Path, url: &str) -> Self {
        Self::OfflineUnavailable {
            vcs,
            path: path.to_path_buf(),
            url: url.to_string(),
        }
    }

    pub fn invalid_state(vcs: VcsType, path: &Path) -> Self {
        Self::InvalidRepositoryState {
            vcs,
            path: path.to_path_buf(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One working copy to converge.
///
/// A handle is built per addons line, used for one [`get_update`] plus
/// any introspection calls, then discarded; all durable state lives on
/// disk in the working copy. Handles for distinct target directories
/// are independent; calls against the same directory must be
/// serialized by the caller.
///
/// [`get_update`]: Repo::get_update
#[async_trait]
pub trait Repo: Send + Sync {
    /// Backend tag of this driver.
    fn vcs_type(&self) -> VcsType;

    /// Absolute path of the working copy (may not exist yet).
    fn target_dir(&self) -> &Path;

    /// Remote URL or local source path.
    fn url(&self) -> &str;

    /// The behavior switches this handle was built with.
    fn options(&self) -> &RepoOptions;

    /// True if the target carries this backend's control directory.
    fn is_versioned(&self) -> bool {
        match self.vcs_type().control_dir() {
            Some(marker) => self.target_dir().join(marker).exists(),
            None => self.target_dir().exists(),
        }
    }

    /// Converge the working copy to `revision` (empty string: backend
    /// default).
    ///
    /// Idempotent. Creates the working copy from [`url`] when the
    /// target does not exist, refreshes remote state and moves the
    /// working copy otherwise. In offline mode a missing target is
    /// [`VcsError::OfflineUnavailable`] and an existing one is left
    /// untouched.
    ///
    /// [`url`]: Repo::url
    async fn get_update(&self, revision: &str) -> Result<(), VcsError>;

    /// Current revision identifier(s) of the working copy, normally
    /// one, more when a merge is in progress. With `pip_compatible`
    /// the identifiers are usable as dependency pins.
    async fn parents(&self, pip_compatible: bool) -> Result<Vec<String>, VcsError>;

    /// True if the working copy has local modifications.
    async fn uncommitted_changes(&self) -> Result<bool, VcsError>;

    /// Remove untracked and ignored files. No-op if the working copy
    /// does not exist.
    async fn clean(&self) -> Result<(), VcsError>;

    /// Export a snapshot of the current revision's file tree into
    /// `target_path`, without VCS metadata.
    async fn archive(&self, target_path: &Path) -> Result<(), VcsError>;

    /// Force the working copy to exactly match `revision`, discarding
    /// local changes.
    async fn revert(&self, revision: &str) -> Result<(), VcsError>;
}

impl std::fmt::Debug for dyn Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repo")
            .field("vcs_type", &self.vcs_type())
            .field("target_dir", &self.target_dir())
            .field("url", &self.url())
            .field("options", self.options())
            .finish()
    }
}
