use super::bzr::BzrRepo;
use super::git::GitRepo;
use super::hg::HgRepo;
use super::local::LocalRepo;
use super::repo::{Repo, RepoOptions};
use super::svn::SvnRepo;
use crate::domain::value_objects::vcs_type::VcsType;
use crate::infrastructure::process::CommandRunner;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Builds the driver implementation for a VCS type tag
pub struct RepoFactory;

impl RepoFactory {
    /// Create a repository handle for the given backend.
    pub fn create_repo(
        vcs: VcsType,
        target_dir: PathBuf,
        url: String,
        options: RepoOptions,
    ) -> Box<dyn Repo> {
        match vcs {
            VcsType::Git => Box::new(GitRepo::new(target_dir, url, options)),
            VcsType::Hg => Box::new(HgRepo::new(target_dir, url, options)),
            VcsType::Bzr => Box::new(BzrRepo::new(target_dir, url, options)),
            VcsType::Svn => Box::new(SvnRepo::new(target_dir, url, options)),
            VcsType::Local => Box::new(LocalRepo::new(target_dir, options)),
        }
    }

    /// Create a repository handle with a custom command runner (tests,
    /// or callers with a specialized environment).
    pub fn create_repo_with_runner(
        vcs: VcsType,
        target_dir: PathBuf,
        url: String,
        options: RepoOptions,
        runner: Arc<dyn CommandRunner>,
    ) -> Box<dyn Repo> {
        match vcs {
            VcsType::Git => Box::new(GitRepo::with_runner(target_dir, url, options, runner)),
            VcsType::Hg => Box::new(HgRepo::with_runner(target_dir, url, options, runner)),
            VcsType::Bzr => Box::new(BzrRepo::with_runner(target_dir, url, options, runner)),
            VcsType::Svn => Box::new(SvnRepo::with_runner(target_dir, url, options, runner)),
            VcsType::Local => Box::new(LocalRepo::new(target_dir, options)),
        }
    }

    /// Detect the backend of an existing directory from its control
    /// directory marker.
    pub fn detect_vcs_type(path: &Path) -> Option<VcsType> {
        VcsType::VERSIONED
            .into_iter()
            .find(|vcs| match vcs.control_dir() {
                Some(marker) => path.join(marker).exists(),
                None => false,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_repo_instances() {
        for vcs in [
            VcsType::Git,
            VcsType::Hg,
            VcsType::Bzr,
            VcsType::Svn,
            VcsType::Local,
        ] {
            let repo = RepoFactory::create_repo(
                vcs,
                PathBuf::from("/work/addons/x"),
                "https://example.com/x".to_string(),
                RepoOptions::default(),
            );
            assert_eq!(repo.vcs_type(), vcs);
            assert_eq!(repo.target_dir(), Path::new("/work/addons/x"));
        }
    }

    #[test]
    fn test_detect_vcs_type() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(RepoFactory::detect_vcs_type(dir.path()), None);

        std::fs::create_dir(dir.path().join(".hg")).unwrap();
        assert_eq!(RepoFactory::detect_vcs_type(dir.path()), Some(VcsType::Hg));
    }
}
