pub mod bzr;
pub mod factory;
pub mod git;
pub mod hg;
pub mod local;
pub mod repo;
pub mod svn;

pub use factory::RepoFactory;
pub use repo::{Repo, RepoOptions, VcsError};

use std::path::Path;

/// Render a path as a command-line argument.
pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
