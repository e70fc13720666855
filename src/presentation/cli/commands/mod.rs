pub mod archive;
pub mod freeze;
pub mod revert;
pub mod status;
pub mod sync;

use crate::application::services::addons_resolver::AddonsResolver;
use crate::common::error::AdsyncError;
use crate::common::result::AdsyncResult;
use crate::domain::entities::manifest::ProvisionManifest;
use crate::infrastructure::vcs::Repo;
use std::path::Path;

/// Look up the repository handle for a manifest destination.
pub(crate) fn repo_for_dest(manifest_path: &Path, dest: &str) -> AdsyncResult<Box<dyn Repo>> {
    let manifest = ProvisionManifest::load_from_file(manifest_path)?;
    let root = ProvisionManifest::workspace_root(manifest_path);
    let resolver = AddonsResolver::new(root);

    resolver
        .manifest_repos(&manifest)?
        .into_iter()
        .find(|(entry_dest, _)| entry_dest == dest)
        .map(|(_, repo)| repo)
        .ok_or_else(|| {
            AdsyncError::workspace(format!("no destination `{dest}` in the manifest"))
        })
}
