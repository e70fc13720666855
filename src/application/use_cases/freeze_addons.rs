use crate::application::services::addons_resolver::AddonsResolver;
use crate::domain::entities::manifest::{ManifestError, ProvisionManifest};
use crate::domain::value_objects::vcs_type::VcsType;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors aborting a freeze run
#[derive(Debug, Error)]
pub enum FreezeAddonsError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Freeze run settings
#[derive(Debug, Clone)]
pub struct FreezeAddonsConfig {
    /// Manifest file to read
    pub manifest_path: PathBuf,
}

impl FreezeAddonsConfig {
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
        }
    }
}

/// One pinned working copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreezePin {
    /// Target directory as written in the manifest
    pub dest: String,
    /// Backend handling the entry
    pub vcs: VcsType,
    /// Pin-compatible revision identifier
    pub revision: String,
}

/// Aggregated result of a freeze run
#[derive(Debug, Clone, Default, Serialize)]
pub struct FreezeResult {
    /// Pins for every versioned entry, in manifest order
    pub pins: Vec<FreezePin>,
    /// Entries that could not be pinned
    pub errors: Vec<String>,
}

impl FreezeResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Read the exact revision every versioned working copy sits at, in a
/// form usable as a dependency pin; the release-tool side of the
/// introspection surface. Local entries carry no revision and are
/// skipped.
pub struct FreezeAddonsUseCase {
    config: FreezeAddonsConfig,
}

impl FreezeAddonsUseCase {
    pub fn new(config: FreezeAddonsConfig) -> Self {
        Self { config }
    }

    pub async fn execute(&self) -> Result<FreezeResult, FreezeAddonsError> {
        let manifest = ProvisionManifest::load_from_file(&self.config.manifest_path)?;
        let root = ProvisionManifest::workspace_root(&self.config.manifest_path);
        let resolver = AddonsResolver::new(root);

        let mut result = FreezeResult::default();
        for (dest, repo) in resolver.manifest_repos(&manifest)? {
            if repo.vcs_type() == VcsType::Local {
                continue;
            }
            if !repo.is_versioned() {
                result.errors.push(format!(
                    "{}: not a {} working copy, sync it first",
                    dest,
                    repo.vcs_type()
                ));
                continue;
            }
            match repo.parents(true).await {
                Ok(parents) => match parents.into_iter().next() {
                    Some(revision) => result.pins.push(FreezePin {
                        dest,
                        vcs: repo.vcs_type(),
                        revision,
                    }),
                    None => result
                        .errors
                        .push(format!("{dest}: working copy has no revision")),
                },
                Err(err) => result.errors.push(format!("{dest}: {err}")),
            }
        }

        Ok(result)
    }
}
