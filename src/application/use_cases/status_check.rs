use crate::application::services::addons_resolver::AddonsResolver;
use crate::domain::entities::manifest::{ManifestError, ProvisionManifest};
use crate::domain::value_objects::vcs_type::VcsType;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors aborting a status run
#[derive(Debug, Error)]
pub enum StatusCheckError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Status run settings
#[derive(Debug, Clone)]
pub struct StatusCheckConfig {
    /// Manifest file to read
    pub manifest_path: PathBuf,
}

impl StatusCheckConfig {
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
        }
    }
}

/// Observable state of one working copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryState {
    /// Target directory does not exist
    Missing,
    /// Working copy matches its last committed state
    Clean,
    /// Working copy has local modifications
    Dirty,
    /// Plain local path, nothing to introspect
    Local,
    /// Introspection itself failed
    Error,
}

/// Per-repository status report
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryStatus {
    /// Target directory as written in the manifest
    pub dest: String,
    /// Backend handling the entry
    pub vcs: VcsType,
    /// Observed state
    pub state: RepositoryState,
    /// Current revision identifier(s), when readable
    pub revisions: Vec<String>,
    /// Failure message, when `state` is [`RepositoryState::Error`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated result of a status run
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusResult {
    /// Per-repository reports, in manifest order
    pub repositories: Vec<RepositoryStatus>,
}

impl StatusResult {
    pub fn dirty_count(&self) -> usize {
        self.repositories
            .iter()
            .filter(|repo| repo.state == RepositoryState::Dirty)
            .count()
    }

    pub fn missing_count(&self) -> usize {
        self.repositories
            .iter()
            .filter(|repo| repo.state == RepositoryState::Missing)
            .count()
    }
}

/// Report the observable state of every manifest entry without
/// touching any of them.
pub struct StatusCheckUseCase {
    config: StatusCheckConfig,
}

impl StatusCheckUseCase {
    pub fn new(config: StatusCheckConfig) -> Self {
        Self { config }
    }

    pub async fn execute(&self) -> Result<StatusResult, StatusCheckError> {
        let manifest = ProvisionManifest::load_from_file(&self.config.manifest_path)?;
        let root = ProvisionManifest::workspace_root(&self.config.manifest_path);
        let resolver = AddonsResolver::new(root);

        let mut result = StatusResult::default();
        for (dest, repo) in resolver.manifest_repos(&manifest)? {
            let vcs = repo.vcs_type();

            if vcs == VcsType::Local {
                result.repositories.push(RepositoryStatus {
                    dest,
                    vcs,
                    state: if repo.target_dir().exists() {
                        RepositoryState::Local
                    } else {
                        RepositoryState::Missing
                    },
                    revisions: Vec::new(),
                    error: None,
                });
                continue;
            }

            if !repo.is_versioned() {
                result.repositories.push(RepositoryStatus {
                    dest,
                    vcs,
                    state: RepositoryState::Missing,
                    revisions: Vec::new(),
                    error: None,
                });
                continue;
            }

            let status = match repo.uncommitted_changes().await {
                Ok(dirty) => {
                    let revisions = repo.parents(false).await.unwrap_or_default();
                    RepositoryStatus {
                        dest,
                        vcs,
                        state: if dirty {
                            RepositoryState::Dirty
                        } else {
                            RepositoryState::Clean
                        },
                        revisions,
                        error: None,
                    }
                }
                Err(err) => RepositoryStatus {
                    dest,
                    vcs,
                    state: RepositoryState::Error,
                    revisions: Vec::new(),
                    error: Some(err.to_string()),
                },
            };
            result.repositories.push(status);
        }

        Ok(result)
    }
}
