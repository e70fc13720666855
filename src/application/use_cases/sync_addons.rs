use crate::application::services::addons_resolver::{AddonsResolver, ResolverError};
use crate::domain::entities::manifest::{ManifestError, ProvisionManifest};
use crate::domain::value_objects::vcs_type::VcsType;
use crate::infrastructure::vcs::repo::VcsError;
use crate::infrastructure::vcs::{RepoFactory, RepoOptions};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors aborting a sync run before any repository is touched
#[derive(Debug, Error)]
pub enum SyncAddonsError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Sync run settings
#[derive(Debug, Clone)]
pub struct SyncAddonsConfig {
    /// Manifest file to read
    pub manifest_path: PathBuf,
    /// Forbid network operations, overriding the manifest
    pub offline: bool,
    /// Clear stale VCS locks, overriding the manifest
    pub clear_locks: bool,
}

impl SyncAddonsConfig {
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            offline: false,
            clear_locks: false,
        }
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_clear_locks(mut self, clear_locks: bool) -> Self {
        self.clear_locks = clear_locks;
        self
    }
}

/// What happened to one manifest entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    /// Working copy was created by this run
    Created,
    /// Working copy existed and was converged
    Updated,
    /// Entry failed; details in the outcome's error field
    Failed,
}

/// Per-entry sync report
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    /// Target directory as written in the manifest
    pub dest: String,
    /// Backend that handled the entry
    pub vcs: VcsType,
    /// What the run did with it
    pub action: SyncAction,
    /// Failure message, when `action` is [`SyncAction::Failed`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated result of a sync run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncResult {
    /// Per-entry reports, in manifest order
    pub outcomes: Vec<SyncOutcome>,
    /// The ordered module search path assembled from the addons lines
    pub addons_paths: Vec<PathBuf>,
}

impl SyncResult {
    pub fn created_count(&self) -> usize {
        self.count(SyncAction::Created)
    }

    pub fn updated_count(&self) -> usize {
        self.count(SyncAction::Updated)
    }

    pub fn failed_count(&self) -> usize {
        self.count(SyncAction::Failed)
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    fn count(&self, action: SyncAction) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.action == action)
            .count()
    }
}

/// Converge every manifest entry, sequentially and in order.
///
/// One failing entry does not stop the run; its error is recorded in
/// the result and the remaining entries are still converged. The
/// caller inspects [`SyncResult::is_success`] and decides whether the
/// run as a whole counts as failed.
pub struct SyncAddonsUseCase {
    config: SyncAddonsConfig,
}

impl SyncAddonsUseCase {
    pub fn new(config: SyncAddonsConfig) -> Self {
        Self { config }
    }

    pub async fn execute(&self) -> Result<SyncResult, SyncAddonsError> {
        let manifest = ProvisionManifest::load_from_file(&self.config.manifest_path)?;
        let root = ProvisionManifest::workspace_root(&self.config.manifest_path);
        let offline = self.config.offline || manifest.offline;
        let clear_locks = self.config.clear_locks || manifest.clear_locks;

        let mut result = SyncResult::default();

        if let Some(app) = &manifest.application {
            let target = if Path::new(&app.dest).is_absolute() {
                PathBuf::from(&app.dest)
            } else {
                root.join(&app.dest)
            };
            if let Some(parent) = target.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let existed = target.exists();
            let options = RepoOptions::default()
                .with_offline(offline)
                .with_clear_locks(clear_locks);
            let repo =
                RepoFactory::create_repo(app.vcs, target, app.url.clone(), options);
            match repo.get_update(&app.revision).await {
                Ok(()) => result.outcomes.push(SyncOutcome {
                    dest: app.dest.clone(),
                    vcs: app.vcs,
                    action: if existed {
                        SyncAction::Updated
                    } else {
                        SyncAction::Created
                    },
                    error: None,
                }),
                Err(err) => result.outcomes.push(failed(&app.dest, app.vcs, err.into())),
            }
        }

        let resolver = AddonsResolver::new(&root)
            .with_offline(offline)
            .with_clear_locks(clear_locks);

        for raw in &manifest.addons {
            let line = match raw.parse::<crate::domain::entities::addon::AddonLine>() {
                Ok(line) => line,
                Err(err) => {
                    result.outcomes.push(failed(raw, VcsType::Local, SyncEntryError::from(err)));
                    continue;
                }
            };
            match resolver.resolve(&line).await {
                Ok(resolved) => {
                    result.outcomes.push(SyncOutcome {
                        dest: line.dest().to_string(),
                        vcs: resolved.vcs,
                        action: if resolved.freshly_created {
                            SyncAction::Created
                        } else {
                            SyncAction::Updated
                        },
                        error: None,
                    });
                    result.addons_paths.push(resolved.addons_path);
                }
                Err(err) => {
                    result
                        .outcomes
                        .push(failed(line.dest(), line.vcs_type(), err.into()));
                }
            }
        }

        Ok(result)
    }
}

/// Anything that can sink a single manifest entry
#[derive(Debug, Error)]
enum SyncEntryError {
    #[error(transparent)]
    Line(#[from] crate::domain::entities::addon::AddonLineError),
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    #[error(transparent)]
    Vcs(#[from] VcsError),
}

fn failed(dest: &str, vcs: VcsType, err: SyncEntryError) -> SyncOutcome {
    SyncOutcome {
        dest: dest.to_string(),
        vcs,
        action: SyncAction::Failed,
        error: Some(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("adsync.yml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn test_sync_local_only_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("custom/addons")).unwrap();
        let manifest = write_manifest(
            dir.path(),
            "addons:\n  - \"local custom/addons\"\n",
        );

        let result = SyncAddonsUseCase::new(SyncAddonsConfig::new(manifest))
            .execute()
            .await
            .unwrap();
        assert!(result.is_success());
        assert_eq!(result.updated_count(), 1);
        assert_eq!(
            result.addons_paths,
            vec![dir.path().join("custom/addons")]
        );
    }

    #[tokio::test]
    async fn test_failed_entry_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("present")).unwrap();
        let manifest = write_manifest(
            dir.path(),
            "addons:\n  - \"local missing\"\n  - \"local present\"\n",
        );

        let result = SyncAddonsUseCase::new(SyncAddonsConfig::new(manifest))
            .execute()
            .await
            .unwrap();
        assert!(!result.is_success());
        assert_eq!(result.failed_count(), 1);
        assert_eq!(result.outcomes[0].action, SyncAction::Failed);
        assert!(result.outcomes[0].error.as_deref().unwrap().contains("missing"));
        assert_eq!(result.outcomes[1].action, SyncAction::Updated);
        assert_eq!(result.addons_paths, vec![dir.path().join("present")]);
    }

    #[tokio::test]
    async fn test_unparseable_line_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write_manifest(
            dir.path(),
            "addons:\n  - \"git https://example.com/a.git onlythree\"\n",
        );

        let result = SyncAddonsUseCase::new(SyncAddonsConfig::new(manifest))
            .execute()
            .await
            .unwrap();
        assert_eq!(result.failed_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_manifest_aborts() {
        let err = SyncAddonsUseCase::new(SyncAddonsConfig::new("/nonexistent/adsync.yml"))
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncAddonsError::Manifest(ManifestError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_offline_missing_vcs_entry_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write_manifest(
            dir.path(),
            concat!(
                "addons:\n",
                "  - \"git https://example.com/a.git addons/a v1\"\n",
                "offline: true\n",
            ),
        );

        let result = SyncAddonsUseCase::new(SyncAddonsConfig::new(manifest))
            .execute()
            .await
            .unwrap();
        assert_eq!(result.failed_count(), 1);
        assert!(result.outcomes[0]
            .error
            .as_deref()
            .unwrap()
            .contains("offline mode"));
        assert!(!dir.path().join("addons/a").exists());
    }
}
