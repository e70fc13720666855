use thiserror::Error;

/// Top-level error type, aggregating every layer the CLI drives
#[derive(Debug, Error)]
pub enum AdsyncError {
    #[error(transparent)]
    Manifest(#[from] crate::domain::entities::manifest::ManifestError),

    #[error(transparent)]
    Vcs(#[from] crate::infrastructure::vcs::VcsError),

    #[error(transparent)]
    Resolver(#[from] crate::application::services::addons_resolver::ResolverError),

    #[error(transparent)]
    Sync(#[from] crate::application::use_cases::sync_addons::SyncAddonsError),

    #[error(transparent)]
    Status(#[from] crate::application::use_cases::status_check::StatusCheckError),

    #[error(transparent)]
    Freeze(#[from] crate::application::use_cases::freeze_addons::FreezeAddonsError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{message}")]
    Workspace { message: String },
}

impl AdsyncError {
    /// A workspace-level problem with no deeper cause to carry.
    pub fn workspace(message: impl Into<String>) -> Self {
        Self::Workspace {
            message: message.into(),
        }
    }
}
