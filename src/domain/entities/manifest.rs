use crate::domain::entities::addon::{AddonLine, AddonLineError};
use crate::domain::value_objects::vcs_type::VcsType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The application source tree itself, when it is VCS-managed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSource {
    /// Backend for the application checkout
    pub vcs: VcsType,
    /// Remote URL or local source path
    pub url: String,
    /// Target directory, relative to the workspace root
    pub dest: String,
    /// Revision specifier; empty means the backend default
    #[serde(default)]
    pub revision: String,
}

/// The declarative provisioning description read from `adsync.yml`.
///
/// ```yaml
/// application:
///   vcs: git
///   url: https://example.com/platform.git
///   dest: parts/platform
///   revision: "v2.1"
/// addons:
///   - "git https://example.com/a.git addons/a v1"
///   - "local custom/addons"
/// offline: false
/// clear_locks: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionManifest {
    /// The platform source tree, if this run manages it too
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<ApplicationSource>,

    /// Addons specification lines, converged in order
    #[serde(default)]
    pub addons: Vec<String>,

    /// Forbid all network operations
    #[serde(default)]
    pub offline: bool,

    /// Clear stale VCS lock files before operating
    #[serde(default)]
    pub clear_locks: bool,
}

/// Errors raised while loading a provisioning manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    AddonLine(#[from] AddonLineError),
}

impl ProvisionManifest {
    /// Default manifest file name looked up in the workspace root.
    pub const DEFAULT_FILE: &'static str = "adsync.yml";

    /// Load and parse a manifest file.
    pub fn load_from_file(path: &Path) -> Result<Self, ManifestError> {
        if !path.is_file() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse every addons line, in manifest order.
    pub fn parsed_addons(&self) -> Result<Vec<AddonLine>, ManifestError> {
        self.addons
            .iter()
            .map(|line| line.parse::<AddonLine>().map_err(ManifestError::from))
            .collect()
    }

    /// The workspace root a manifest file governs: its directory.
    /// Relative destinations in the manifest are resolved against it.
    pub fn workspace_root(manifest_path: &Path) -> PathBuf {
        manifest_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
