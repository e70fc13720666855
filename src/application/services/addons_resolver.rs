use crate::domain::entities::addon::{AddonLine, AddonSource};
use crate::domain::entities::manifest::{ManifestError, ProvisionManifest};
use crate::domain::value_objects::vcs_type::VcsType;
use crate::infrastructure::vcs::repo::VcsError;
use crate::infrastructure::vcs::{Repo, RepoFactory, RepoOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Per-module descriptor file. A checkout whose root carries one IS a
/// single module rather than a container of modules.
pub const ADDON_DESCRIPTOR: &str = "addon.toml";

/// Errors raised while resolving an addons line
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error("filesystem operation on {path} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot relocate standalone module checkout {path}: it has no directory name")]
    UnnamedTarget { path: PathBuf },
}

impl ResolverError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Outcome of resolving one addons line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddon {
    /// Backend that handled the line
    pub vcs: VcsType,
    /// Directory the working copy actually lives in
    pub work_dir: PathBuf,
    /// Directory to put on the addons path (the module container)
    pub addons_path: PathBuf,
    /// Whether the working copy was created by this call
    pub freshly_created: bool,
}

/// Resolves addons specification lines against a workspace root:
/// builds the right driver, converges it, then adjusts the usable
/// path (`subdir=` option, standalone-module relocation).
pub struct AddonsResolver {
    root: PathBuf,
    offline: bool,
    clear_locks: bool,
}

impl AddonsResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
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

    /// Absolute location of a line's target directory.
    pub fn target_dir(&self, line: &AddonLine) -> PathBuf {
        absolutize(&self.root, line.dest())
    }

    /// The repository handle and revision for one line.
    ///
    /// For a VCS line whose checkout was previously relocated as a
    /// standalone module, the handle points at the nested working copy
    /// rather than the container.
    pub fn repo_for(&self, line: &AddonLine) -> (Box<dyn Repo>, String) {
        let options = RepoOptions::default()
            .with_offline(self.offline)
            .with_clear_locks(self.clear_locks || line.clear_locks)
            .with_merge(line.merge);

        match &line.source {
            AddonSource::Vcs {
                vcs, url, revision, ..
            } => {
                let container = self.target_dir(line);
                let work_dir = relocated_work_dir(*vcs, &container).unwrap_or(container);
                (
                    RepoFactory::create_repo(*vcs, work_dir, url.clone(), options),
                    revision.clone(),
                )
            }
            AddonSource::Local { .. } => {
                let target = self.target_dir(line);
                (
                    RepoFactory::create_repo(VcsType::Local, target, String::new(), options),
                    String::new(),
                )
            }
        }
    }

    /// Build introspection handles for every manifest entry:
    /// application first, then the addons lines in manifest order.
    pub fn manifest_repos(
        &self,
        manifest: &ProvisionManifest,
    ) -> Result<Vec<(String, Box<dyn Repo>)>, ManifestError> {
        let mut repos = Vec::new();
        if let Some(app) = &manifest.application {
            let target = absolutize(&self.root, &app.dest);
            let options = RepoOptions::default()
                .with_offline(self.offline)
                .with_clear_locks(self.clear_locks);
            repos.push((
                app.dest.clone(),
                RepoFactory::create_repo(app.vcs, target, app.url.clone(), options),
            ));
        }
        for line in manifest.parsed_addons()? {
            let (repo, _revision) = self.repo_for(&line);
            repos.push((line.dest().to_string(), repo));
        }
        Ok(repos)
    }

    /// Converge one addons line and return the path adjustment result.
    pub async fn resolve(&self, line: &AddonLine) -> Result<ResolvedAddon, ResolverError> {
        let container = self.target_dir(line);
        if let Some(parent) = container.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ResolverError::io(parent, e))?;
        }

        let (repo, revision) = self.repo_for(line);
        let mut work_dir = repo.target_dir().to_path_buf();
        let freshly_created = !work_dir.exists();
        repo.get_update(&revision).await?;

        let addons_path = if let Some(subdir) = &line.subdir {
            work_dir.join(subdir)
        } else {
            if line.vcs_type() != VcsType::Local && work_dir == container {
                if let Some(nested) = self.adjust_standalone(&container)? {
                    work_dir = nested;
                }
            }
            container.clone()
        };

        Ok(ResolvedAddon {
            vcs: line.vcs_type(),
            work_dir,
            addons_path,
            freshly_created,
        })
    }

    /// A repository that IS one module gets moved into a synthetically
    /// named subdirectory, so the container can go on the addons path
    /// like any other checkout. Returns the relocated working copy
    /// location, or `None` when the checkout is a regular container.
    fn adjust_standalone(&self, container: &Path) -> Result<Option<PathBuf>, ResolverError> {
        if !container.join(ADDON_DESCRIPTOR).is_file() {
            return Ok(None);
        }
        let name = container
            .file_name()
            .ok_or_else(|| ResolverError::UnnamedTarget {
                path: container.to_path_buf(),
            })?
            .to_os_string();

        info!(
            "standalone module checkout {}: moving into {}/{}",
            container.display(),
            container.display(),
            name.to_string_lossy()
        );

        let staging = container.with_file_name({
            let mut hidden = std::ffi::OsString::from(".");
            hidden.push(&name);
            hidden.push(".standalone");
            hidden
        });
        std::fs::rename(container, &staging).map_err(|e| ResolverError::io(container, e))?;
        std::fs::create_dir(container).map_err(|e| ResolverError::io(container, e))?;
        let nested = container.join(&name);
        std::fs::rename(&staging, &nested).map_err(|e| ResolverError::io(&staging, e))?;

        Ok(Some(nested))
    }
}

fn absolutize(root: &Path, dest: &str) -> PathBuf {
    let dest = Path::new(dest);
    if dest.is_absolute() {
        dest.to_path_buf()
    } else {
        root.join(dest)
    }
}

/// Where a previously relocated standalone checkout lives, if this
/// container was produced by [`AddonsResolver::adjust_standalone`] on
/// an earlier run.
fn relocated_work_dir(vcs: VcsType, container: &Path) -> Option<PathBuf> {
    let marker = vcs.control_dir()?;
    if container.join(marker).exists() || !container.exists() {
        return None;
    }
    let name = container.file_name()?;
    let nested = container.join(name);
    if nested.join(marker).exists() {
        Some(nested)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::addon::AddonLine;

    fn line(text: &str) -> AddonLine {
        text.parse().unwrap()
    }

    #[tokio::test]
    async fn test_local_line_resolves_to_existing_path() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("custom/addons")).unwrap();

        let resolver = AddonsResolver::new(root.path());
        let resolved = resolver.resolve(&line("local custom/addons")).await.unwrap();
        assert_eq!(resolved.vcs, VcsType::Local);
        assert_eq!(resolved.addons_path, root.path().join("custom/addons"));
        assert!(!resolved.freshly_created);
    }

    #[tokio::test]
    async fn test_local_line_missing_path_fails() {
        let root = tempfile::tempdir().unwrap();
        let resolver = AddonsResolver::new(root.path());
        let err = resolver
            .resolve(&line("local custom/addons"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::Vcs(_)));
    }

    #[tokio::test]
    async fn test_absolute_path_line_is_used_verbatim() {
        let elsewhere = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();

        let resolver = AddonsResolver::new(root.path());
        let spec = elsewhere.path().to_string_lossy().into_owned();
        let resolved = resolver.resolve(&line(&spec)).await.unwrap();
        assert_eq!(resolved.addons_path, elsewhere.path());
    }

    #[tokio::test]
    async fn test_subdir_option_shifts_addons_path() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("vendor/big")).unwrap();

        let resolver = AddonsResolver::new(root.path());
        let resolved = resolver
            .resolve(&line("local vendor/big subdir=modules"))
            .await
            .unwrap();
        assert_eq!(
            resolved.addons_path,
            root.path().join("vendor/big/modules")
        );
    }

    #[test]
    fn test_repo_options_combine_globals_and_line() {
        let resolver = AddonsResolver::new("/work").with_offline(true);
        let (repo, revision) =
            resolver.repo_for(&line("git https://example.com/a.git addons/a v1 clear-locks=true"));
        assert_eq!(repo.vcs_type(), VcsType::Git);
        assert_eq!(revision, "v1");
        assert!(repo.options().offline);
        assert!(repo.options().clear_locks);
        assert!(!repo.options().merge);
    }

    #[test]
    fn test_standalone_checkout_is_relocated() {
        let root = tempfile::tempdir().unwrap();
        let container = root.path().join("addons/solo");
        std::fs::create_dir_all(&container).unwrap();
        std::fs::create_dir(container.join(".git")).unwrap();
        std::fs::write(container.join(ADDON_DESCRIPTOR), b"name = \"solo\"\n").unwrap();
        std::fs::write(container.join("code.rs"), b"").unwrap();

        let resolver = AddonsResolver::new(root.path());
        let nested = resolver.adjust_standalone(&container).unwrap().unwrap();

        assert_eq!(nested, container.join("solo"));
        assert!(nested.join(".git").is_dir());
        assert!(nested.join(ADDON_DESCRIPTOR).is_file());
        assert!(nested.join("code.rs").is_file());
        assert!(!container.join(ADDON_DESCRIPTOR).exists());
    }

    #[test]
    fn test_container_checkout_is_left_in_place() {
        let root = tempfile::tempdir().unwrap();
        let container = root.path().join("addons/many");
        std::fs::create_dir_all(container.join("mod_a")).unwrap();
        std::fs::write(container.join("mod_a").join(ADDON_DESCRIPTOR), b"").unwrap();

        let resolver = AddonsResolver::new(root.path());
        assert_eq!(resolver.adjust_standalone(&container).unwrap(), None);
        assert!(container.join("mod_a").join(ADDON_DESCRIPTOR).is_file());
    }

    #[test]
    fn test_relocated_work_dir_found_on_later_runs() {
        let root = tempfile::tempdir().unwrap();
        let container = root.path().join("addons/solo");
        let nested = container.join("solo");
        std::fs::create_dir_all(nested.join(".git")).unwrap();

        assert_eq!(
            relocated_work_dir(VcsType::Git, &container),
            Some(nested.clone())
        );
        // A container that is itself a working copy is not relocated
        std::fs::create_dir(container.join(".git")).unwrap();
        assert_eq!(relocated_work_dir(VcsType::Git, &container), None);
    }
}
