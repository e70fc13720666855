use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version control backend handling a working copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsType {
    /// Git
    Git,
    /// Mercurial
    Hg,
    /// Bazaar
    Bzr,
    /// Subversion
    Svn,
    /// A plain filesystem path maintained outside this tool
    Local,
}

impl Default for VcsType {
    fn default() -> Self {
        Self::Git
    }
}

impl fmt::Display for VcsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsType::Git => write!(f, "git"),
            VcsType::Hg => write!(f, "hg"),
            VcsType::Bzr => write!(f, "bzr"),
            VcsType::Svn => write!(f, "svn"),
            VcsType::Local => write!(f, "local"),
        }
    }
}

impl FromStr for VcsType {
    type Err = VcsTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "git" => Ok(VcsType::Git),
            "hg" | "mercurial" => Ok(VcsType::Hg),
            "bzr" | "bazaar" => Ok(VcsType::Bzr),
            "svn" | "subversion" => Ok(VcsType::Svn),
            "local" => Ok(VcsType::Local),
            _ => Err(VcsTypeError::UnsupportedVcsType(s.to_string())),
        }
    }
}

impl VcsType {
    /// All backends that drive an external VCS tool
    pub const VERSIONED: [VcsType; 4] = [VcsType::Git, VcsType::Hg, VcsType::Bzr, VcsType::Svn];

    /// The metadata directory marking a path as a working copy of this
    /// backend, if it has one
    pub fn control_dir(&self) -> Option<&'static str> {
        match self {
            VcsType::Git => Some(".git"),
            VcsType::Hg => Some(".hg"),
            VcsType::Bzr => Some(".bzr"),
            VcsType::Svn => Some(".svn"),
            VcsType::Local => None,
        }
    }

    /// The command-line tool this backend shells out to, if any
    pub fn executable_name(&self) -> Option<&'static str> {
        match self {
            VcsType::Git => Some("git"),
            VcsType::Hg => Some("hg"),
            VcsType::Bzr => Some("bzr"),
            VcsType::Svn => Some("svn"),
            VcsType::Local => None,
        }
    }

    /// Whether this backend's tool is known to leave stale lock files
    /// behind after an interrupted run
    pub fn supports_lock_clearing(&self) -> bool {
        matches!(self, VcsType::Bzr | VcsType::Svn)
    }

    /// Whether the `merge` repository option applies to this backend
    pub fn supports_merge_option(&self) -> bool {
        matches!(self, VcsType::Git)
    }
}

/// Errors that can occur when working with VCS type tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsTypeError {
    /// The specified VCS type is not supported
    UnsupportedVcsType(String),
}

impl fmt::Display for VcsTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsTypeError::UnsupportedVcsType(vcs) => {
                write!(
                    f,
                    "Unsupported VCS type: '{}'. Supported types are: git, hg, bzr, svn, local",
                    vcs
                )
            }
        }
    }
}

impl std::error::Error for VcsTypeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vcs_type_from_str() {
        assert_eq!("git".parse::<VcsType>().unwrap(), VcsType::Git);
        assert_eq!("hg".parse::<VcsType>().unwrap(), VcsType::Hg);
        assert_eq!("mercurial".parse::<VcsType>().unwrap(), VcsType::Hg);
        assert_eq!("bzr".parse::<VcsType>().unwrap(), VcsType::Bzr);
        assert_eq!("svn".parse::<VcsType>().unwrap(), VcsType::Svn);
        assert_eq!("subversion".parse::<VcsType>().unwrap(), VcsType::Svn);
        assert_eq!("local".parse::<VcsType>().unwrap(), VcsType::Local);

        assert!("cvs".parse::<VcsType>().is_err());
    }

    #[test]
    fn test_vcs_type_display() {
        assert_eq!(VcsType::Git.to_string(), "git");
        assert_eq!(VcsType::Hg.to_string(), "hg");
        assert_eq!(VcsType::Bzr.to_string(), "bzr");
        assert_eq!(VcsType::Svn.to_string(), "svn");
        assert_eq!(VcsType::Local.to_string(), "local");
    }

    #[test]
    fn test_control_dirs() {
        assert_eq!(VcsType::Git.control_dir(), Some(".git"));
        assert_eq!(VcsType::Hg.control_dir(), Some(".hg"));
        assert_eq!(VcsType::Bzr.control_dir(), Some(".bzr"));
        assert_eq!(VcsType::Svn.control_dir(), Some(".svn"));
        assert_eq!(VcsType::Local.control_dir(), None);
    }

    #[test]
    fn test_capabilities() {
        assert!(!VcsType::Git.supports_lock_clearing());
        assert!(!VcsType::Hg.supports_lock_clearing());
        assert!(VcsType::Bzr.supports_lock_clearing());
        assert!(VcsType::Svn.supports_lock_clearing());

        assert!(VcsType::Git.supports_merge_option());
        assert!(!VcsType::Svn.supports_merge_option());
    }

    #[test]
    fn test_serde() {
        let git = VcsType::Git;
        let json = serde_json::to_string(&git).unwrap();
        assert_eq!(json, "\"git\"");

        let deserialized: VcsType = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, VcsType::Git);
    }
}
