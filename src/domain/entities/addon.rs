use crate::domain::value_objects::vcs_type::VcsType;
use std::str::FromStr;
use thiserror::Error;

/// Where one addons line gets its source tree from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddonSource {
    /// A working copy converged from a VCS remote
    Vcs {
        /// Backend driving the working copy
        vcs: VcsType,
        /// Remote URL or local source path
        url: String,
        /// Target directory, relative to the workspace root
        dest: String,
        /// Revision specifier; empty means the backend default
        revision: String,
    },
    /// A pre-existing filesystem path maintained by other tooling
    Local {
        /// The path, relative to the workspace root unless absolute
        path: String,
    },
}

/// One parsed addons specification line.
///
/// The accepted forms are:
///
/// ```text
/// <vcs> <url> <dest> <revision> [key=value ...]
/// local <path> [key=value ...]
/// <path>
/// ```
///
/// Recognized trailing options are `subdir=<path>`, `merge=true|false`
/// (Git only) and `clear-locks=true|false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonLine {
    /// The source tree this line describes
    pub source: AddonSource,
    /// Module container is this subdirectory of the checkout
    pub subdir: Option<String>,
    /// Merge the revision into the current branch instead of checking
    /// it out (Git only)
    pub merge: bool,
    /// Clear stale VCS lock files before operating
    pub clear_locks: bool,
}

impl AddonLine {
    /// The directory the line's working copy lives in, relative to the
    /// workspace root.
    pub fn dest(&self) -> &str {
        match &self.source {
            AddonSource::Vcs { dest, .. } => dest,
            AddonSource::Local { path } => path,
        }
    }

    /// The backend tag for this line.
    pub fn vcs_type(&self) -> VcsType {
        match &self.source {
            AddonSource::Vcs { vcs, .. } => *vcs,
            AddonSource::Local { .. } => VcsType::Local,
        }
    }

    fn apply_option(&mut self, key: &str, value: &str, line: &str) -> Result<(), AddonLineError> {
        match key {
            "subdir" => {
                self.subdir = Some(value.to_string());
                Ok(())
            }
            "merge" => {
                self.merge = parse_bool(key, value)?;
                Ok(())
            }
            "clear-locks" => {
                self.clear_locks = parse_bool(key, value)?;
                Ok(())
            }
            _ => Err(AddonLineError::UnknownOption {
                key: key.to_string(),
                line: line.to_string(),
            }),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AddonLineError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(AddonLineError::InvalidOptionValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Errors raised while parsing an addons specification line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddonLineError {
    #[error("empty addons line")]
    Empty,

    #[error("addons line `{line}` must read `<vcs> <url> <dest> <revision>`")]
    MissingFields { line: String },

    #[error("unknown option `{key}` in addons line `{line}`")]
    UnknownOption { key: String, line: String },

    #[error("invalid value `{value}` for option `{key}` (expected true or false)")]
    InvalidOptionValue { key: String, value: String },

    #[error("unexpected token `{token}` in addons line `{line}`")]
    UnexpectedToken { token: String, line: String },
}

impl FromStr for AddonLine {
    type Err = AddonLineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        let first = *tokens.first().ok_or(AddonLineError::Empty)?;

        let (source, rest) = match first.parse::<VcsType>() {
            Ok(VcsType::Local) => {
                let path = tokens.get(1).ok_or_else(|| AddonLineError::MissingFields {
                    line: s.to_string(),
                })?;
                (
                    AddonSource::Local {
                        path: (*path).to_string(),
                    },
                    &tokens[2..],
                )
            }
            Ok(vcs) => {
                if tokens.len() < 4 {
                    return Err(AddonLineError::MissingFields {
                        line: s.to_string(),
                    });
                }
                (
                    AddonSource::Vcs {
                        vcs,
                        url: tokens[1].to_string(),
                        dest: tokens[2].to_string(),
                        revision: tokens[3].to_string(),
                    },
                    &tokens[4..],
                )
            }
            // A bare token that is no VCS tag is a filesystem path
            Err(_) => (
                AddonSource::Local {
                    path: first.to_string(),
                },
                &tokens[1..],
            ),
        };

        let mut line = AddonLine {
            source,
            subdir: None,
            merge: false,
            clear_locks: false,
        };

        for token in rest {
            match token.split_once('=') {
                Some((key, value)) => line.apply_option(key, value, s)?,
                None => {
                    return Err(AddonLineError::UnexpectedToken {
                        token: (*token).to_string(),
                        line: s.to_string(),
                    })
                }
            }
        }

        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_vcs_line() {
        let line: AddonLine = "git https://example.com/a.git addons/a v1.2"
            .parse()
            .unwrap();
        assert_eq!(
            line.source,
            AddonSource::Vcs {
                vcs: VcsType::Git,
                url: "https://example.com/a.git".to_string(),
                dest: "addons/a".to_string(),
                revision: "v1.2".to_string(),
            }
        );
        assert_eq!(line.subdir, None);
        assert!(!line.merge);
    }

    #[test]
    fn test_parse_local_line() {
        let line: AddonLine = "local custom/addons".parse().unwrap();
        assert_eq!(
            line.source,
            AddonSource::Local {
                path: "custom/addons".to_string()
            }
        );
        assert_eq!(line.vcs_type(), VcsType::Local);
    }

    #[test]
    fn test_parse_bare_path_line() {
        let line: AddonLine = "/srv/addons/extra".parse().unwrap();
        assert_eq!(
            line.source,
            AddonSource::Local {
                path: "/srv/addons/extra".to_string()
            }
        );

        // Relative paths work the same way
        let line: AddonLine = "vendor/addons".parse().unwrap();
        assert_eq!(line.dest(), "vendor/addons");
    }

    #[test]
    fn test_parse_trailing_options() {
        let line: AddonLine =
            "hg https://example.com/b repo/b default subdir=modules clear-locks=true"
                .parse()
                .unwrap();
        assert_eq!(line.subdir.as_deref(), Some("modules"));
        assert!(line.clear_locks);

        let line: AddonLine = "git https://example.com/c.git c main merge=true"
            .parse()
            .unwrap();
        assert!(line.merge);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<AddonLine>(), Err(AddonLineError::Empty));
        assert_eq!("   ".parse::<AddonLine>(), Err(AddonLineError::Empty));

        assert!(matches!(
            "git https://example.com/a.git addons/a".parse::<AddonLine>(),
            Err(AddonLineError::MissingFields { .. })
        ));
        assert!(matches!(
            "local".parse::<AddonLine>(),
            Err(AddonLineError::MissingFields { .. })
        ));
        assert!(matches!(
            "git u d r shallow=true".parse::<AddonLine>(),
            Err(AddonLineError::UnknownOption { .. })
        ));
        assert!(matches!(
            "git u d r merge=yes".parse::<AddonLine>(),
            Err(AddonLineError::InvalidOptionValue { .. })
        ));
        assert!(matches!(
            "local a b".parse::<AddonLine>(),
            Err(AddonLineError::UnexpectedToken { .. })
        ));
    }
}
