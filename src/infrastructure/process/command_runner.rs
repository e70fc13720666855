use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// Errors surfaced by command execution
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with code {exit_code}: {stderr}")]
    Failed {
        command: String,
        exit_code: i32,
        stderr: String,
    },
}

/// One external command invocation: program, argument vector and the
/// directory it runs in. Arguments are never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path
    pub program: String,
    /// Argument vector, exec-style
    pub args: Vec<String>,
    /// Working directory for the child process; `None` inherits ours
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Build a spec that runs in the parent's working directory.
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            cwd: None,
        }
    }

    /// Build a spec scoped to `dir`. The directory is passed to the
    /// spawn call directly; the parent's working directory is never
    /// touched.
    pub fn in_dir(program: impl Into<String>, args: &[&str], dir: &Path) -> Self {
        Self {
            cwd: Some(dir.to_path_buf()),
            ..Self::new(program, args)
        }
    }

    /// Human-readable form, for logs and error messages.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code; -1 when the process died without one
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Command execution seam for the VCS drivers.
///
/// The production implementation spawns real processes; tests install a
/// scripted implementation that records every invocation instead.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command and capture its output. A non-zero exit is not
    /// an error at this level.
    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError>;

    /// Run the command, failing on non-zero exit, and return trimmed
    /// standard output.
    async fn run_checked(&self, spec: &CommandSpec) -> Result<String, CommandError> {
        let output = self.output(spec).await?;
        if !output.success() {
            return Err(CommandError::Failed {
                command: spec.display(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(output.stdout.trim().to_string())
    }
}

/// Spawns commands with a fixed environment snapshot.
///
/// The environment is captured once at construction with the locale
/// pinned to `C`, so tool output stays parseable regardless of the
/// invoking user's settings.
pub struct SystemCommandRunner {
    env: HashMap<String, String>,
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        let mut env: HashMap<String, String> = std::env::vars().collect();
        env.insert("LC_ALL".to_string(), "C".to_string());
        env.insert("LANG".to_string(), "C".to_string());
        Self { env }
    }
}

impl SystemCommandRunner {
    /// Create a runner with the current environment, locale pinned.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn output(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .env_clear()
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|source| CommandError::Launch {
            program: spec.program.clone(),
            source,
        })?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
