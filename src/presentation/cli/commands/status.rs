use colored::Colorize;
use std::path::PathBuf;

use crate::application::use_cases::status_check::{
    RepositoryState, StatusCheckConfig, StatusCheckUseCase, StatusResult,
};
use crate::common::result::AdsyncResult;
use crate::presentation::cli::OutputFormat;

/// Handler for the status command
pub struct StatusCommand {
    pub manifest_path: PathBuf,
    pub output: OutputFormat,
}

impl StatusCommand {
    pub fn new(manifest_path: PathBuf, output: OutputFormat) -> Self {
        Self {
            manifest_path,
            output,
        }
    }

    pub async fn execute(&self) -> AdsyncResult<()> {
        let config = StatusCheckConfig::new(&self.manifest_path);
        let result = StatusCheckUseCase::new(config).execute().await?;

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            OutputFormat::Text => self.print_text(&result),
        }
        Ok(())
    }

    fn print_text(&self, result: &StatusResult) {
        for repo in &result.repositories {
            let state = match repo.state {
                RepositoryState::Clean => "clean".green(),
                RepositoryState::Dirty => "dirty".yellow(),
                RepositoryState::Missing => "missing".red(),
                RepositoryState::Local => "local".blue(),
                RepositoryState::Error => "error".red(),
            };
            print!("{}: {}", repo.dest.bold(), state);
            if let Some(revision) = repo.revisions.first() {
                print!(" ({})", revision);
            }
            if let Some(error) = &repo.error {
                print!(" ({})", error.red());
            }
            println!();
        }
    }
}
