use colored::Colorize;
use std::path::PathBuf;

use crate::application::use_cases::freeze_addons::{
    FreezeAddonsConfig, FreezeAddonsUseCase,
};
use crate::common::error::AdsyncError;
use crate::common::result::AdsyncResult;
use crate::presentation::cli::OutputFormat;

/// Handler for the freeze command
pub struct FreezeCommand {
    pub manifest_path: PathBuf,
    pub output: OutputFormat,
}

impl FreezeCommand {
    pub fn new(manifest_path: PathBuf, output: OutputFormat) -> Self {
        Self {
            manifest_path,
            output,
        }
    }

    pub async fn execute(&self) -> AdsyncResult<()> {
        let config = FreezeAddonsConfig::new(&self.manifest_path);
        let result = FreezeAddonsUseCase::new(config).execute().await?;

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            OutputFormat::Text => {
                for pin in &result.pins {
                    println!("{} {} {}", pin.vcs, pin.dest, pin.revision);
                }
                for error in &result.errors {
                    eprintln!("{} {}", "⚠".yellow().bold(), error);
                }
            }
        }

        if result.is_success() {
            Ok(())
        } else {
            Err(AdsyncError::workspace(format!(
                "{} entries could not be pinned",
                result.errors.len()
            )))
        }
    }
}
