use colored::Colorize;
use std::path::PathBuf;

use crate::application::use_cases::sync_addons::{
    SyncAction, SyncAddonsConfig, SyncAddonsUseCase,
};
use crate::common::error::AdsyncError;
use crate::common::result::AdsyncResult;

/// Handler for the sync command
pub struct SyncCommand {
    pub manifest_path: PathBuf,
    pub offline: bool,
    pub clear_locks: bool,
    pub verbose: bool,
}

impl SyncCommand {
    pub fn new(manifest_path: PathBuf, offline: bool, clear_locks: bool, verbose: bool) -> Self {
        Self {
            manifest_path,
            offline,
            clear_locks,
            verbose,
        }
    }

    pub async fn execute(&self) -> AdsyncResult<()> {
        let config = SyncAddonsConfig::new(&self.manifest_path)
            .with_offline(self.offline)
            .with_clear_locks(self.clear_locks);
        let use_case = SyncAddonsUseCase::new(config);

        println!("{} Synchronizing working copies...", "::".blue().bold());

        let result = use_case.execute().await?;

        for outcome in &result.outcomes {
            match outcome.action {
                SyncAction::Created => {
                    println!("  {} {} ({})", "+".green().bold(), outcome.dest, outcome.vcs)
                }
                SyncAction::Updated => {
                    if self.verbose {
                        println!("  {} {} ({})", "·".blue(), outcome.dest, outcome.vcs)
                    }
                }
                SyncAction::Failed => {
                    let default_error = "unknown error".to_string();
                    let message = outcome.error.as_ref().unwrap_or(&default_error);
                    println!("  {} {}: {}", "✗".red().bold(), outcome.dest, message.red())
                }
            }
        }

        if !result.addons_paths.is_empty() {
            println!("{} Addons path:", "::".blue().bold());
            for path in &result.addons_paths {
                println!("  {}", path.display());
            }
        }

        if result.is_success() {
            println!(
                "{} Synchronization completed ({} created, {} updated)",
                "✓".green().bold(),
                result.created_count(),
                result.updated_count()
            );
            Ok(())
        } else {
            Err(AdsyncError::workspace(format!(
                "{} of {} entries failed to synchronize",
                result.failed_count(),
                result.outcomes.len()
            )))
        }
    }
}
