use colored::Colorize;
use std::path::PathBuf;

use crate::common::result::AdsyncResult;
use crate::presentation::cli::commands::repo_for_dest;

/// Handler for the revert command
pub struct RevertCommand {
    pub manifest_path: PathBuf,
    pub dest: String,
    pub revision: String,
}

impl RevertCommand {
    pub fn new(manifest_path: PathBuf, dest: String, revision: String) -> Self {
        Self {
            manifest_path,
            dest,
            revision,
        }
    }

    pub async fn execute(&self) -> AdsyncResult<()> {
        let repo = repo_for_dest(&self.manifest_path, &self.dest)?;
        repo.revert(&self.revision).await?;
        println!(
            "{} Reverted {} to {}",
            "✓".green().bold(),
            self.dest,
            if self.revision.is_empty() {
                "its current revision"
            } else {
                &self.revision
            }
        );
        Ok(())
    }
}
