use colored::Colorize;
use std::path::PathBuf;

use crate::common::result::AdsyncResult;
use crate::presentation::cli::commands::repo_for_dest;

/// Handler for the archive command
pub struct ArchiveCommand {
    pub manifest_path: PathBuf,
    pub dest: String,
    pub target: PathBuf,
}

impl ArchiveCommand {
    pub fn new(manifest_path: PathBuf, dest: String, target: PathBuf) -> Self {
        Self {
            manifest_path,
            dest,
            target,
        }
    }

    pub async fn execute(&self) -> AdsyncResult<()> {
        let repo = repo_for_dest(&self.manifest_path, &self.dest)?;
        repo.archive(&self.target).await?;
        println!(
            "{} Exported {} to {}",
            "✓".green().bold(),
            self.dest,
            self.target.display()
        );
        Ok(())
    }
}
