//! Ingest command handler.

use clap::Args;
use std::path::PathBuf;
use syllabus_core::{config::AppConfig, AppResult};
use syllabus_knowledge::RagSystem;

/// Index a folder of course documents
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Folder with course documents (default: the configured docs path)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Drop all indexed courses before ingesting
    #[arg(long)]
    pub clear: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let folder = self.path.clone().unwrap_or_else(|| config.docs_path());
        tracing::info!("Executing ingest command for {:?}", folder);

        let rag = RagSystem::open(config)?;
        let stats = rag.add_course_folder(&folder, self.clear).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!(
                "Added {} courses ({} chunks), skipped {} already indexed, {} failed",
                stats.courses_added, stats.chunks_added, stats.skipped, stats.failed
            );
        }

        Ok(())
    }
}
