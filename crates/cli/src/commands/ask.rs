//! Ask command handler.
//!
//! Answers one question about the indexed course materials.

use super::{format_sources, query_failure};
use clap::Args;
use syllabus_core::{config::AppConfig, AppError, AppResult};
use syllabus_knowledge::RagSystem;

/// Ask one question about the course materials
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Continue an existing session
    #[arg(short, long)]
    pub session: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        if self.query.trim().is_empty() {
            return Err(AppError::Config("No question provided".to_string()));
        }

        let rag = RagSystem::open(config)?;
        let response = rag
            .query(&self.query, self.session.as_deref())
            .await
            .map_err(query_failure)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
            return Ok(());
        }

        println!("{}", response.answer);
        if !response.sources.is_empty() {
            println!("\nSources:\n{}", format_sources(&response.sources));
        }
        tracing::debug!("Session: {}", response.session_id);

        Ok(())
    }
}
