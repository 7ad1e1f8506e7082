//! Chat command handler.
//!
//! A read-eval-print loop that keeps one conversation session, so follow-up
//! questions see the previous exchanges.

use super::{format_sources, query_failure};
use clap::Args;
use std::io::Write;
use syllabus_core::{config::AppConfig, AppResult};
use syllabus_knowledge::RagSystem;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive question answering in a single session
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Hide sources after each answer
    #[arg(long)]
    pub no_sources: bool,
}

/// What a line of input asks the loop to do.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Skip,
    Quit,
    NewSession,
    Question(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Skip,
        "exit" | "quit" | "/exit" | "/quit" => Input::Quit,
        "/new" => Input::NewSession,
        question => Input::Question(question),
    }
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let rag = RagSystem::open(config)?;
        let mut session = rag.sessions().create_session();
        tracing::info!("Chat session {} started", session);

        eprintln!("Ask about your courses. '/new' starts over, 'exit' quits.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            eprint!("> ");
            std::io::stderr().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match classify(&line) {
                Input::Skip => continue,
                Input::Quit => break,
                Input::NewSession => {
                    rag.sessions().clear_session(&session);
                    session = rag.sessions().create_session();
                    eprintln!("Started a new session.");
                }
                Input::Question(question) => {
                    match rag.query(question, Some(&session)).await.map_err(query_failure) {
                        Ok(response) => {
                            println!("{}", response.answer);
                            if !self.no_sources && !response.sources.is_empty() {
                                println!("\nSources:\n{}", format_sources(&response.sources));
                            }
                            println!();
                        }
                        // Keep the session alive across failed questions
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
            }
        }

        Ok(())
    }
}
