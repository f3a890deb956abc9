/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `chat`    Interactive analysis conversation about an image
- `analyze` One-shot analysis against the hosted-inference endpoint

The handlers wire configuration into the library components (transport,
session, history, analyzer) and own all terminal output.
*/

use crate::config::Config;
use crate::error::{Result, ScanChatError};
use crate::payload;
use crate::transport::HttpTransport;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// Special commands parser for the chat prompt
pub mod special_commands;

// History listing and display
pub mod history;

/// Load an image from disk, reporting what was loaded
fn load_image(path: &Path, base64: bool) -> Result<crate::session::ImagePayload> {
    let image = payload::load_payload(path, base64)?;
    tracing::info!("Loaded image {} ({} bytes encoded)", path.display(), image.len());
    Ok(image)
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Builds a session over the HTTP transport, mirrors it into an
    //! in-memory history, sends the initial analysis request and then runs
    //! a readline loop for follow-up questions and slash commands.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::history::{HistoryBridge, HistoryStore};
    use crate::session::{ChatSession, SessionError, SessionOptions, SessionStatus};
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::path::PathBuf;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `image` - Image file to analyse
    /// * `prompt` - Optional question for the first turn
    /// * `base64` - The image file already holds base64 JPEG text
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client, the image or the terminal cannot
    /// be set up. Request failures are shown at the prompt instead.
    pub async fn run_chat(
        config: Config,
        image: PathBuf,
        prompt: Option<String>,
        base64: bool,
    ) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let transport = Arc::new(HttpTransport::new(
            config.api.base_url.clone(),
            config.api.timeout(),
        )?);
        let store = Arc::new(HistoryStore::new());
        let bridge = Arc::new(HistoryBridge::new(store.clone(), &config.history));
        let session = ChatSession::new(transport, SessionOptions::from_config(&config))
            .with_observer(bridge.clone());

        let payload = load_image(&image, base64)?;
        let mut rl = DefaultEditor::new().map_err(|e| ScanChatError::Readline(e.to_string()))?;

        print_welcome_banner(&config, &image);

        session.attach_image(payload);
        bridge.set_image_ref(Some(image.display().to_string()));
        println!("{}", "Analysing image...".dimmed());
        let outcome = session.send(prompt.as_deref()).await;
        report_outcome(&session, outcome);

        loop {
            match rl.readline(&format_prompt(&session)) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if let Err(e) = rl.add_history_entry(trimmed) {
                        tracing::debug!("Failed to record prompt history: {}", e);
                    }

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}", e.to_string().red());
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::Retry => {
                            println!("{}", "Retrying...".dimmed());
                            let outcome = session.retry().await;
                            report_outcome(&session, outcome);
                        }
                        SpecialCommand::ClearError => {
                            if session.clear_error() {
                                println!("{}", "Error dismissed.".green());
                            } else {
                                println!("{}", "Nothing to dismiss.".dimmed());
                            }
                        }
                        SpecialCommand::NewConversation => {
                            session.reset();
                            println!(
                                "{}",
                                "Started a new conversation. Attach an image with /image <path>."
                                    .green()
                            );
                        }
                        SpecialCommand::AttachImage(path) => match load_image(&path, base64) {
                            Ok(payload) => {
                                session.attach_image(payload);
                                bridge.set_image_ref(Some(path.display().to_string()));
                                println!("{}", "Analysing image...".dimmed());
                                let outcome = session.send(None).await;
                                report_outcome(&session, outcome);
                            }
                            Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                        },
                        SpecialCommand::ListHistory => history::print_history(&store),
                        SpecialCommand::ShowHistory(position) => {
                            if !history::print_entry(&store, position) {
                                eprintln!(
                                    "{}",
                                    format!("No history entry #{}", position).yellow()
                                );
                            }
                        }
                        SpecialCommand::ShowStatus => {
                            print_status_display(&session, store.len());
                        }
                        SpecialCommand::Help => print_help(),
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {
                            let outcome = session.send(Some(trimmed)).await;
                            report_outcome(&session, outcome);
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn format_prompt(session: &ChatSession) -> String {
        match session.status() {
            SessionStatus::Error(_) => format!("{} ", "[error] >>".red()),
            _ if !session.has_image() => format!("{} ", "[no image] >>".yellow()),
            _ => format!("{} ", ">>".cyan()),
        }
    }

    /// Print the reply or the failure of a send/retry
    fn report_outcome(
        session: &ChatSession,
        outcome: std::result::Result<SessionStatus, SessionError>,
    ) {
        match outcome {
            Ok(SessionStatus::Error(message)) => {
                eprintln!("{}", format!("Error: {}", message).red());
                eprintln!(
                    "{}",
                    "Type /retry to send the question again or /clear to dismiss.".dimmed()
                );
            }
            Ok(_) => {
                if let Some(reply) = session.transcript().iter().rev().find(|m| m.is_assistant()) {
                    println!();
                    history::print_message(reply);
                }
            }
            Err(SessionError::NoImage) => {
                eprintln!(
                    "{}",
                    "No image attached. Use /image <path> to attach one.".yellow()
                );
            }
            Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
        }
    }

    fn print_welcome_banner(config: &Config, image: &Path) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              ScanChat CT Analysis - Welcome!                 ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Service: {}", config.api.base_url.cyan());
        println!("Image:   {}\n", image.display());
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }

    fn print_status_display(session: &ChatSession, saved: usize) {
        let status = session.status();
        let status_text = match &status {
            SessionStatus::Error(_) => status.to_string().red(),
            SessionStatus::Sending => status.to_string().yellow(),
            SessionStatus::Idle => status.to_string().green(),
        };
        let image = if session.has_image() {
            "attached".green()
        } else {
            "none".yellow()
        };

        println!("\n{}", "Session Status".bold());
        println!("  Status:         {}", status_text);
        println!("  Image:          {}", image);
        println!("  Messages:       {}", session.transcript().len());
        println!("  Saved in history: {}\n", saved);
    }
}

// One-shot analysis handler
pub mod analyze {
    //! Sends one image to the hosted-inference endpoint and prints the
    //! generated findings.

    use super::*;
    use crate::analysis::CtAnalyzer;
    use std::path::PathBuf;

    /// Run a one-shot analysis
    ///
    /// # Errors
    ///
    /// Returns error if the image cannot be loaded or the analysis fails.
    pub async fn run_analyze(
        config: Config,
        image: PathBuf,
        base64: bool,
        json: bool,
    ) -> Result<()> {
        tracing::info!("Starting one-shot analysis of {}", image.display());

        let timeout = config.analysis.timeout_seconds.map(Duration::from_secs);
        let transport = Arc::new(HttpTransport::new(config.analysis.url.clone(), timeout)?);
        let mut analyzer = CtAnalyzer::new(transport, &config.analysis);

        let payload = load_image(&image, base64)?;
        let outcome = analyzer.analyze(&payload).await;
        let state = analyzer.state();

        if json {
            let output = serde_json::json!({
                "image": image.display().to_string(),
                "status": state.status.to_string(),
                "generated_text": state.result,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if let Some(findings) = &state.result {
            println!("\n{}\n", "CT Analysis".bold().cyan());
            println!("{}\n", findings);
        }
        outcome?;
        Ok(())
    }
}
