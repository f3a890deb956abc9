//! ScanChat - CT scan analysis chat client
//!
#![doc = "ScanChat - CT scan analysis chat client"]
#![doc = "Main entry point for the ScanChat command-line application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scanchat::cli::{Cli, Commands};
use scanchat::commands;
use scanchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat {
            image,
            prompt,
            base64,
        } => {
            tracing::debug!("Chat image: {}", image.display());
            if let Some(p) = &prompt {
                tracing::debug!("Using initial prompt: {}", p);
            }
            commands::chat::run_chat(config, image, prompt, base64).await?;
            Ok(())
        }
        Commands::Analyze {
            image,
            base64,
            json,
        } => {
            commands::analyze::run_analyze(config, image, base64, json).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins; otherwise `--verbose` selects debug output.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "scanchat=debug" } else { "scanchat=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
