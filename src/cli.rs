//! Command-line interface definition for ScanChat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat and one-shot analysis.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ScanChat - CT scan analysis client
///
/// Send a CT scan image to a remote analysis service and ask follow-up
/// questions about the findings.
#[derive(Parser, Debug, Clone)]
#[command(name = "scanchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the chat service base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for ScanChat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive analysis conversation about an image
    Chat {
        /// Image file to analyse
        #[arg(short, long)]
        image: PathBuf,

        /// Question sent with the first turn (empty asks for a general analysis)
        #[arg(short, long)]
        prompt: Option<String>,

        /// The image file already holds base64 JPEG text
        #[arg(long)]
        base64: bool,
    },

    /// Run a one-shot analysis against the hosted-inference endpoint
    Analyze {
        /// Image file to analyse
        #[arg(short, long)]
        image: PathBuf,

        /// The image file already holds base64 JPEG text
        #[arg(long)]
        base64: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            base_url: None,
            command: Commands::Chat {
                image: PathBuf::from("scan.jpg"),
                prompt: None,
                base64: false,
            },
        }
    }
}
