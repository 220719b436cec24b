//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// clinia - Turns recorded medical consultations into structured SOAP notes
#[derive(Parser, Debug)]
#[command(name = "clinia")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a recorded consultation through the full pipeline
    Process {
        /// Audio file (wav, mp3, webm, ogg, m4a)
        audio: PathBuf,

        /// Skip Google Docs generation
        #[arg(long)]
        no_document: bool,

        /// Log the full transcript with speaker turns
        #[arg(long)]
        raw_transcript: bool,

        /// Write the session JSON to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract a SOAP record from a plain-text transcript
    Extract {
        /// Transcript file
        transcript: PathBuf,

        /// Also create a Google Doc from the record
        #[arg(long)]
        document: bool,
    },

    /// Check which providers are configured
    Doctor {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration (secrets masked)
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}
