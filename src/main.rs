//! clinia - Turns recorded medical consultations into structured SOAP notes
//!
//! Entry point for the clinia CLI application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clinia::cli::{commands, Cli, Commands};
use clinia::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clinia::cli::completions::print(shell);
        return Ok(());
    }

    // Load configuration only for runtime commands.
    let settings = Settings::load()?;
    init_logging(cli.verbose, &settings.general.log_level);

    match cli.command {
        Commands::Serve { host, port } => {
            commands::serve(&settings, host, port).await?;
        }
        Commands::Process {
            audio,
            no_document,
            raw_transcript,
            output,
        } => {
            commands::process_audio(&settings, &audio, no_document, raw_transcript, output)
                .await?;
        }
        Commands::Extract {
            transcript,
            document,
        } => {
            commands::extract_transcript(&settings, &transcript, document).await?;
        }
        Commands::Doctor { json } => {
            commands::run_doctor(&settings, json).await?;
        }
        Commands::Config(config_cmd) => {
            commands::config_command(&settings, config_cmd)?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `--verbose` means debug, else the configured level.
fn init_logging(verbose: bool, configured: &str) {
    let default_level = if verbose { "debug" } else { configured };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
