// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use photobooth::backends::camera::{CameraBackendType, get_backend_for_type};
use photobooth::backends::feedback::{Feedback, Silent, TerminalBell};
use photobooth::config::Config;
use photobooth::filters::FilterId;
use photobooth::i18n;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Coin-operated photobooth for the terminal")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Camera backend (overrides the configuration file)
    #[arg(long, global = true, value_enum)]
    backend: Option<CameraBackendType>,

    /// Camera device path, e.g. /dev/video0
    #[arg(long, global = true)]
    device: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the booth in the terminal (default)
    Kiosk,

    /// List available cameras
    List,

    /// Take a single photo without the kiosk
    Snap {
        /// Filter to bake into the photo (none, sepia, neon, ...)
        #[arg(short, long, default_value = "none")]
        filter: String,

        /// Output file or directory (default: the configured export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=photobooth=debug, RUST_LOG=info
    // Logs go to stderr, away from the kiosk screen
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    // Get the system's preferred languages.
    let requested_languages = i18n_embed::DesktopLanguageRequester::requested_languages();
    i18n::init(&requested_languages);

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.camera.backend = backend;
    }
    if let Some(device) = cli.device {
        config.camera.device = Some(device);
    }

    let backend = get_backend_for_type(config.camera.backend);

    match cli.command {
        Some(Commands::List) => cli::list_cameras(backend.as_ref()),
        Some(Commands::Snap { filter, output }) => {
            cli::snap(&config, backend, FilterId::from_name(&filter), output)
        }
        Some(Commands::Kiosk) | None => {
            let feedback: Arc<dyn Feedback> = if config.feedback_enabled {
                Arc::new(TerminalBell::stdout())
            } else {
                Arc::new(Silent)
            };
            photobooth::terminal::run(config, backend, feedback)
        }
    }
}
