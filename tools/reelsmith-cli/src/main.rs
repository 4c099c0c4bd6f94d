//! Reelsmith CLI — Command-line interface for assembling promo videos.
//!
//! Usage:
//!   reelsmith render <SCRIPT> --assets <DIR>   Render a script to video
//!   reelsmith validate <SCRIPT>                Validate a script file
//!   reelsmith info <SCRIPT>                    Show the resolved timeline
//!   reelsmith check                            Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "reelsmith",
    about = "Deterministic promo-video assembly from generated media",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a script to a finished video
    Render {
        /// Path to the script JSON file
        script: PathBuf,

        /// Directory of generated media files, keyed by file stem
        #[arg(short, long)]
        assets: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output width
        #[arg(long)]
        width: Option<u32>,

        /// Output height
        #[arg(long)]
        height: Option<u32>,

        /// Output frame rate
        #[arg(long)]
        fps: Option<u32>,
    },

    /// Validate a script file and its asset references
    Validate {
        /// Path to the script JSON file
        script: PathBuf,

        /// Directory of generated media files to check references against
        #[arg(short, long)]
        assets: Option<PathBuf>,
    },

    /// Show the timeline a script resolves to
    Info {
        /// Path to the script JSON file
        script: PathBuf,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    reelsmith_common::logging::init_logging(&reelsmith_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    match cli.command {
        Commands::Render {
            script,
            assets,
            output,
            width,
            height,
            fps,
        } => commands::render::run(script, assets, output, width, height, fps).await,
        Commands::Validate { script, assets } => commands::validate::run(script, assets),
        Commands::Info { script } => commands::info::run(script),
        Commands::Check => commands::check::run(),
    }
}
