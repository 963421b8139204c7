//! Lumina CLI - describe a landing page, get a runnable site.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

use config::LuminaConfig;

#[derive(Parser)]
#[command(name = "lumina")]
#[command(about = "Generate, publish and export AI-built landing pages")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to lumina.toml config file
    #[arg(short, long, default_value = "lumina.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default lumina.toml
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        yes: bool,
    },

    /// Start the application server
    Serve {
        /// Port to listen on (defaults to config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Open a browser
        #[arg(long)]
        open: bool,
    },

    /// Generate a page and add it to your history
    Generate {
        /// Account email; the password is read from LUMINA_PASSWORD
        #[arg(short, long)]
        email: String,

        /// What the page should be
        #[arg(short, long)]
        prompt: String,
    },

    /// Export a page from your history
    Export {
        /// Account email; the password is read from LUMINA_PASSWORD
        #[arg(short, long)]
        email: String,

        /// Page id
        id: String,

        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Write a project folder instead of a zip archive
        #[arg(long)]
        dir: bool,
    },

    /// Render a published page
    View {
        /// Public id (the `p` parameter of a public link)
        public_id: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Serve { port, open } => {
            let config = LuminaConfig::load(&cli.config)?;
            commands::serve::run(config, port, open).await?;
        }
        Commands::Generate { email, prompt } => {
            let config = LuminaConfig::load(&cli.config)?;
            commands::generate::run(config, &email, prompt).await?;
        }
        Commands::Export {
            email,
            id,
            output,
            dir,
        } => {
            let config = LuminaConfig::load(&cli.config)?;
            commands::export::run(config, &email, &id, &output, dir).await?;
        }
        Commands::View { public_id, output } => {
            let config = LuminaConfig::load(&cli.config)?;
            commands::view::run(config, &public_id, output).await?;
        }
    }

    Ok(())
}
