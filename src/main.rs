//! Feedback Backend - reporting service for QA feedback and retrieval diagnostics
//!
//! Entry point for the HTTP API server and its maintenance commands.

mod cli;

use clap::{Parser, Subcommand};
use feedback_core::{config::AppConfig, error::Result};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(name = "feedback-backend")]
#[command(about = "Reporting backend for QA feedback, retrieval diagnostics and OneNote sync logs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Configuration file (TOML)
    #[arg(short, long, env = "FEEDBACK_CONFIG")]
    config: Option<PathBuf>,

    /// Database path (overrides configuration)
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server (default)
    Serve {
        /// Server address (overrides configuration)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Create the database and apply the schema
    Init,

    /// Create a user, e.g. the first administrator
    CreateUser {
        /// Login name
        username: String,

        /// Display name
        #[arg(long)]
        full_name: Option<String>,

        /// Grant administrator rights
        #[arg(long)]
        admin: bool,

        /// Password (prompted on stdin when omitted)
        #[arg(long, env = "FEEDBACK_NEW_USER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Crate at the chosen level, WARN for noisy dependencies
    let level = level.as_str().to_lowercase();
    let filter = EnvFilter::new(format!(
        "feedback_core={level},feedback_backend={level},tower_http={level},hyper=warn,rusqlite=warn"
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("Feedback backend v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(db_path) = cli.db_path {
        config.database_path = db_path;
    }

    match cli.command.unwrap_or(Commands::Serve { addr: None }) {
        Commands::Serve { addr } => {
            if let Some(addr) = addr {
                config.bind_addr = addr;
                config.validate()?;
            }
            cli::serve::handle(&config).await
        }
        Commands::Init => cli::init::handle(&config).await,
        Commands::CreateUser {
            username,
            full_name,
            admin,
            password,
        } => cli::users::handle(&config, username, full_name, admin, password).await,
    }
}
