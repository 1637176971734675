mod cli;

use anyhow::{anyhow, Result};
use checkflow_core::models::{Configuration, LogLevel};
use checkflow_core::services::init_logging;
use clap::{Parser, Subcommand};
use cli::{admin, admin_handlers, context, handlers, request, request_handlers};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "checkflow")]
#[command(version)]
#[command(about = "Maker-checker approval workflow for user administration changes")]
#[command(
    help_template = "{name} - {version}\n{about}\n\n{usage-heading}\n  {usage}\n\n{all-args}{options}\n"
)]
struct Cli {
    /// Path to configuration file (default: XDG config dir)
    #[arg(long, global = true, env = "CHECKFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the JSON store, overriding the configuration
    #[arg(long, global = true, env = "CHECKFLOW_STORE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    ///
    /// Examples:
    ///   checkflow serve
    ///   checkflow serve --host 0.0.0.0 --port 9000 --store ./store.json
    Serve {
        /// Server bind address (default: from configuration)
        #[arg(long)]
        host: Option<String>,

        /// Server port number (default: from configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Create, review and inspect approval requests
    Request {
        #[command(subcommand)]
        command: request::RequestCommands,
    },

    /// Administer users, roles and units
    Admin {
        #[command(subcommand)]
        command: admin::AdminCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a configuration file from defaults and the given values
    Init {
        /// Server bind address
        #[arg(long)]
        host: Option<String>,

        /// Server port number
        #[arg(short, long)]
        port: Option<u16>,

        /// Log level (error, warn, info, debug, trace)
        #[arg(long)]
        log_level: Option<LogLevel>,

        /// Whether creators may review their own requests
        #[arg(long)]
        allow_self_review: Option<bool>,

        /// Update an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_file = cli.config.as_deref();

    match cli.command {
        Commands::Config {
            command:
                ConfigCommands::Init {
                    host,
                    port,
                    log_level,
                    allow_self_review,
                    force,
                },
        } => handlers::handle_config_init(
            config_file,
            handlers::ConfigInit {
                store: cli.store,
                host,
                port,
                log_level,
                allow_self_review,
                force,
            },
        ),
        command => {
            let config = context::load_configuration(config_file, cli.store)?;
            init_logging(config.log_level)
                .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
            run(config, command).await
        }
    }
}

async fn run(config: Configuration, command: Commands) -> Result<()> {
    tracing::debug!(store = %config.store_path.display(), "Configuration loaded");

    match command {
        Commands::Serve { host, port } => {
            handlers::handle_serve(config, host, port).await?;
        }
        Commands::Config {
            command: ConfigCommands::Show { json },
        } => {
            handlers::handle_config_show(&config, json)?;
        }
        Commands::Config {
            command: ConfigCommands::Init { .. },
        } => {
            println!("Config init does not need an existing configuration");
            println!("Usage: checkflow config init [--config PATH] [--force]");
        }
        Commands::Request { command } => {
            let app = context::open(&config)?;
            request_handlers::handle_request_command(&app, command)?;
        }
        Commands::Admin { command } => {
            let app = context::open(&config)?;
            admin_handlers::handle_admin_command(&app, command)?;
        }
    }

    Ok(())
}
