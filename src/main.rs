mod config;
mod database;
mod entities;
mod http_server;
mod logging;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    config::Config, database::Database, http_server::app::HttpServerConfig,
    logging::init_tracing,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "STUDIO_MANAGER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log filter directives, overriding the config file (e.g. "debug,sqlx=warn")
    #[arg(long, env = "STUDIO_MANAGER_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// The port to run the server on, overriding the config file
        #[arg(short, long, env = "STUDIO_MANAGER_HTTP_PORT")]
        port: Option<u16>,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let mut config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load studio-manager config")?;

    let mut telemetry = config.telemetry().clone();
    if let Some(log_level) = args.log_level {
        telemetry.log_level = log_level;
    }
    let _tracing_guard = init_tracing(&telemetry)?;

    match args.command {
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                let path = Config::create_default()?;
                tracing::info!("Default config at {}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.set_port(port);
            }

            let database = Database::open(&config.database_path()).await?;

            tracing::info!("Starting HTTP server on port: {}", config.port());
            http_server::app::start(HttpServerConfig {
                port: config.port(),
                database,
            })
            .await?;
        }
    }

    Ok(())
}
