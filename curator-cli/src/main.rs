//! Main entry point for the Curator CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use shared::config::Config;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt};

mod commands;

use commands::session::{LoginArgs, NavigateArgs, StatusArgs};

/// Curator CLI
#[derive(Parser)]
#[command(name = "curator")]
#[command(about = "Command-line front end for the Curator admin console", long_about = None)]
struct Cli {
    /// Path to the configuration file (.yaml, .yml or .json)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for the Curator CLI
#[derive(Subcommand)]
enum Commands {
    /// Sign in to every backend with one set of credentials
    Login(LoginArgs),

    /// Sign out of every backend
    Logout,

    /// Show which backends are signed in
    Status(StatusArgs),

    /// Run the navigation guard against a path
    Navigate(NavigateArgs),

    /// List the console routes and their access requirement
    Routes,

    /// Generate a configuration file
    Config {
        /// Format of the configuration file to generate (yaml or json). Defaults to yaml.
        #[arg(long, short, default_value = "yaml")]
        format: String,
    },

    /// Generate shell completion scripts for the CLI
    Completion {
        /// The shell type for which to generate the completion script (e.g., bash, zsh, fish, powershell)
        #[arg(long, short)]
        shell: clap_complete::Shell,
    },
}

/// Log to stderr, honoring `RUST_LOG` over the configured level.
fn initialize_tracing(config: &Config) {
    let default_level = config
        .log_level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy()
    });

    fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.command {
        Commands::Config { format } => return commands::config::generate_config(format),
        Commands::Completion { shell } => {
            commands::completion::generate_completion(*shell);
            return Ok(());
        }
        _ => Config::load_config(cli.config.clone())?,
    };
    initialize_tracing(&config);

    match cli.command {
        Commands::Login(args) => commands::session::login(&config, args).await,
        Commands::Logout => commands::session::logout(&config).await,
        Commands::Status(args) => commands::session::status(&config, args).await,
        Commands::Navigate(args) => commands::session::navigate(&config, args).await,
        Commands::Routes => commands::routes::list_routes(&config),
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}
