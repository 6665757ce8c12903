//! vehicle-term CLI
//!
//! Connects to a vehicle side, either directly or through a jump host, and
//! reads or edits its JSON parameter files:
//! - `list` / `config`: local profile and settings management
//! - `check`, `mount`, `read`, `write`, `edit`: remote file operations
//! - `exec`, `diagnose`: shell access and session report

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vehicle_term::commands::{self, ConfigPaths, TargetArgs};
use vt_core::types::RemoteFileKind;

#[derive(Parser)]
#[command(name = "vehicle-term")]
#[command(author, version, about = "Edit vehicle parameter files over SSH")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the settings file (config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the vehicle profile file (vehicles.json)
    #[arg(long, global = true)]
    vehicles: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List vehicle profiles
    #[command(alias = "ls")]
    List {
        /// Show usernames, jump host and working directory
        #[arg(short, long)]
        long: bool,
    },

    /// Show where the parameter files resolve on a side
    Check {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Remount the side's filesystem read-write
    Mount {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Download a parameter file (params or adas)
    Read {
        #[command(flatten)]
        target: TargetArgs,
        /// File to read: params or adas
        file: RemoteFileKind,
        /// Save to this local path instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload a local JSON file over a parameter file
    Write {
        #[command(flatten)]
        target: TargetArgs,
        /// File to replace: params or adas
        file: RemoteFileKind,
        /// Local JSON file, or - for stdin
        input: PathBuf,
    },

    /// Edit a parameter file in $EDITOR and upload the result
    Edit {
        #[command(flatten)]
        target: TargetArgs,
        /// File to edit: params or adas
        file: RemoteFileKind,
    },

    /// Run a shell command on the side
    Exec {
        #[command(flatten)]
        target: TargetArgs,
        /// Run on the jump host instead of the side
        #[arg(long)]
        on_vehicle: bool,
        /// Command and arguments
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },

    /// Connect and print a session report
    Diagnose {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Show configuration file paths
    Path,
    /// Create default configuration files
    Init {
        /// Overwrite an existing settings file
        #[arg(short, long)]
        force: bool,
    },
    /// Edit settings in $EDITOR
    Edit,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    // Logs go to stderr so `read` output can be piped
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let paths = ConfigPaths::resolve(cli.config, cli.vehicles);

    match cli.command {
        Commands::List { long } => commands::list_command(&paths, long)?,

        Commands::Check { target } => commands::check_command(&target, &paths).await?,

        Commands::Mount { target } => commands::mount_command(&target, &paths).await?,

        Commands::Read {
            target,
            file,
            output,
        } => commands::read_command(&target, &paths, file, output.as_deref()).await?,

        Commands::Write {
            target,
            file,
            input,
        } => commands::write_command(&target, &paths, file, &input).await?,

        Commands::Edit { target, file } => {
            commands::edit_command(&target, &paths, file).await?
        }

        Commands::Exec {
            target,
            on_vehicle,
            command,
        } => commands::exec_command(&target, &paths, &command, on_vehicle).await?,

        Commands::Diagnose { target } => commands::diagnose_command(&target, &paths).await?,

        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_show(&paths)?,
            ConfigAction::Path => commands::config_path(&paths),
            ConfigAction::Init { force } => commands::config_init(&paths, force)?,
            ConfigAction::Edit => commands::config_edit(&paths)?,
        },
    }

    Ok(())
}
