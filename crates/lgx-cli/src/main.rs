mod commands;
mod encode;
mod report;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "lgx")]
#[command(about = "Lower structured programs into LogiX node graphs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log lowering progress
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Line-oriented text records
    Lgx,
    /// Record stream as JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Lower a program tree and write the graph records
    Lower {
        /// Program tree (JSON)
        file: PathBuf,

        /// Lowering settings (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "lgx")]
        format: OutputFormat,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Source text the tree's spans point into
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Lower a program tree and fail if any construct was skipped
    Check {
        /// Program tree (JSON)
        file: PathBuf,

        /// Lowering settings (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Source text the tree's spans point into
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// List the node kinds and type names the lowerer knows
    Catalog {
        /// Lowering settings (TOML) whose type aliases are listed too
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Lower {
            file,
            config,
            format,
            output,
            source,
        } => {
            commands::lower::run(
                &file,
                config.as_deref(),
                format,
                output.as_deref(),
                source.as_deref(),
            )?;
        }
        Commands::Check {
            file,
            config,
            source,
        } => {
            commands::check::run(&file, config.as_deref(), source.as_deref())?;
        }
        Commands::Catalog { config } => {
            commands::catalog::run(config.as_deref())?;
        }
    }

    Ok(())
}
