//! Command-line runner for the job description store.
//!
//! # Responsibility
//! - Expose repository operations for local use and smoke checks.
//! - Keep output machine-readable (pretty JSON on stdout).

use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Debug, Parser)]
#[command(name = "jobdesc")]
#[command(about = "Store and query job descriptions per user", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: config::CliConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create or replace a job description from a JSON payload
    Upsert(commands::UpsertArgs),
    /// List a user's job descriptions
    List(commands::ListArgs),
    /// Show one job description owned by a user
    Get(commands::RecordArgs),
    /// Delete one job description owned by a user
    Delete(commands::RecordArgs),
    /// Delete every job description of every user
    Wipe(commands::WipeArgs),
    /// Print the core library version
    Version,
}

fn main() {
    // Env defaults for clap come from the process environment, so load .env first.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Version = cli.command {
        println!("{}", jobdesc_core::core_version());
        return Ok(());
    }

    cli.config.init_logging()?;
    let repo = cli.config.open_repository()?;

    match cli.command {
        Commands::Upsert(args) => commands::upsert(&repo, args),
        Commands::List(args) => commands::list(&repo, args),
        Commands::Get(args) => commands::get(&repo, args),
        Commands::Delete(args) => commands::delete(&repo, args),
        Commands::Wipe(args) => commands::wipe(&repo, args),
        Commands::Version => Ok(()),
    }
}
