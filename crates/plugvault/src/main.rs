//! Plugvault CLI - browse, install and load native plugins
//!
//! This is the main entry point for the plugvault command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.global.verbose, cli.global.quiet);

    let global = cli.global;
    match cli.command {
        Commands::Connect(args) => commands::connect::run(args, &global).await,
        Commands::List(args) => commands::list::run(args, &global).await,
        Commands::Info(args) => commands::info::run(args, &global).await,
        Commands::Search(args) => commands::search::run(args, &global).await,
        Commands::Install(args) => commands::install::run(args, &global).await,
        Commands::Remove(args) => commands::remove::run(args, &global).await,
        Commands::Load(args) => commands::load::run(args, &global).await,
        Commands::LoadLocal(args) => commands::local::load(args, &global).await,
        Commands::Forget(args) => commands::local::forget(args, &global).await,
        Commands::Missing(args) => commands::missing::run(args, &global).await,
        Commands::Submit(args) => commands::submit::run(args, &global).await,
        Commands::Config(cmd) => commands::config::run(cmd, &global),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            // Lifecycle milestones only; -v for protocol steps
            0 => EnvFilter::new("warn,plugvault_manager=info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
