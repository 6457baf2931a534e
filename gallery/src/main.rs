//! Gallery CLI - export, import and manage animation template packages

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod controller;
mod prompt;
mod source;

use cli::{Cli, Commands};
use commands::Gallery;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();

    let gallery = Gallery::open(cli.data_dir).await?;

    match cli.command {
        Commands::Export(args) => commands::export::execute(args, &gallery).await,
        Commands::ExportInstalled(args) => commands::export::execute_installed(args, &gallery).await,
        Commands::Import(args) => commands::import::execute(args, &gallery).await,
        Commands::List(args) => commands::list::execute(args, &gallery).await,
        Commands::Show(args) => commands::show::execute(args, &gallery).await,
        Commands::Remove(args) => commands::remove::execute(args, &gallery).await,
    }
}
