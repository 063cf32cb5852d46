use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod report;

use cli::{Cli, Command};
use config::{Config, API_KEY_ENV};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?
        .with_api_key_override(std::env::var(API_KEY_ENV).ok());

    match &cli.command {
        Command::Parse(args) => commands::parse(&config, args),
        Command::Scan(args) if args.dry_run => commands::scan(&config, None, args).await,
        Command::Scan(args) => {
            let db = open_db(&cli, &config).await?;
            commands::scan(&config, Some(&db), args).await
        }
        Command::List => commands::list(&open_db(&cli, &config).await?).await,
        Command::Add(args) => commands::add(&open_db(&cli, &config).await?, args).await,
        Command::Edit(args) => commands::edit(&open_db(&cli, &config).await?, args).await,
        Command::Delete { id } => commands::delete(&open_db(&cli, &config).await?, *id).await,
    }
}

async fn open_db(cli: &Cli, config: &Config) -> Result<tally_storage::DbPool> {
    let path = match &cli.db {
        Some(p) => p.clone(),
        None => config.database_path()?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tracing::debug!(path = %path.display(), "opening database");
    tally_storage::create_db(&path)
        .await
        .with_context(|| format!("opening database {}", path.display()))
}
