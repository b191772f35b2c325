//! Talvi - AI chat client
//!
#![doc = "Talvi - AI chat client"]
#![doc = "Main entry point for the Talvi application."]

use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use talvi::auth::TokenStore;
use talvi::cli::{Cli, Commands};
use talvi::commands;
use talvi::config::Config;
use talvi::storage::SqliteStorage;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    // Mirror a CLI storage override into TALVI_HISTORY_DB so the storage
    // initializer picks it up without threading the path everywhere.
    if let Some(db_path) = &cli.storage_path {
        std::env::set_var("TALVI_HISTORY_DB", db_path);
        tracing::info!("Using storage DB override from CLI: {}", db_path.display());
    }

    let config = Config::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Chat { mode, speak } => {
            if let Some(m) = &mode {
                tracing::debug!("Using mode override: {}", m);
            }
            let storage = Arc::new(open_storage(&config)?);
            commands::chat::run_chat(config, storage, mode, speak).await?;
            Ok(())
        }
        Commands::Code { language, prompt } => {
            let Some(session) = TokenStore::new().load()? else {
                println!(
                    "{}",
                    format!("Not signed in. Run {} first.", "talvi login".cyan()).yellow()
                );
                return Ok(());
            };
            let storage = open_storage(&config)?;
            let provider = talvi::providers::create_provider(&config.provider)?;
            commands::code::handle_code(
                provider.as_ref(),
                &storage,
                &session.user.id,
                &language,
                &prompt,
            )
            .await?;
            Ok(())
        }
        Commands::History { command } => {
            tracing::info!("Starting history command");
            let Some(session) = TokenStore::new().load()? else {
                println!(
                    "{}",
                    format!("Not signed in. Run {} first.", "talvi login".cyan()).yellow()
                );
                return Ok(());
            };
            let storage = open_storage(&config)?;
            commands::history::handle_history(
                &storage,
                &session.user.id,
                command,
                config.chat.history_limit,
            )?;
            Ok(())
        }
        Commands::Login {
            email,
            signup,
            anonymous,
            provider,
        } => {
            commands::auth::handle_login(&config, email, signup, anonymous, provider).await?;
            Ok(())
        }
        Commands::Logout => {
            commands::auth::handle_logout(&config).await?;
            Ok(())
        }
    }
}

/// Open the history store, honoring the configured path when set
fn open_storage(config: &Config) -> Result<SqliteStorage> {
    match &config.storage.path {
        Some(path) => SqliteStorage::new_with_path(path.clone()),
        None => SqliteStorage::new(),
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "talvi=debug" } else { "talvi=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
