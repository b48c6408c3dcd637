//! Config command - manage configuration.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use kraftquota_core::{Metro, OutputFormat};
use kraftquota_fetch::host::keychain::{accounts, services};
use kraftquota_fetch::{KeychainApi, SystemKeychain};
use kraftquota_store::{Settings, SettingsStore, clear_token, default_config_dir, store_token};
use tracing::info;

use crate::Cli;
use crate::output::{JsonFormatter, YamlFormatter};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show {
        /// Set output format. Options: table, yaml, json, list.
        #[arg(long, short, default_value = "list")]
        output: String,
    },

    /// Show configuration paths.
    Path,

    /// Set the metro used when none is given.
    SetMetro {
        /// Metro name, e.g. fra0.
        metro: String,
    },

    /// Set the account user name.
    SetUser {
        /// User name.
        user: String,
    },

    /// Store a token in the system keychain.
    SetToken {
        /// Token, usually base64("user:secret").
        token: String,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await?;

    match &args.action {
        ConfigAction::Show { output } => show_config(&store, output).await,
        ConfigAction::Path => {
            show_paths(&store);
            Ok(())
        }
        ConfigAction::SetMetro { metro } => set_metro(&store, metro, cli).await,
        ConfigAction::SetUser { user } => set_user(&store, user, cli).await,
        ConfigAction::SetToken { token } => set_token(&store, token, cli).await,
        ConfigAction::Reset => reset_config(&store, cli).await,
    }
}

async fn show_config(store: &SettingsStore, output: &str) -> Result<()> {
    let format: OutputFormat = output.parse()?;
    let settings = store.get().await;

    if format.is_text() {
        let token_stored = token_stored(&settings).await;
        println!("kraftquota Configuration");
        println!("{}", "─".repeat(40));
        println!();
        println!("Default metro: {}", display_or_unset(settings.default_metro.as_ref()));
        println!("User:          {}", display_or_unset(settings.user.as_ref()));
        println!("API URL:       {}", display_or_unset(settings.api_url.as_ref()));
        println!("Timeout:       {}s", settings.timeout().as_secs());
        println!("Color:         {}", settings.color);
        println!("Token stored:  {token_stored}");
    } else if format == OutputFormat::Json {
        println!("{}", JsonFormatter::new(true).format(&settings)?);
    } else {
        println!("{}", YamlFormatter.format(&settings)?);
    }

    Ok(())
}

fn display_or_unset(value: Option<&impl std::fmt::Display>) -> String {
    value.map_or_else(|| "(unset)".to_string(), ToString::to_string)
}

async fn token_stored(settings: &Settings) -> bool {
    let account = settings.user.as_deref().unwrap_or(accounts::TOKEN);
    SystemKeychain::new().exists(services::KRAFTCLOUD, account).await
}

fn show_paths(store: &SettingsStore) {
    println!("Config dir:    {}", default_config_dir().display());
    println!("Settings file: {}", store.path().display());
}

async fn set_metro(store: &SettingsStore, metro: &str, cli: &Cli) -> Result<()> {
    let metro = Metro::new(metro)?;

    let recorded = metro.clone();
    store.update(move |s| s.default_metro = Some(recorded)).await;
    store.save().await?;

    info!(metro = %metro, "Default metro updated");
    if !cli.quiet {
        println!("Default metro set to: {metro}");
    }
    Ok(())
}

async fn set_user(store: &SettingsStore, user: &str, cli: &Cli) -> Result<()> {
    let user = user.trim().to_string();
    if user.is_empty() {
        anyhow::bail!("user name cannot be empty");
    }

    let recorded = user.clone();
    store.update(move |s| s.user = Some(recorded)).await;
    store.save().await?;

    info!(user = %user, "User updated");
    if !cli.quiet {
        println!("User set to: {user}");
    }
    Ok(())
}

async fn set_token(store: &SettingsStore, token: &str, cli: &Cli) -> Result<()> {
    let auth = store_token(store, &SystemKeychain::new(), token)
        .await
        .context("could not store token")?;

    if !cli.quiet {
        match &auth.user {
            Some(user) => println!("Token stored for user: {user}"),
            None => println!("Token stored"),
        }
    }
    Ok(())
}

async fn reset_config(store: &SettingsStore, cli: &Cli) -> Result<()> {
    let removed = clear_token(&store.get().await, &SystemKeychain::new()).await?;
    if removed && !cli.quiet {
        println!("Stored token removed");
    }

    let path = store.path();

    if path.exists() {
        tokio::fs::remove_file(path).await?;
        info!(path = %path.display(), "Settings reset");
        if !cli.quiet {
            println!("Configuration reset to defaults");
        }
    } else if !cli.quiet {
        println!("No configuration file to reset");
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
