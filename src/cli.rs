//! Command-line shell over the journal client.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime};
use clap::{Parser, Subcommand};

use dream_journal_client::analysis::DreamEntry;
use dream_journal_client::auth::{MemoryTokenStore, SessionGuard};
use dream_journal_client::client::journal::preview_analysis;
use dream_journal_client::client::{DreamJournal, ReqwestTransport};
use dream_journal_client::config::{Config, CredentialsConfig};

#[derive(Debug, Parser)]
#[command(name = "dream-journal", version, about = "Record dreams and read what they say")]
pub struct Cli {
    /// Account name (overrides DREAM_JOURNAL_USERNAME)
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Account password (overrides DREAM_JOURNAL_PASSWORD)
    #[arg(long, global = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a dream locally without saving it
    Analyze { text: String },
    /// Create an account
    Register,
    /// Save a dream
    Add { text: String },
    /// List recorded dreams
    Dreams,
    /// Show mood trends, recurring themes and insights
    Insights,
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    if let Command::Analyze { text } = &cli.command {
        println!("{}", serde_json::to_string_pretty(&preview_analysis(text))?);
        return Ok(());
    }

    let credentials = resolve_credentials(&cli, &config)?;
    let transport = ReqwestTransport::new(config.api.base_url.clone(), config.api.timeout)?;
    let guard = Arc::new(
        SessionGuard::new(Arc::new(transport), Arc::new(MemoryTokenStore::new()))
            .with_expiry_margin(config.session.expiry_margin),
    );
    let journal = DreamJournal::new(Arc::clone(&guard));

    if let Command::Register = cli.command {
        journal
            .register(&credentials.username, &credentials.password)
            .await
            .context("Registration failed")?;
        println!("Registration successful!");
        return Ok(());
    }

    journal
        .login(&credentials.username, &credentials.password)
        .await
        .context("Login failed")?;
    let token_check = guard.spawn_token_check(config.session.check_interval);

    let outcome = match cli.command {
        Command::Add { text } => journal.add_dream(&text).await.map(|dream_id| {
            println!("Dream saved successfully! (id {dream_id})");
        }),
        Command::Dreams => journal.get_dreams().await.map(|dreams| print_dreams(&dreams)),
        Command::Insights => journal.load_insights().await.map(|report| println!("{report}")),
        Command::Analyze { .. } | Command::Register => Ok(()),
    };

    token_check.abort();
    outcome.map_err(Into::into)
}

fn resolve_credentials(cli: &Cli, config: &Config) -> Result<CredentialsConfig> {
    let fallback = config.credentials.clone();
    let username = cli
        .username
        .clone()
        .or_else(|| fallback.as_ref().map(|c| c.username.clone()))
        .ok_or_else(|| anyhow!("no username given (use --username or DREAM_JOURNAL_USERNAME)"))?;
    let password = cli
        .password
        .clone()
        .or_else(|| fallback.map(|c| c.password))
        .ok_or_else(|| anyhow!("no password given (use --password or DREAM_JOURNAL_PASSWORD)"))?;

    Ok(CredentialsConfig { username, password })
}

fn print_dreams(dreams: &[DreamEntry]) {
    if dreams.is_empty() {
        println!("No dreams recorded yet.");
        return;
    }
    for dream in dreams {
        println!(
            "{}  [{}]\n  {}\n",
            display_date(dream.timestamp.as_deref()),
            dream.mood(),
            dream.dream_text
        );
    }
}

/// Calendar date of a stored timestamp, or the raw value if it does not parse.
fn display_date(timestamp: Option<&str>) -> String {
    let Some(raw) = timestamp else {
        return "unknown date".to_string();
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.date_naive().to_string();
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%a, %d %b %Y %H:%M:%S GMT"))
        .map(|parsed| parsed.date().to_string())
        .unwrap_or_else(|_| raw.to_string())
}
