//! # Dream Journal
//!
//! Command-line front end for the dream journal API.
//!
//! ## Environment Setup
//! Configuration is read from the environment (a `.env` file is honoured):
//! ```bash
//! DREAM_JOURNAL_API_URL=http://127.0.0.1:5000/
//! DREAM_JOURNAL_USERNAME=luna
//! DREAM_JOURNAL_PASSWORD='moon#light42'
//! ```
//!
//! ## Running
//! ```bash
//! cargo run -- add "I was flying over a quiet lake"
//! cargo run -- insights
//! ```
//!
//! Set `RUST_LOG=debug` to trace every request.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dream_journal_client::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();

    tracing::debug!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let cli = cli::Cli::parse();
    let config = Config::from_env()?;
    cli::run(cli, config).await
}
