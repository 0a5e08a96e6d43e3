use std::sync::Arc;

use anyhow::{Context, Result};
use linkdigest::{
    chat::{ChatSource, JsonExportSource},
    config::Config,
    fetcher::HttpFetcher,
    ledger::JsonlLedger,
    pipeline::{Pipeline, PreviewSummarizer},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LINKDIGEST_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");

    // stdout carries the report, logs go to stderr
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    // Load configuration
    let config = Config::from_env()?;

    let chat = JsonExportSource::open(config.messages_path())
        .await
        .with_context(|| format!("loading messages from {}", config.messages_path().display()))?;
    let messages = chat
        .get_messages(config.channel(), None, None, None)
        .await?;
    info!(
        channel = config.channel(),
        messages = messages.len(),
        "loaded channel history"
    );

    let fetcher = HttpFetcher::new(config.fetcher().clone())?;
    let ledger = JsonlLedger::new(config.ledger_path());
    let pipeline = Pipeline::new(Arc::new(fetcher), Arc::new(ledger), config.pipeline().clone())
        .with_summarizer(Arc::new(PreviewSummarizer));

    // Stop between items on Ctrl-C; finished items are already in the ledger
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Received shutdown signal, stopping after the current item");
            cancel.cancel();
        });
    }

    let report = pipeline
        .run_until_cancelled(&messages, &chat, &cancel)
        .await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
