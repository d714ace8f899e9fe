//! Command-line driver for the promptbatch engine.
//!
//! Reads a prompt file (one prompt per line, `#` comments), executes the
//! batch against the configured provider, logs progress as it happens,
//! and writes a failure export when anything failed. Ctrl-C stops
//! admission gracefully; in-flight items are allowed to finish.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promptbatch_core::export::ExportFormat;
use promptbatch_core::item::BatchItem;
use promptbatch_core::parse::{parse_prompt_lines, request_payload};
use promptbatch_engine::{BatchScheduler, EngineEvent};
use promptbatch_provider::ProviderApi;

use config::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptbatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Input ---
    let path = std::env::args()
        .nth(1)
        .context("Usage: promptbatch <prompt-file>")?;
    let input = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read prompt file '{path}'"))?;

    let prompts = parse_prompt_lines(&input);
    anyhow::ensure!(!prompts.is_empty(), "No prompts found in '{path}'");

    let items: Vec<BatchItem> = prompts
        .into_iter()
        .map(|p| BatchItem::new(p.sequence_number, p.text.clone(), request_payload(&p.text)))
        .collect();

    // --- Configuration ---
    let config = CliConfig::from_env();
    tracing::info!(
        provider_url = %config.provider_url,
        total = items.len(),
        concurrency = config.concurrency_limit,
        "Loaded batch",
    );

    // --- Scheduler ---
    let service = Arc::new(ProviderApi::new(config.provider()));
    let scheduler = Arc::new(BatchScheduler::new(service, config.engine())?);

    // Event logger: follows the run so progress is visible as it happens.
    let mut events = scheduler.subscribe();
    let logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Ctrl-C stops admission; in-flight items finish and are recorded.
    let stop_handle = Arc::clone(&scheduler);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C, stopping after in-flight items finish");
            let _ = stop_handle.stop();
        }
    });

    // --- Run ---
    let report = scheduler.run(items).await?;

    let counts = report.counts();
    tracing::info!(
        outcome = %report.outcome,
        succeeded = counts.succeeded,
        failed = counts.failed,
        not_run = counts.not_run,
        "Run finished",
    );

    if counts.failed > 0 {
        let export_path = match config.export_format {
            ExportFormat::Structured => "batch-errors.json",
            ExportFormat::Text => "batch-errors.txt",
        };
        std::fs::write(export_path, report.export_failures(config.export_format))
            .with_context(|| format!("Failed to write failure export '{export_path}'"))?;
        tracing::info!(path = export_path, "Wrote failure export");
    }

    logger.abort();
    Ok(())
}

/// Render one engine event into the log stream.
fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::RunStarted { total } => {
            tracing::info!(total, "Run started");
        }
        EngineEvent::StateChanged { state } => {
            tracing::debug!(state = state.label(), "State changed");
        }
        EngineEvent::ItemStarted {
            sequence_number, ..
        } => {
            tracing::info!(sequence_number, "Item started");
        }
        EngineEvent::ItemProgress {
            sequence_number,
            fraction,
            ..
        } => {
            tracing::debug!(
                sequence_number,
                percent = (fraction * 100.0) as u32,
                "Item progress",
            );
        }
        EngineEvent::ItemCompleted {
            sequence_number,
            status,
            error,
            ..
        } => match error {
            Some(error) => {
                tracing::warn!(sequence_number, status = status.label(), %error, "Item failed");
            }
            None => {
                tracing::info!(sequence_number, status = status.label(), "Item completed");
            }
        },
        EngineEvent::ProgressUpdated { completed, total } => {
            tracing::info!(completed, total, "Progress");
        }
        EngineEvent::RunFinished { outcome } => {
            tracing::info!(%outcome, "Run finished");
        }
    }
}
