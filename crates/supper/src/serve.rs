// SPDX-FileCopyrightText: 2026 Supper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `supper serve` command implementation.
//!
//! Opens SQLite storage, connects the Telegram transport and the OpenAI
//! client, then runs the workflow scheduler next to the inbound event loop
//! until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use supper_config::model::SupperConfig;
use supper_core::{PluginAdapter, SupperError, SystemClock};
use supper_openai::OpenAiLlm;
use supper_storage::SqliteStore;
use supper_telegram::TelegramTransport;
use supper_workflow::{EventHandler, Orchestrator, WorkflowScheduler, WorkflowSettings};
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::shutdown;

/// How long in-flight events may keep running after shutdown starts.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the `supper serve` command.
///
/// Each inbound event is handled on its own task. The orchestrator's
/// per-channel locks keep events for one chat in order of lock acquisition.
pub async fn run_serve(config: SupperConfig) -> Result<(), SupperError> {
    init_tracing(&config.agent.log_level);
    info!(agent = %config.agent.name, "starting supper serve");

    let store = Arc::new(SqliteStore::open(&config.storage).await?);
    let transport = Arc::new(TelegramTransport::new(&config.telegram).map_err(|e| {
        error!(error = %e, "failed to initialize Telegram transport");
        e
    })?);
    let llm = Arc::new(OpenAiLlm::new(&config.openai).map_err(|e| {
        error!(error = %e, "failed to initialize OpenAI client");
        e
    })?);
    debug!(
        storage = store.name(),
        transport = transport.name(),
        llm = llm.name(),
        "adapters initialized"
    );

    let settings = WorkflowSettings::from_config(&config);
    if settings.utc_offset.is_none() {
        info!("voting window follows the host's local time");
    }
    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        transport.clone(),
        llm.clone(),
        Arc::new(SystemClock),
        settings,
    ));

    let cancel = shutdown::install_signal_handler();

    let scheduler = Arc::new(WorkflowScheduler::new(orchestrator.clone()));
    let scheduler_task = tokio::spawn(scheduler.run(cancel.clone()));

    let mut events = transport.start_polling(cancel.clone());
    let handler = Arc::new(EventHandler::new(orchestrator));
    let tracker = TaskTracker::new();

    info!("supper is running");
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    warn!("event stream closed, shutting down");
                    cancel.cancel();
                    break;
                };
                let handler = handler.clone();
                tracker.spawn(async move {
                    if let Err(e) = handler.handle(event).await {
                        error!(error = %e, "event handling failed");
                    }
                });
            }
            _ = cancel.cancelled() => break,
        }
    }

    tracker.close();
    if tokio::time::timeout(DRAIN_TIMEOUT, tracker.wait()).await.is_err() {
        warn!(
            pending = tracker.len(),
            "in-flight events did not finish before the drain timeout"
        );
    }
    if let Err(e) = scheduler_task.await {
        error!(error = %e, "scheduler task panicked");
    }

    for adapter in [
        transport as Arc<dyn PluginAdapter>,
        llm as Arc<dyn PluginAdapter>,
        store as Arc<dyn PluginAdapter>,
    ] {
        if let Err(e) = adapter.shutdown().await {
            warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
        }
    }

    info!("supper stopped");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("supper={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
