//! # kiln-orchestrator
//!
//! Orchestrator binary — wires together the session store, the agent
//! endpoint clients, and the start-event consumer.
//!
//! Start events arrive as NDJSON on stdin (one `{"sessionId", "inputData"}`
//! message per line), standing in for the message fabric subscription. A
//! session row is created for unseen ids before dispatch, the way the
//! gateway would have done it.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use kiln_agents::{ImageEnhancerClient, InventoryClient, MarketingNudgeClient};
use kiln_core::StartEvent;
use kiln_runtime::{StartDelivery, StartEventConsumer, WorkflowCoordinator};
use kiln_settings::KilnSettings;
use kiln_store::{ConnectionConfig, CreateSessionOptions, SessionStore};
use tokio::io::AsyncBufReadExt;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Kiln listing orchestrator.
#[derive(Parser, Debug)]
#[command(name = "kiln-orchestrator", about = "Kiln listing orchestrator")]
struct Cli {
    /// Path to the `SQLite` session database.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Path to the settings file (defaults to `~/.kiln/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Maximum concurrent sessions (overrides settings if specified).
    #[arg(long)]
    max_sessions: Option<usize>,
}

impl Cli {
    fn default_db_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home)
            .join(".kiln")
            .join("database")
            .join("kiln.db")
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// CLI flag beats settings file beats compiled default.
fn resolve_db_path(cli: Option<PathBuf>, settings: &KilnSettings) -> PathBuf {
    cli.or_else(|| settings.server.db_path.as_ref().map(PathBuf::from))
        .unwrap_or_else(Cli::default_db_path)
}

/// Read NDJSON start events from stdin and dispatch them as deliveries.
///
/// Returns when stdin reaches EOF or the consumer side hangs up. Malformed
/// lines are logged and skipped; they never reach the coordinator.
async fn feed_start_events(tx: mpsc::Sender<StartDelivery>, store: Arc<SessionStore>) {
    let stdin = tokio::io::stdin();
    let mut lines = tokio::io::BufReader::new(stdin).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event: StartEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed start event line");
                continue;
            }
        };

        // The gateway creates the session row before publishing; when fed
        // from stdin we do that step here for unseen ids.
        match store.session_exists(&event.session_id) {
            Ok(true) => {}
            Ok(false) => {
                if let Err(err) = store.create_session(&CreateSessionOptions {
                    session_id: Some(&event.session_id),
                    voice_input: &event.input_data.voice_input,
                    image_url: &event.input_data.image_url,
                    total_agents: None,
                }) {
                    tracing::error!(session_id = %event.session_id, error = %err, "failed to create session");
                    continue;
                }
            }
            Err(err) => {
                tracing::error!(session_id = %event.session_id, error = %err, "session lookup failed");
                continue;
            }
        }

        let session_id = event.session_id.clone();
        let (ack_tx, ack_rx) = oneshot::channel();
        if tx
            .send(StartDelivery {
                event,
                ack: Some(ack_tx),
            })
            .await
            .is_err()
        {
            break;
        }
        let _ = tokio::spawn(async move {
            if let Ok(outcome) = ack_rx.await {
                tracing::info!(session_id, ?outcome, "delivery resolved");
            }
        });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(kiln_settings::settings_path);
    let settings = kiln_settings::load_settings_from_path(&settings_path)
        .context("Failed to load settings")?;

    let db_path = resolve_db_path(args.db_path, &settings);
    ensure_parent_dir(&db_path)?;
    let db_str = db_path.to_string_lossy();
    let pool = kiln_store::new_file(&db_str, &ConnectionConfig::default())
        .context("Failed to open database")?;
    {
        let conn = pool.get().context("Failed to get DB connection")?;
        let _ = kiln_store::run_migrations(&conn).context("Failed to run migrations")?;
    }
    let store = Arc::new(SessionStore::new(pool));
    tracing::info!(db = %db_path.display(), "session store ready");

    let endpoints = &settings.endpoints;
    let coordinator = Arc::new(WorkflowCoordinator::new(
        Arc::clone(&store),
        ImageEnhancerClient::new(
            endpoints.image_enhancer.base_url.clone(),
            endpoints.image_enhancer.timeout(),
        ),
        MarketingNudgeClient::new(
            endpoints.marketing_nudge.base_url.clone(),
            endpoints.marketing_nudge.timeout(),
        ),
        InventoryClient::new(
            endpoints.inventory.base_url.clone(),
            endpoints.inventory.timeout(),
        ),
    ));

    let max_sessions = args
        .max_sessions
        .unwrap_or(settings.server.max_concurrent_sessions);
    let (tx, rx) = mpsc::channel(max_sessions);
    let shutdown = CancellationToken::new();
    let consumer = StartEventConsumer::new(coordinator, rx, shutdown.clone());
    let consumer_task = tokio::spawn(consumer.run());

    tracing::info!(
        max_sessions,
        image_enhancer = %endpoints.image_enhancer.base_url,
        marketing_nudge = %endpoints.marketing_nudge.base_url,
        inventory = %endpoints.inventory.base_url,
        "orchestrator listening for start events on stdin"
    );

    let feeder = feed_start_events(tx, Arc::clone(&store));
    tokio::select! {
        () = feeder => {
            tracing::info!("stdin closed");
        }
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for ctrl-c")?;
            tracing::info!("ctrl-c received");
        }
    }

    tracing::info!("shutting down, draining in-flight sessions");
    shutdown.cancel();
    consumer_task.await.context("consumer task panicked")?;
    tracing::info!("shutdown complete");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
