//! atlus-daemon: the Atlus competition daemon.
//!
//! Single OS process running a Tokio async runtime. The web front end
//! talks to the daemon via JSON-RPC over a Unix socket. Submissions are
//! adjudicated on the blocking pool, one SQLite connection per request.

mod commands;
mod config;
mod events;
mod rpc;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use atlus_engine::{Engine, FileAnswerResolver, FileInputResolver};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::config::AtlusConfig;
use crate::events::EventBus;
use crate::rpc::RpcServer;

/// How often expired sessions are purged.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Database file. Each request opens its own connection.
    pub db_path: PathBuf,
    /// Submission engine, shared by all requests.
    pub engine: Arc<Engine<FileAnswerResolver>>,
    /// Per-variant puzzle inputs.
    pub inputs: FileInputResolver,
    /// Configuration.
    pub config: AtlusConfig,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = AtlusConfig::load()?;

    // Initialize tracing; RUST_LOG overrides the configured level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
        tracing_subscriber::EnvFilter::try_new(format!("atlus={}", config.advanced.log_level))
    })?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Atlus daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open database and seed the release schedule
    let db_path = data_dir.join("atlus.db");
    {
        let conn = atlus_db::open(&db_path)?;
        let competition = &config.competition;
        let seeded = atlus_db::queries::levels::seed_schedule(
            &conn,
            competition.first_release,
            competition.release_interval_secs,
            competition.level_count,
        )?;
        info!(seeded, level_count = competition.level_count, "Release schedule ready");
    }

    // 3. Build the engine
    let puzzles_dir = config.puzzles_dir();
    if !puzzles_dir.exists() {
        warn!("Puzzles directory {:?} does not exist", puzzles_dir);
    }
    let cooldown = config.competition.cooldown_policy();
    info!(
        step_secs = cooldown.step_secs,
        mode = ?cooldown.mode,
        "Cooldown policy"
    );
    let inputs = FileInputResolver::new(&puzzles_dir);
    let engine = Arc::new(Engine::new(FileAnswerResolver::new(puzzles_dir), cooldown));

    // 4. Create event bus
    let event_bus = EventBus::new(1000);

    // 5. Build daemon state
    let state = Arc::new(DaemonState {
        db_path: db_path.clone(),
        engine,
        inputs,
        config,
        event_bus,
    });

    // 6. Background tasks
    spawn_event_logger(&state);
    spawn_session_purge(db_path);

    // 7. Start IPC server
    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    state.event_bus.emit(events::Event {
        event_type: "DaemonStarted".to_string(),
        timestamp: commands::now(),
        payload: serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
        }),
    });

    // 8. Run the RPC server until shutdown
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    info!("Daemon shutting down gracefully");

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}

/// Log every bus event at info level.
fn spawn_event_logger(state: &Arc<DaemonState>) {
    let mut rx = state.event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    info!(event_type = %event.event_type, payload = %event.payload, "Event");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Periodically delete expired sessions.
fn spawn_session_purge(db_path: PathBuf) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let db_path = db_path.clone();
            let result = tokio::task::spawn_blocking(move || {
                let conn = atlus_db::open(&db_path)?;
                atlus_db::queries::sessions::purge_expired(&conn, commands::now())
            })
            .await;

            match result {
                Ok(Ok(0)) => {}
                Ok(Ok(purged)) => info!(purged, "Expired sessions purged"),
                Ok(Err(e)) => warn!("Session purge failed: {}", e),
                Err(e) => error!("Session purge task failed: {}", e),
            }
        }
    });
}
