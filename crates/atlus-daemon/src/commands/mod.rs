//! IPC command handlers.
//!
//! Each submodule implements the commands for one IPC category. Handlers
//! that touch the store run on the blocking pool with a connection of
//! their own, so concurrent submissions serialize in SQLite rather than
//! behind a daemon-wide lock.

pub mod accounts;
pub mod leaderboard;
pub mod progression;

use std::sync::Arc;

use atlus_types::Timestamp;
use rusqlite::Connection;
use serde_json::Value;

use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Current Unix time in seconds.
pub(crate) fn now() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Run `f` against a fresh database connection on the blocking pool.
pub(crate) async fn with_connection<T, F>(
    state: &Arc<DaemonState>,
    f: F,
) -> std::result::Result<T, RpcError>
where
    F: FnOnce(&mut Connection) -> std::result::Result<T, RpcError> + Send + 'static,
    T: Send + 'static,
{
    let db_path = state.db_path.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = atlus_db::open(&db_path)
            .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;
        f(&mut conn)
    })
    .await
    .map_err(|e| RpcError::internal_error(&format!("worker failed: {e}")))?
}

/// Required string parameter.
pub(crate) fn str_param<'a>(params: &'a Value, name: &str) -> std::result::Result<&'a str, RpcError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} required")))
}

pub(crate) fn to_value<T: serde::Serialize>(value: &T) -> Result {
    serde_json::to_value(value).map_err(|e| RpcError::internal_error(&format!("encode failed: {e}")))
}

#[cfg(test)]
pub(crate) fn test_state(dir: &std::path::Path) -> Arc<DaemonState> {
    use atlus_engine::{Engine, FileAnswerResolver, FileInputResolver};

    use crate::config::AtlusConfig;
    use crate::events::EventBus;

    let mut config = AtlusConfig::default();
    config.storage.data_dir = dir.to_string_lossy().into_owned();
    config.competition.input_variants = 1;

    let db_path = dir.join("atlus.db");
    let conn = atlus_db::open(&db_path).expect("open db");
    atlus_db::queries::levels::seed_schedule(&conn, 0, 0, 3).expect("seed levels");

    let engine = Engine::new(
        FileAnswerResolver::new(config.puzzles_dir()),
        config.competition.cooldown_policy(),
    );

    Arc::new(DaemonState {
        db_path,
        engine: Arc::new(engine),
        inputs: FileInputResolver::new(config.puzzles_dir()),
        config,
        event_bus: EventBus::new(16),
    })
}
