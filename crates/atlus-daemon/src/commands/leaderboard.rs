//! Leaderboard and statistics command handlers.

use std::sync::Arc;

use atlus_db::queries::leaderboard;
use serde_json::Value;

use super::{now, str_param, to_value, with_connection, Result};
use crate::rpc::RpcError;
use crate::DaemonState;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

fn db_err(e: atlus_db::DbError) -> RpcError {
    RpcError::internal_error(&format!("db error: {e}"))
}

/// One of the public boards: `streak`, `champion` or `flash`.
pub async fn leaderboard(state: &Arc<DaemonState>, params: &Value) -> Result {
    let board = params
        .get("board")
        .and_then(|v| v.as_str())
        .unwrap_or("champion")
        .to_string();
    let limit = params
        .get("limit")
        .and_then(|v| v.as_u64())
        .map_or(DEFAULT_LIMIT, |l| l.min(u64::from(MAX_LIMIT)) as u32);

    with_connection(state, move |conn| match board.as_str() {
        "streak" => to_value(&leaderboard::by_streak(conn, limit).map_err(db_err)?),
        "champion" => to_value(&leaderboard::by_level(conn, limit).map_err(db_err)?),
        "flash" => to_value(&leaderboard::fastest_per_level(conn, limit).map_err(db_err)?),
        other => Err(RpcError::invalid_params(&format!("unknown board: {other}"))),
    })
    .await
}

/// Per-level results for the session's own identity.
pub async fn user_stats(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = str_param(params, "session_token")?.to_string();
    let engine = state.engine.clone();

    with_connection(state, move |conn| {
        let snapshot = engine.snapshot(conn, &token, now())?;
        let stats = leaderboard::user_stats(conn, snapshot.identity_id).map_err(db_err)?;
        Ok(serde_json::json!({
            "username": snapshot.username,
            "current_level": snapshot.current_level,
            "streak": snapshot.streak,
            "levels": to_value(&stats)?,
        }))
    })
    .await
}
