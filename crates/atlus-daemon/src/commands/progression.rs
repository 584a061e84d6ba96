//! Submission and progression command handlers.

use std::sync::Arc;

use atlus_db::queries::levels;
use atlus_engine::ResolveError;
use atlus_types::{level_slug, parse_level_slug, LevelId, Outcome};
use serde_json::Value;
use tracing::warn;

use super::{now, str_param, to_value, with_connection, Result};
use crate::events::Event;
use crate::rpc::RpcError;
use crate::DaemonState;

/// Resolve the session into the participant's progression snapshot.
pub async fn snapshot(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = str_param(params, "session_token")?.to_string();
    let engine = state.engine.clone();

    let snapshot = with_connection(state, move |conn| {
        engine.snapshot(conn, &token, now()).map_err(RpcError::from)
    })
    .await?;

    to_value(&snapshot)
}

/// Level named by `level` (number) or `slug` (e.g. "level3").
fn level_param(params: &Value) -> std::result::Result<LevelId, RpcError> {
    if let Some(level) = params.get("level").and_then(|v| v.as_u64()) {
        return LevelId::try_from(level)
            .ok()
            .filter(|l| *l >= atlus_types::FIRST_LEVEL)
            .ok_or_else(|| RpcError::invalid_params("level out of range"));
    }
    let slug = params
        .get("slug")
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params("level or slug required"))?;
    parse_level_slug(slug).map_err(|e| RpcError::invalid_params(&e.to_string()))
}

/// Adjudicate one answer.
pub async fn submit(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = str_param(params, "session_token")?.to_string();
    let answer = str_param(params, "answer")?.to_string();
    let level = level_param(params)?;
    let engine = state.engine.clone();

    let (identity_id, username, outcome) = with_connection(state, move |conn| {
        let now = now();
        let snapshot = engine.snapshot(conn, &token, now)?;
        let outcome = engine.evaluate(conn, &snapshot, level, &answer, now)?;
        Ok((snapshot.identity_id, snapshot.username, outcome))
    })
    .await?;

    if let Outcome::LevelPassed {
        level,
        attempts,
        next_level,
        advanced,
        time_taken,
        ..
    } = &outcome
    {
        state.event_bus.emit(Event {
            event_type: "LevelPassed".to_string(),
            timestamp: now(),
            payload: serde_json::json!({
                "identity_id": identity_id,
                "username": username,
                "level": level,
                "attempts": attempts,
                "time_taken": time_taken,
                "next_level": next_level,
                "advanced": advanced,
            }),
        });
    }

    to_value(&outcome)
}

/// The participant's puzzle input for a released, unlocked level.
pub async fn input(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = str_param(params, "session_token")?.to_string();
    let level = level_param(params)?;
    let engine = state.engine.clone();
    let inputs = state.inputs.clone();

    let (input_variant_id, input) = with_connection(state, move |conn| {
        let snapshot = engine.snapshot(conn, &token, now())?;
        atlus_engine::check_access(&snapshot, level)?;
        let variant = snapshot.input_variant_id;
        match inputs.input(level, variant) {
            Ok(input) => Ok((variant, input)),
            Err(ResolveError::NotFound { .. }) => Err(RpcError::input_not_found(level, variant)),
            Err(e) => {
                warn!(level, input_variant_id = variant, "Input unreadable: {e}");
                Err(RpcError::internal_error("input unreadable"))
            }
        }
    })
    .await?;

    Ok(serde_json::json!({
        "level": level,
        "slug": level_slug(level),
        "input_variant_id": input_variant_id,
        "input": input,
    }))
}

/// The release schedule, with each level's release state.
pub async fn levels(state: &Arc<DaemonState>) -> Result {
    let (all, next_release_level, now) = with_connection(state, |conn| {
        let now = now();
        let db_err = |e: atlus_db::DbError| RpcError::internal_error(&format!("db error: {e}"));
        let all = levels::list(conn).map_err(db_err)?;
        let next = levels::next_release_level(conn, now).map_err(db_err)?;
        Ok((all, next, now))
    })
    .await?;

    let levels: Vec<Value> = all
        .iter()
        .map(|level| {
            serde_json::json!({
                "level_id": level.level_id,
                "slug": level_slug(level.level_id),
                "release_time": level.release_time,
                "released": level.is_released(now),
            })
        })
        .collect();

    Ok(serde_json::json!({
        "levels": levels,
        "next_release_level": next_release_level,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{accounts, test_state};

    fn write_answer(dir: &std::path::Path, level: LevelId, answer: &str) {
        let problem_set = dir
            .join("puzzles")
            .join(atlus_types::level_slug(level))
            .join("problem_set");
        std::fs::create_dir_all(&problem_set).expect("mkdir");
        std::fs::write(
            problem_set.join("1.json"),
            serde_json::json!({"input": "...", "output": answer}).to_string(),
        )
        .expect("write answer");
    }

    async fn login(state: &Arc<DaemonState>) -> Value {
        let reg = accounts::register(state, &serde_json::json!({"identity_id": 42, "username": "mona"}))
            .await
            .expect("register");
        reg["session"]["session_token"].clone()
    }

    #[test]
    fn test_level_param() {
        assert_eq!(level_param(&serde_json::json!({"level": 3})).expect("level"), 3);
        assert_eq!(level_param(&serde_json::json!({"slug": "level7"})).expect("slug"), 7);
        assert!(level_param(&serde_json::json!({"level": 0})).is_err());
        assert!(level_param(&serde_json::json!({"slug": "stage2"})).is_err());
        assert!(level_param(&serde_json::json!({})).is_err());
    }

    #[tokio::test]
    async fn test_submit_pass_emits_event() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = test_state(dir.path());
        write_answer(dir.path(), 1, "1337\n");
        let token = login(&state).await;
        let mut events = state.event_bus.subscribe();

        let outcome = submit(
            &state,
            &serde_json::json!({"session_token": token, "level": 1, "answer": " 1337 "}),
        )
        .await
        .expect("submit");
        assert_eq!(outcome["status"], "level_passed");
        assert_eq!(outcome["next_level"], 2);

        let event = events.try_recv().expect("event");
        assert_eq!(event.event_type, "LevelPassed");
        assert_eq!(event.payload["identity_id"], 42);

        let snap = snapshot(&state, &serde_json::json!({"session_token": token}))
            .await
            .expect("snapshot");
        assert_eq!(snap["current_level"], 2);
        assert_eq!(snap["streak"], 1);
    }

    #[tokio::test]
    async fn test_submit_errors_map_to_codes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = test_state(dir.path());
        let token = login(&state).await;

        let err = submit(
            &state,
            &serde_json::json!({"session_token": token, "slug": "level2", "answer": "x"}),
        )
        .await
        .expect_err("locked");
        assert_eq!(err.code, -32021);

        let err = submit(
            &state,
            &serde_json::json!({"session_token": token, "level": 1, "answer": "  "}),
        )
        .await
        .expect_err("empty");
        assert_eq!(err.code, -32020);

        let err = submit(
            &state,
            &serde_json::json!({"session_token": token, "level": 1, "answer": "x"}),
        )
        .await
        .expect_err("no artifact");
        assert_eq!(err.code, -32030);

        let err = submit(
            &state,
            &serde_json::json!({"session_token": "nope", "level": 1, "answer": "x"}),
        )
        .await
        .expect_err("bad session");
        assert_eq!(err.code, -32010);
    }

    fn write_input(dir: &std::path::Path, level: LevelId, input: &str) {
        let inputs = dir.join("puzzles").join(level_slug(level)).join("inputs");
        std::fs::create_dir_all(&inputs).expect("mkdir");
        std::fs::write(inputs.join("1.txt"), input).expect("write input");
    }

    #[tokio::test]
    async fn test_input_serves_variant_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = test_state(dir.path());
        write_input(dir.path(), 1, "3 4\n5 6\n");
        let token = login(&state).await;

        let result = input(&state, &serde_json::json!({"session_token": token, "slug": "level1"}))
            .await
            .expect("input");
        assert_eq!(result["level"], 1);
        assert_eq!(result["input_variant_id"], 1);
        assert_eq!(result["input"], "3 4\n5 6\n");
    }

    #[tokio::test]
    async fn test_input_errors_map_to_codes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = test_state(dir.path());
        write_input(dir.path(), 2, "locked");
        let token = login(&state).await;

        let err = input(&state, &serde_json::json!({"session_token": token, "level": 2}))
            .await
            .expect_err("locked");
        assert_eq!(err.code, -32021);

        let err = input(&state, &serde_json::json!({"session_token": token, "slug": "level5"}))
            .await
            .expect_err("not released");
        assert_eq!(err.code, -32022);

        let err = input(&state, &serde_json::json!({"session_token": token, "level": 1}))
            .await
            .expect_err("no input");
        assert_eq!(err.code, -32032);

        let err = input(&state, &serde_json::json!({"session_token": "nope", "level": 1}))
            .await
            .expect_err("bad session");
        assert_eq!(err.code, -32010);
    }

    #[tokio::test]
    async fn test_levels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = test_state(dir.path());

        let result = levels(&state).await.expect("levels");
        assert_eq!(result["levels"].as_array().expect("array").len(), 3);
        assert_eq!(result["levels"][0]["slug"], "level1");
        assert_eq!(result["levels"][2]["released"], true);
        assert_eq!(result["next_release_level"], 4);
    }
}
