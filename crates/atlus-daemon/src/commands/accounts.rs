//! Login-side command handlers.

use std::sync::Arc;

use atlus_types::Profile;
use serde_json::Value;
use tracing::info;

use super::{now, str_param, to_value, with_connection, Result};
use crate::rpc::RpcError;
use crate::DaemonState;

/// Create or refresh an identity from a verified profile and issue a session.
pub async fn register(state: &Arc<DaemonState>, params: &Value) -> Result {
    let profile: Profile = serde_json::from_value(params.clone())
        .map_err(|e| RpcError::invalid_params(&format!("profile: {e}")))?;
    if profile.username.trim().is_empty() {
        return Err(RpcError::invalid_params("username required"));
    }

    let settings = state.config.competition.session_settings();
    let registration = with_connection(state, move |conn| {
        atlus_engine::accounts::register(conn, &profile, &settings, now())
            .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))
    })
    .await?;

    Ok(serde_json::json!({
        "identity": to_value(&registration.identity)?,
        "session": to_value(&registration.session)?,
    }))
}

/// End a session.
pub async fn logout(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = str_param(params, "session_token")?.to_string();

    let existed = with_connection(state, move |conn| {
        atlus_engine::accounts::logout(conn, &token)
            .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))
    })
    .await?;

    if existed {
        info!("Session ended");
    }
    Ok(serde_json::json!({ "logged_out": existed }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_state;

    #[tokio::test]
    async fn test_register_and_logout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = test_state(dir.path());

        let result = register(
            &state,
            &serde_json::json!({"identity_id": 9, "username": "ada"}),
        )
        .await
        .expect("register");
        assert_eq!(result["identity"]["identity_id"], 9);
        assert_eq!(result["identity"]["current_level"], 1);

        let token = result["session"]["session_token"].clone();
        let out = logout(&state, &serde_json::json!({"session_token": token}))
            .await
            .expect("logout");
        assert_eq!(out["logged_out"], true);
    }

    #[tokio::test]
    async fn test_register_requires_username() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = test_state(dir.path());

        let err = register(&state, &serde_json::json!({"identity_id": 9, "username": " "}))
            .await
            .expect_err("blank username");
        assert_eq!(err.code, -32602);

        let err = register(&state, &serde_json::json!({"username": "ada"}))
            .await
            .expect_err("missing id");
        assert_eq!(err.code, -32602);
    }
}
