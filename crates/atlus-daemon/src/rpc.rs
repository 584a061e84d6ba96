//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! newline-delimited JSON-RPC method calls to the command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use atlus_engine::SubmitError;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    fn new(code: i32, message: &str, data: Option<serde_json::Value>) -> Self {
        Self {
            code,
            message: message.to_string(),
            data,
        }
    }

    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self::new(-32700, "PARSE_ERROR", None)
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self::new(-32600, "INVALID_REQUEST", None)
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            -32601,
            "METHOD_NOT_FOUND",
            Some(serde_json::json!({"method": method})),
        )
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self::new(
            -32602,
            "INVALID_PARAMS",
            Some(serde_json::json!({"detail": detail})),
        )
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self::new(
            -32603,
            "INTERNAL_ERROR",
            Some(serde_json::json!({"detail": detail})),
        )
    }

    // Competition errors

    /// Session unknown or expired (-32010).
    pub fn session_invalid() -> Self {
        Self::new(-32010, "SESSION_INVALID", None)
    }

    /// Blank answer (-32020).
    pub fn empty_answer() -> Self {
        Self::new(-32020, "EMPTY_ANSWER", None)
    }

    /// Level not unlocked yet (-32021).
    pub fn level_locked(level: u32, current_level: u32) -> Self {
        Self::new(
            -32021,
            "LEVEL_LOCKED",
            Some(serde_json::json!({"level": level, "current_level": current_level})),
        )
    }

    /// Level not released yet (-32022).
    pub fn not_released(level: u32, next_release_level: u32) -> Self {
        Self::new(
            -32022,
            "NOT_RELEASED",
            Some(serde_json::json!({"level": level, "next_release_level": next_release_level})),
        )
    }

    /// No canonical answer provisioned (-32030).
    pub fn answer_not_found(level: u32, input_variant_id: u32) -> Self {
        Self::new(
            -32030,
            "ANSWER_NOT_FOUND",
            Some(serde_json::json!({"level": level, "input_variant_id": input_variant_id})),
        )
    }

    /// No puzzle input provisioned (-32032).
    pub fn input_not_found(level: u32, input_variant_id: u32) -> Self {
        Self::new(
            -32032,
            "INPUT_NOT_FOUND",
            Some(serde_json::json!({"level": level, "input_variant_id": input_variant_id})),
        )
    }

    /// Store failure; nothing committed, safe to resubmit (-32031).
    pub fn submission_failed(busy: bool) -> Self {
        Self::new(
            -32031,
            "SUBMISSION_FAILED",
            Some(serde_json::json!({"retryable": true, "busy": busy})),
        )
    }
}

impl From<&SubmitError> for RpcError {
    fn from(err: &SubmitError) -> Self {
        match err {
            SubmitError::EmptyAnswer => Self::empty_answer(),
            SubmitError::LevelLocked {
                level,
                current_level,
            } => Self::level_locked(*level, *current_level),
            SubmitError::NotReleased {
                level,
                next_release_level,
            } => Self::not_released(*level, *next_release_level),
            SubmitError::SessionInvalid => Self::session_invalid(),
            SubmitError::AnswerNotFound {
                level,
                input_variant_id,
                ..
            } => Self::answer_not_found(*level, *input_variant_id),
            SubmitError::Submission(e) => Self::submission_failed(e.is_busy()),
        }
    }
}

impl From<SubmitError> for RpcError {
    fn from(err: SubmitError) -> Self {
        Self::from(&err)
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let response = handle_line(state.clone(), &line).await;

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Parse one request line and dispatch it.
pub(crate) async fn handle_line(state: Arc<DaemonState>, line: &str) -> RpcResponse {
    match serde_json::from_str::<RpcRequest>(line) {
        Ok(request) => dispatch_request(state, request).await,
        Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
    }
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();

    if request.jsonrpc != "2.0" {
        return RpcResponse::error(id, RpcError::invalid_request());
    }

    debug!("Dispatching RPC method: {}", method);

    let result = match method {
        // Accounts
        "register" => commands::accounts::register(&state, &request.params).await,
        "logout" => commands::accounts::logout(&state, &request.params).await,

        // Progression
        "snapshot" => commands::progression::snapshot(&state, &request.params).await,
        "submit" => commands::progression::submit(&state, &request.params).await,
        "input" => commands::progression::input(&state, &request.params).await,
        "levels" => commands::progression::levels(&state).await,

        // Leaderboards
        "leaderboard" => commands::leaderboard::leaderboard(&state, &request.params).await,
        "user_stats" => commands::leaderboard::user_stats(&state, &request.params).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}
