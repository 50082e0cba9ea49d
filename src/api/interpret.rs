use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::llm::interpret::InterpretError;
use crate::models::InterpretationResult;
use crate::state::AppState;

/// POST /api/interpret - Curatorial interpretation of a result set
/// (`mode: "board"`) or a single asset (`mode: "asset"`).
///
/// The body is read raw so the credential check runs before any parsing.
pub async fn interpret(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<InterpretationResult>, InterpretError> {
    state.interpreter.ensure_credential()?;

    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("Unreadable interpretation request: {e}");
        InterpretError::Server(e.to_string())
    })?;

    match state.interpreter.interpret_body(&body).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            match &e {
                InterpretError::Validation(_) => tracing::debug!("Rejected interpretation: {e}"),
                _ => tracing::error!("Interpretation failed: {e}"),
            }
            Err(e)
        }
    }
}
