use crate::db::LiveDatabase;
use crate::error::ChatError;
use crate::models::{ChatRequest, ChatResponse};
use crate::services::run_turn;
use crate::session::{cookie, SessionError};
use crate::AppState;
use axum::{http::HeaderMap, response::Json, routing::post, Extension, Router};
use std::sync::Arc;

pub fn chat_routes() -> Router {
    Router::new().route("/chat", post(chat))
}

pub async fn chat(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ChatError> {
    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or(ChatError::MissingMessage)?
        .to_string();

    let session_id = cookie::session_id(&headers).ok_or(SessionError::NotConnected)?;
    let mut session = state.sessions.checkout(&session_id).await?;
    let llm = state.llm.clone().ok_or(ChatError::LlmUnavailable)?;
    let target = session.target.clone().ok_or(SessionError::NotConnected)?;

    let mut db = match LiveDatabase::open(&target).await {
        Ok(db) => db,
        Err(e) => {
            // the turn has started, so the follow-up context is spent
            session.tracker.begin_turn();
            state.sessions.store(&session_id, session).await;
            return Err(e.into());
        }
    };

    let outcome = run_turn(
        llm.as_ref(),
        &mut db,
        &mut session,
        &message,
        state.config.llm.temperature,
    )
    .await;

    if let Err(e) = db.close().await {
        tracing::warn!("Failed to close connection for session {}: {}", session_id, e);
    }
    state.sessions.store(&session_id, session).await;

    let outcome = outcome?;
    tracing::info!(
        "Answered turn for session {} with {} rows",
        session_id,
        outcome.row_count
    );
    Ok(Json(ChatResponse {
        response: outcome.html,
    }))
}
