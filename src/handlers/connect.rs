use super::{attach_session_cookie, session_id_or_new};
use crate::db::{ConnectionTarget, LiveDatabase};
use crate::error::ChatError;
use crate::models::{ConnectRequest, ConnectResponse};
use crate::AppState;
use axum::{
    http::HeaderMap,
    response::{IntoResponse, Json, Response},
    routing::post,
    Extension, Router,
};
use std::sync::Arc;

pub fn connect_routes() -> Router {
    Router::new().route("/connect_db", post(connect_db))
}

/// Checks that the database is reachable, then binds it to the caller's
/// session. Any earlier conversation in that session is dropped.
pub async fn connect_db(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ConnectRequest>,
) -> Result<Response, ChatError> {
    let target = ConnectionTarget::from_request(&request).map_err(ChatError::Connect)?;

    tracing::info!("Connecting to {}", target.redacted_uri());
    let db = LiveDatabase::open(&target).await.map_err(ChatError::Connect)?;
    if let Err(e) = db.close().await {
        tracing::warn!("Failed to close check connection: {}", e);
    }

    let (session_id, is_new) = session_id_or_new(&headers);
    let message = format!("Successfully connected to {}.", target.database_name());
    state.sessions.connect(&session_id, target).await;
    tracing::info!("Session {} connected", session_id);

    let mut response = Json(ConnectResponse { success: message }).into_response();
    if is_new {
        attach_session_cookie(&mut response, &session_id);
    }
    Ok(response)
}
