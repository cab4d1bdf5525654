use crate::AppState;
use axum::{response::Json, routing::get, Extension, Router};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn status_routes() -> Router {
    Router::new().route("/api/status", get(api_status))
}

pub async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let llm_status = if state.llm.is_some() { "configured" } else { "not_configured" };

    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "language_model": {
                "provider": state.config.llm.provider.as_str(),
                "status": llm_status,
            },
        },
        "sessions": {
            "active": state.sessions.active_count().await,
            "idle_ttl_secs": state.config.session_ttl.as_secs(),
        },
        "supported_databases": ["postgresql", "mysql", "sqlite"],
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
