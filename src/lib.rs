// lib.rs - natural-language SQL chat service
pub mod claude_client;
pub mod cohere_client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;

use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use config::AppConfig;
pub use error::ChatError;

pub struct AppState {
    pub config: AppConfig,
    /// `None` when no API key was configured; chat requests then fail fast.
    pub llm: Option<Arc<dyn llm::LanguageModel>>,
    pub sessions: session::SessionStore,
}

impl AppState {
    pub fn new(config: AppConfig, llm: Option<Arc<dyn llm::LanguageModel>>) -> Self {
        let sessions = session::SessionStore::new(config.session_ttl, config.history_window);
        Self { config, llm, sessions }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(handlers::ui::ui_routes())
        .merge(handlers::connect::connect_routes())
        .merge(handlers::chat::chat_routes())
        .merge(handlers::status::status_routes())
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
