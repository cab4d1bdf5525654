// src/session/cookie.rs
//! The browser session is identified by a single cookie holding a uuid.

use axum::http::{header, HeaderMap, HeaderValue};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "querychat_session";

/// Session id from the request's Cookie headers. Anything that is not a uuid is ignored.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(|id| id.to_string())
}

pub fn set_cookie_header(id: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)).ok()
}
