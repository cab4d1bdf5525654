// src/handlers/mod.rs
pub mod chat;
pub mod connect;
pub mod status;
pub mod ui;

use crate::session::cookie;
use crate::session::SessionStore;
use axum::http::{header, HeaderMap};
use axum::response::Response;

/// The caller's session id, or a fresh one when the request carried none.
/// The flag says whether the id is new and needs a Set-Cookie.
pub(crate) fn session_id_or_new(headers: &HeaderMap) -> (String, bool) {
    match cookie::session_id(headers) {
        Some(id) => (id, false),
        None => (SessionStore::new_session_id(), true),
    }
}

pub(crate) fn attach_session_cookie(response: &mut Response, id: &str) {
    if let Some(value) = cookie::set_cookie_header(id) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
}
