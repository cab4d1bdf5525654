// src/error.rs
use crate::db::DatabaseError;
use crate::llm::LlmError;
use crate::models::ErrorResponse;
use crate::session::SessionError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Everything a chat or connect request can fail with. The `Display` text is
/// the detailed form for logs; [`ChatError::user_message`] is what the browser sees.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("no message provided")]
    MissingMessage,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("language model client is not configured")]
    LlmUnavailable,
    #[error("language model call failed: {0}")]
    Llm(#[from] LlmError),
    #[error("model output did not contain a usable SQL statement: {0}")]
    GenerationFailed(String),
    #[error("query failed: {0}")]
    Database(#[from] DatabaseError),
    #[error("connection failed: {0}")]
    Connect(DatabaseError),
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::MissingMessage => StatusCode::BAD_REQUEST,
            ChatError::Session(SessionError::NotConnected) => StatusCode::FORBIDDEN,
            ChatError::Session(SessionError::Expired) => StatusCode::BAD_REQUEST,
            ChatError::Connect(DatabaseError::UnsupportedType(_) | DatabaseError::MissingField(_)) => {
                StatusCode::BAD_REQUEST
            }
            ChatError::LlmUnavailable
            | ChatError::Llm(_)
            | ChatError::GenerationFailed(_)
            | ChatError::Database(_)
            | ChatError::Connect(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ChatError::MissingMessage => "No message provided.".to_string(),
            ChatError::Session(SessionError::NotConnected) => "Database not connected.".to_string(),
            ChatError::Session(SessionError::Expired) => "Session expired.".to_string(),
            ChatError::LlmUnavailable => "The language model service is not configured.".to_string(),
            ChatError::Llm(_) => "An error occurred on the server: LanguageModelError.".to_string(),
            ChatError::GenerationFailed(_) => "I was unable to generate a valid SQL query.".to_string(),
            ChatError::Database(DatabaseError::Syntax(_)) => "I tried to ask the database a question, but it didn't understand the grammar. Could you please rephrase your request?".to_string(),
            ChatError::Database(DatabaseError::Database(_) | DatabaseError::Connection(_)) => {
                "I couldn't complete the request due to a database error.".to_string()
            }
            ChatError::Database(other) => format!("An error occurred on the server: {}.", other.kind()),
            ChatError::Connect(DatabaseError::UnsupportedType(_)) => "Unsupported database type.".to_string(),
            ChatError::Connect(DatabaseError::MissingField(field)) => format!("Missing connection field: {}.", field),
            ChatError::Connect(err) => format!(
                "Connection failed. Please check credentials and database status. Error: {}",
                err
            ),
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                error: self.user_message(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ChatError::MissingMessage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ChatError::from(SessionError::NotConnected).status(), StatusCode::FORBIDDEN);
        assert_eq!(ChatError::from(SessionError::Expired).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ChatError::Connect(DatabaseError::UnsupportedType("oracle".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ChatError::Connect(DatabaseError::Connection("refused".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ChatError::LlmUnavailable.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_database_errors_are_sanitized() {
        let syntax = ChatError::from(DatabaseError::Syntax("near \"FORM\": syntax error".into()));
        assert!(syntax.user_message().contains("didn't understand the grammar"));
        assert!(!syntax.user_message().contains("FORM"));

        let other = ChatError::from(DatabaseError::Database("no such table: staff".into()));
        assert_eq!(
            other.user_message(),
            "I couldn't complete the request due to a database error."
        );

        let driver = ChatError::from(DatabaseError::Driver("pool timed out".into()));
        assert_eq!(driver.user_message(), "An error occurred on the server: DriverError.");
    }

    #[test]
    fn test_connect_failure_includes_detail() {
        let err = ChatError::Connect(DatabaseError::Connection("password authentication failed".into()));
        assert_eq!(
            err.user_message(),
            "Connection failed. Please check credentials and database status. Error: password authentication failed"
        );
    }
}
