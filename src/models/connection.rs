// src/models/connection.rs
use serde::{Deserialize, Serialize};

/// Body of `POST /connect_db`. Every field is optional on the wire; the
/// connector decides which ones a given database type needs.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectRequest {
    #[serde(default)]
    pub db_type: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<PortValue>,
    #[serde(default)]
    pub db_name: Option<String>,
}

/// The browser form posts the port either as a number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(u16),
    Text(String),
}

impl std::fmt::Display for PortValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortValue::Number(n) => write!(f, "{}", n),
            PortValue::Text(s) => f.write_str(s.trim()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub success: String,
}
