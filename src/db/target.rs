// src/db/target.rs
use super::DatabaseError;
use crate::models::ConnectRequest;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Postgres,
    MySql,
    Sqlite,
}

impl DatabaseKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Some(DatabaseKind::Postgres),
            "mysql" => Some(DatabaseKind::MySql),
            "sqlite" => Some(DatabaseKind::Sqlite),
            _ => None,
        }
    }

    pub fn dialect(&self) -> &'static str {
        match self {
            DatabaseKind::Postgres => "postgresql",
            DatabaseKind::MySql => "mysql",
            DatabaseKind::Sqlite => "sqlite",
        }
    }

    fn scheme(&self) -> &'static str {
        match self {
            DatabaseKind::Postgres => "postgres",
            DatabaseKind::MySql => "mysql",
            DatabaseKind::Sqlite => "sqlite",
        }
    }
}

/// Where a session's database lives. Holds the full connection URI, so the
/// `Debug` output only ever shows the redacted form.
#[derive(Clone)]
pub struct ConnectionTarget {
    kind: DatabaseKind,
    uri: String,
    redacted_uri: String,
    database_name: String,
}

impl ConnectionTarget {
    pub fn from_request(request: &ConnectRequest) -> Result<Self, DatabaseError> {
        let db_type = request.db_type.as_deref().unwrap_or_default();
        let kind = DatabaseKind::parse(db_type).ok_or_else(|| DatabaseError::UnsupportedType(db_type.to_string()))?;

        let database_name = required(&request.db_name, "db_name")?;

        if kind == DatabaseKind::Sqlite {
            let uri = if database_name == ":memory:" {
                "sqlite::memory:".to_string()
            } else {
                format!("sqlite://{}", database_name)
            };
            return Ok(Self {
                kind,
                redacted_uri: uri.clone(),
                uri,
                database_name,
            });
        }

        let host = required(&request.host, "host")?;
        let username = request.username.as_deref().map(str::trim).unwrap_or_default();
        let password = request.password.as_deref().unwrap_or_default();
        let port = request
            .port
            .as_ref()
            .map(|p| p.to_string())
            .filter(|p| !p.is_empty())
            .map(|p| format!(":{}", p))
            .unwrap_or_default();

        let credentials = |shown_password: &str| -> String {
            match (username.is_empty(), password.is_empty()) {
                (true, _) => String::new(),
                (false, true) => format!("{}@", urlencoding::encode(username)),
                (false, false) => format!("{}:{}@", urlencoding::encode(username), shown_password),
            }
        };

        let encoded_password = urlencoding::encode(password).into_owned();
        let tail = format!("{}{}/{}", host, port, urlencoding::encode(&database_name));
        let uri = format!("{}://{}{}", kind.scheme(), credentials(encoded_password.as_str()), tail);
        let redacted_uri = format!("{}://{}{}", kind.scheme(), credentials("***"), tail);

        Ok(Self {
            kind,
            uri,
            redacted_uri,
            database_name,
        })
    }

    pub fn kind(&self) -> DatabaseKind {
        self.kind
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn redacted_uri(&self) -> &str {
        &self.redacted_uri
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }
}

impl fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionTarget")
            .field("kind", &self.kind)
            .field("uri", &self.redacted_uri)
            .finish()
    }
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, DatabaseError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(DatabaseError::MissingField(field))
}
