// src/models/mod.rs
pub mod chat;
pub mod connection;
pub mod query;

pub use chat::{ChatRequest, ChatResponse, ErrorResponse, Exchange};
pub use connection::{ConnectRequest, ConnectResponse, PortValue};
pub use query::{QueryResult, Scalar};
