// src/services/mod.rs
pub mod chat_turn;
pub mod follow_up;
pub mod post_filter;
pub mod prompt_builder;
pub mod renderer;
pub mod sql_extractor;

pub use chat_turn::{run_turn, TurnOutcome};
pub use follow_up::{FollowUpContext, FollowUpTracker};
