// src/services/chat_turn.rs
//! One chat turn: prompt, generate, extract, execute, filter, render.

use super::follow_up::FollowUpTracker;
use super::post_filter::{requested_letter, retain_starting_with};
use super::prompt_builder::{build_prompt, PromptContext};
use super::renderer::render;
use super::sql_extractor::extract_statement;
use crate::db::SqlDatabase;
use crate::error::ChatError;
use crate::llm::LanguageModel;
use crate::session::SessionState;

#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub html: String,
    pub sql: String,
    pub row_count: usize,
}

/// Runs a turn against `db`, mutating `session` as it goes. The session is
/// changed even when the turn fails: the follow-up context is always consumed
/// and `last_query` is updated as soon as valid SQL was generated.
pub async fn run_turn(
    llm: &dyn LanguageModel,
    db: &mut dyn SqlDatabase,
    session: &mut SessionState,
    message: &str,
    temperature: f32,
) -> Result<TurnOutcome, ChatError> {
    let start = session.tracker.begin_turn();

    let schema = db.table_info().await?;
    let history = session.memory.format_recent();
    let prompt = build_prompt(&PromptContext {
        question: message,
        schema: &schema,
        dialect: db.dialect(),
        last_query: start.last_query.as_deref(),
        follow_up: start.context.as_ref(),
        history: &history,
    });

    tracing::debug!("Prompt for {}: {} chars", llm.name(), prompt.len());
    let raw = llm.complete(&prompt, temperature).await?;

    let sql = extract_statement(&raw).map_err(|err| {
        tracing::warn!("Discarding model output ({}): {}", err, raw);
        ChatError::GenerationFailed(err.to_string())
    })?;

    update_last_query(&mut session.tracker, &sql, start.last_query.is_some());

    tracing::info!("Executing generated SQL: {}", sql);
    let mut result = db.execute(&sql).await?;

    if let Some(context) = session.tracker.observe_result(&result) {
        tracing::info!("Context saved for follow-up: {} = {}", context.key, context.value);
    }

    if let Some(letter) = requested_letter(message) {
        let removed = retain_starting_with(&mut result, letter);
        tracing::debug!(
            "Starts-with filter '{}' removed {} rows, {} left",
            letter,
            removed,
            result.row_count()
        );
    }

    let html = render(&result);
    session.memory.record(message, &sql);

    Ok(TurnOutcome {
        html,
        sql,
        row_count: result.row_count(),
    })
}

fn update_last_query(tracker: &mut FollowUpTracker, sql: &str, had_prior_query: bool) {
    tracker.record_query(sql, had_prior_query);
    match tracker.last_query() {
        Some(_) => tracing::debug!("Stored query for follow-ups"),
        None => tracing::info!("Subquery aggregation detected, previous query cleared"),
    }
}
