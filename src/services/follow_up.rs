// src/services/follow_up.rs
//! Per-session follow-up state: the previous query and, when the previous
//! answer was a single "category → number" row, that category.

use crate::models::{QueryResult, Scalar};
use serde::{Deserialize, Serialize};

/// Alias the prompt asks the model to give a wrapped previous query. Seeing it
/// means the new SQL aggregates over the old one, so the old one is dropped.
/// This is a plain substring check on model output and will misfire if the
/// model uses the alias for anything else.
pub const SUBQUERY_ALIAS_MARKER: &str = " as sub";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpContext {
    pub key: String,
    pub value: String,
}

impl FollowUpContext {
    /// Exactly one row of exactly two columns, one text and one number, in either order.
    pub fn from_result(result: &QueryResult) -> Option<Self> {
        if result.column_count() != 2 {
            return None;
        }
        let [first, second] = result.single_row()? else {
            return None;
        };

        let (key, value) = match (first, second) {
            (Scalar::Text(text), number) if number.is_numeric() => (&result.columns[0], text),
            (number, Scalar::Text(text)) if number.is_numeric() => (&result.columns[1], text),
            _ => return None,
        };

        Some(Self {
            key: key.clone(),
            value: value.clone(),
        })
    }
}

/// What the tracker held when a turn began.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnStart {
    pub last_query: Option<String>,
    pub context: Option<FollowUpContext>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowUpTracker {
    last_query: Option<String>,
    context: Option<FollowUpContext>,
}

impl FollowUpTracker {
    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    pub fn context(&self) -> Option<&FollowUpContext> {
        self.context.as_ref()
    }

    /// Snapshots the state for prompt building. The stored context is
    /// consumed here, so it is gone whatever happens later in the turn.
    pub fn begin_turn(&mut self) -> TurnStart {
        TurnStart {
            last_query: self.last_query.clone(),
            context: self.context.take(),
        }
    }

    pub fn record_query(&mut self, sql: &str, had_prior_query: bool) {
        if is_subquery_aggregation(sql, had_prior_query) {
            self.last_query = None;
        } else {
            self.last_query = Some(sql.trim().trim_end_matches(';').trim_end().to_string());
        }
    }

    pub fn observe_result(&mut self, result: &QueryResult) -> Option<&FollowUpContext> {
        self.context = FollowUpContext::from_result(result);
        self.context.as_ref()
    }
}

pub fn is_subquery_aggregation(sql: &str, had_prior_query: bool) -> bool {
    had_prior_query && sql.to_lowercase().contains(SUBQUERY_ALIAS_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_row(columns: &[&str], values: Vec<Scalar>) -> QueryResult {
        QueryResult::new(columns.iter().map(|c| c.to_string()).collect(), vec![values])
    }

    #[test]
    fn test_context_from_text_then_number() {
        let result = one_row(&["department", "count"], vec![Scalar::Text("DP002".into()), Scalar::Int(4)]);
        assert_eq!(
            FollowUpContext::from_result(&result),
            Some(FollowUpContext {
                key: "department".into(),
                value: "DP002".into()
            })
        );
    }

    #[test]
    fn test_context_from_number_then_text() {
        let result = one_row(&["total", "blood_group"], vec![Scalar::Float(12.0), Scalar::Text("B+".into())]);
        let context = FollowUpContext::from_result(&result).unwrap();
        assert_eq!(context.key, "blood_group");
        assert_eq!(context.value, "B+");
    }

    #[test]
    fn test_context_requires_exact_shape() {
        let two_numbers = one_row(&["a", "b"], vec![Scalar::Int(1), Scalar::Int(2)]);
        assert!(FollowUpContext::from_result(&two_numbers).is_none());

        let two_texts = one_row(&["a", "b"], vec![Scalar::Text("x".into()), Scalar::Text("y".into())]);
        assert!(FollowUpContext::from_result(&two_texts).is_none());

        let with_null = one_row(&["a", "b"], vec![Scalar::Text("x".into()), Scalar::Null]);
        assert!(FollowUpContext::from_result(&with_null).is_none());

        let three_columns = one_row(
            &["a", "b", "c"],
            vec![Scalar::Text("x".into()), Scalar::Int(1), Scalar::Int(2)],
        );
        assert!(FollowUpContext::from_result(&three_columns).is_none());

        let mut two_rows = one_row(&["a", "b"], vec![Scalar::Text("x".into()), Scalar::Int(1)]);
        two_rows.rows.push(vec![Scalar::Text("y".into()), Scalar::Int(2)]);
        assert!(FollowUpContext::from_result(&two_rows).is_none());
    }

    #[test]
    fn test_begin_turn_clears_context_but_keeps_last_query() {
        let mut tracker = FollowUpTracker::default();
        tracker.record_query("SELECT department, COUNT(*) FROM employees GROUP BY department;", false);
        tracker.observe_result(&one_row(
            &["department", "count"],
            vec![Scalar::Text("DP002".into()), Scalar::Int(4)],
        ));

        let start = tracker.begin_turn();
        assert_eq!(start.context.unwrap().value, "DP002");
        assert!(start.last_query.is_some());
        assert!(tracker.context().is_none());
        assert_eq!(
            tracker.last_query(),
            Some("SELECT department, COUNT(*) FROM employees GROUP BY department")
        );
    }

    #[test]
    fn test_subquery_aggregation_drops_last_query() {
        let mut tracker = FollowUpTracker::default();
        tracker.record_query("SELECT emp_id, emp_name FROM employees", false);
        tracker.record_query("SELECT COUNT(*) FROM (SELECT emp_id FROM employees) AS sub;", true);
        assert!(tracker.last_query().is_none());
    }

    #[test]
    fn test_alias_marker_without_prior_query_is_stored() {
        let mut tracker = FollowUpTracker::default();
        tracker.record_query("SELECT COUNT(*) FROM (SELECT 1) AS sub;;", false);
        assert_eq!(tracker.last_query(), Some("SELECT COUNT(*) FROM (SELECT 1) AS sub"));
    }
}
