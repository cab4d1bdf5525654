// src/services/post_filter.rs
//! "starts with <letter>" questions are re-checked in process, because
//! generated LIKE clauses trip over honorifics and initials.

use crate::models::QueryResult;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref STARTS_WITH: Regex = Regex::new(r"(start|starts|starting) with ([a-zA-Z])").expect("valid starts-with regex");
    // One honorific or one run of initials, never both.
    static ref LEADING_TITLE_OR_INITIALS: Regex =
        Regex::new(r"(?i)^(?:(?:mrs|mr|ms|dr)\b\.?\s*|(?:[a-z]\.\s*)+)").expect("valid honorific regex");
}

/// The letter asked for, lowercased, if the message is a "starts with" question.
pub fn requested_letter(message: &str) -> Option<char> {
    let lowered = message.to_lowercase();
    STARTS_WITH
        .captures(&lowered)
        .and_then(|caps| caps.get(2))
        .and_then(|m| m.as_str().chars().next())
}

/// First column with "name" in it, otherwise the last one.
pub fn name_column(columns: &[String]) -> Option<usize> {
    columns
        .iter()
        .position(|c| c.to_lowercase().contains("name"))
        .or_else(|| columns.len().checked_sub(1))
}

pub fn strip_name_prefix(value: &str) -> &str {
    let trimmed = value.trim_start();
    match LEADING_TITLE_OR_INITIALS.find(trimmed) {
        Some(prefix) => &trimmed[prefix.end()..],
        None => trimmed,
    }
}

pub fn starts_with_letter(value: &str, letter: char) -> bool {
    strip_name_prefix(value)
        .chars()
        .next()
        .map_or(false, |first| first.to_lowercase().eq(letter.to_lowercase()))
}

/// Drops rows whose name column does not start with `letter`. Returns how many were removed.
pub fn retain_starting_with(result: &mut QueryResult, letter: char) -> usize {
    let Some(column) = name_column(&result.columns) else {
        return 0;
    };
    let before = result.row_count();
    result.retain_rows(|row| {
        row.get(column)
            .map_or(false, |cell| starts_with_letter(&cell.to_string(), letter))
    });
    before - result.row_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Scalar;

    #[test]
    fn test_requested_letter() {
        assert_eq!(requested_letter("Employees starting with A"), Some('a'));
        assert_eq!(requested_letter("whose name starts with b?"), Some('b'));
        assert_eq!(requested_letter("names that START WITH z"), Some('z'));
        assert_eq!(requested_letter("list all employees"), None);
        assert_eq!(requested_letter("starting with 4"), None);
    }

    #[test]
    fn test_name_column_selection() {
        let columns = vec!["emp_id".to_string(), "Emp_Name".to_string(), "salary".to_string()];
        assert_eq!(name_column(&columns), Some(1));
        let no_name = vec!["emp_id".to_string(), "city".to_string()];
        assert_eq!(name_column(&no_name), Some(1));
        assert_eq!(name_column(&[]), None);
    }

    #[test]
    fn test_prefix_stripping() {
        assert_eq!(strip_name_prefix("Mr. Alice Smith"), "Alice Smith");
        assert_eq!(strip_name_prefix("Mrs Stone"), "Stone");
        assert_eq!(strip_name_prefix("dr.Adams"), "Adams");
        assert_eq!(strip_name_prefix("Dr. A. B. Carter"), "A. B. Carter");
        assert_eq!(strip_name_prefix("J. R. Tolkien"), "Tolkien");
        assert_eq!(strip_name_prefix("Drake Bell"), "Drake Bell");
        assert_eq!(strip_name_prefix("Msimang"), "Msimang");
    }

    #[test]
    fn test_starting_with_keeps_titled_names() {
        let mut result = QueryResult::new(
            vec!["emp_id".to_string(), "emp_name".to_string()],
            vec![
                vec![Scalar::Int(1), Scalar::Text("Mr. Alice Smith".into())],
                vec![Scalar::Int(2), Scalar::Text("Dr. A. B. Carter".into())],
                vec![Scalar::Int(3), Scalar::Text("Bob Jones".into())],
            ],
        );
        let removed = retain_starting_with(&mut result, 'a');
        assert_eq!(removed, 1);
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.rows[0][1], Scalar::Text("Mr. Alice Smith".into()));
        assert_eq!(result.rows[1][1], Scalar::Text("Dr. A. B. Carter".into()));
    }

    #[test]
    fn test_null_names_are_dropped() {
        let mut result = QueryResult::new(
            vec!["name".to_string()],
            vec![vec![Scalar::Null], vec![Scalar::Text("anna".into())]],
        );
        assert_eq!(retain_starting_with(&mut result, 'a'), 1);
        assert_eq!(result.rows, vec![vec![Scalar::Text("anna".into())]]);
    }
}
