// src/services/sql_extractor.rs
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref FENCED_SQL: Regex = Regex::new(r"(?s)```sql\r?\n(.*?)\r?\n```").expect("valid fenced sql regex");
    static ref SQL_TOKEN: Regex = Regex::new(r"\bsql\b").expect("valid sql token regex");
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    #[error("model output was empty")]
    Empty,
    #[error("model output does not contain a SELECT statement")]
    NoSelect,
}

/// Pulls the statement out of a model reply: the first fenced `sql` block if
/// there is one, otherwise the whole reply with the markdown stripped.
pub fn extract_sql(raw: &str) -> String {
    if let Some(block) = FENCED_SQL.captures(raw).and_then(|caps| caps.get(1)) {
        return block.as_str().trim().to_string();
    }

    let without_ticks = raw.replace('`', "");
    SQL_TOKEN.replace_all(&without_ticks, "").trim().to_string()
}

/// [`extract_sql`] plus the minimal sanity check done before anything is executed.
pub fn extract_statement(raw: &str) -> Result<String, ExtractError> {
    let sql = extract_sql(raw);
    if sql.is_empty() {
        return Err(ExtractError::Empty);
    }
    if !sql.to_uppercase().contains("SELECT") {
        return Err(ExtractError::NoSelect);
    }
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block_is_preferred() {
        assert_eq!(extract_sql("Here is it: ```sql\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(
            extract_sql("```sql\r\nSELECT emp_name\nFROM employees;\r\n```\nThen ```sql\nSELECT 2\n```"),
            "SELECT emp_name\nFROM employees;"
        );
    }

    #[test]
    fn test_unfenced_reply_is_stripped() {
        assert_eq!(extract_sql("  SELECT * FROM employees  "), "SELECT * FROM employees");
        assert_eq!(extract_sql("sql SELECT * FROM employees"), "SELECT * FROM employees");
        assert_eq!(extract_sql("`SELECT COUNT(*) FROM employees`"), "SELECT COUNT(*) FROM employees");
        // only the standalone token goes
        assert_eq!(extract_sql("SELECT mysql_id FROM t"), "SELECT mysql_id FROM t");
    }

    #[test]
    fn test_statement_requires_select() {
        assert_eq!(extract_statement("   "), Err(ExtractError::Empty));
        assert_eq!(
            extract_statement("I'm sorry, I cannot answer that."),
            Err(ExtractError::NoSelect)
        );
        assert_eq!(extract_statement("```sql\nselect 1\n```").unwrap(), "select 1");
    }
}
