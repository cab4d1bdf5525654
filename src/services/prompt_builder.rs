// src/services/prompt_builder.rs
//! Builds the single prompt sent to the language model for each chat turn.

use super::follow_up::FollowUpContext;

pub struct PromptContext<'a> {
    pub question: &'a str,
    pub schema: &'a str,
    pub dialect: &'a str,
    pub last_query: Option<&'a str>,
    pub follow_up: Option<&'a FollowUpContext>,
    pub history: &'a str,
}

pub fn build_prompt(ctx: &PromptContext<'_>) -> String {
    let mut prompt = format!(
        r#"You are an expert {dialect} analyst. Translate the user's question into exactly one SQL query for the database described below.

Database schema:
{schema}

Rules:
1. Comparisons between two entities (for example "is the total salary of DP002 higher than DP003?") must return a single row with one column per entity, named <metric>_for_<entity>, such as total_salary_for_DP002 and total_salary_for_DP003.
2. When listing records, include the primary key column alongside the columns the user asked about.
3. When the user asks for "details" or "all information", use SELECT *.
4. For "starts with" or "begins with" questions, match case-insensitively: ILIKE 'x%' on PostgreSQL, LIKE 'x%' elsewhere.
5. When grouping on a text column, group on UPPER(column) and select it under the original column name.
6. When the user asks for a specific number of records, add a LIMIT clause.
7. Otherwise write standard {dialect} SQL using only tables and columns that exist in the schema.
"#,
        dialect = ctx.dialect,
        schema = ctx.schema.trim(),
    );

    if !ctx.history.trim().is_empty() {
        prompt.push_str("\nRecent conversation:\n");
        prompt.push_str(ctx.history.trim());
        prompt.push('\n');
    }

    if let Some(block) = follow_up_block(ctx) {
        prompt.push('\n');
        prompt.push_str(&block);
    }

    prompt.push_str(&format!(
        "\nQuestion: {}\n\nReply with only the SQL query inside a ```sql code block and nothing else.\n",
        ctx.question.trim()
    ));
    prompt
}

/// A known category from the last answer wins over the generic follow-up
/// strategies; with neither, the question is treated as standalone.
fn follow_up_block(ctx: &PromptContext<'_>) -> Option<String> {
    if let Some(context) = ctx.follow_up {
        let value = context.value.replace('\'', "''");
        return Some(format!(
            "The previous answer was about {key} = '{value}'. If the question refers back to it (\"those\", \"them\", \"that {key}\"), filter on exactly that value with UPPER({key}) = UPPER('{value}').\n",
            key = context.key,
            value = value,
        ));
    }

    ctx.last_query.map(|previous| {
        format!(
            r#"The previous SQL query was:
{previous}

If the question is a follow-up to it, pick one of these strategies:
- Refining: keep the previous WHERE conditions and add the new ones.
- Pivoting: when the previous query grouped by a category and the user now wants the individual records of one category, select those records filtered on that category.
- Aggregating: when the user wants a count, sum or average over the previous answer, wrap the previous query in a subquery aliased AS sub and aggregate over it.
If the question is unrelated, ignore the previous query.
"#
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base<'a>() -> PromptContext<'a> {
        PromptContext {
            question: "how many employees are there?",
            schema: "CREATE TABLE employees (\n\temp_id INTEGER\n)",
            dialect: "postgresql",
            last_query: None,
            follow_up: None,
            history: "",
        }
    }

    #[test]
    fn test_standalone_prompt() {
        let prompt = build_prompt(&base());
        assert!(prompt.contains("expert postgresql analyst"));
        assert!(prompt.contains("CREATE TABLE employees"));
        assert!(prompt.contains("_for_<entity>"));
        assert!(prompt.contains("Question: how many employees are there?"));
        assert!(!prompt.contains("Recent conversation"));
        assert!(!prompt.contains("previous SQL query"));
        assert!(!prompt.contains("UPPER(department)"));
    }

    #[test]
    fn test_context_block_replaces_strategies() {
        let context = FollowUpContext {
            key: "department".to_string(),
            value: "DP002".to_string(),
        };
        let prompt = build_prompt(&PromptContext {
            last_query: Some("SELECT department, COUNT(*) FROM employees GROUP BY department"),
            follow_up: Some(&context),
            ..base()
        });
        assert!(prompt.contains("UPPER(department) = UPPER('DP002')"));
        assert!(!prompt.contains("previous SQL query"));
        assert!(!prompt.contains("AS sub"));
    }

    #[test]
    fn test_prior_query_block() {
        let prompt = build_prompt(&PromptContext {
            last_query: Some("SELECT emp_name FROM employees WHERE salary > 1000"),
            history: "Previous User Question: who earns well?",
            ..base()
        });
        assert!(prompt.contains("SELECT emp_name FROM employees WHERE salary > 1000"));
        assert!(prompt.contains("Refining"));
        assert!(prompt.contains("Pivoting"));
        assert!(prompt.contains("AS sub"));
        assert!(prompt.contains("Recent conversation:\nPrevious User Question: who earns well?"));
    }

    #[test]
    fn test_context_value_quotes_are_doubled() {
        let context = FollowUpContext {
            key: "team".to_string(),
            value: "O'Brien".to_string(),
        };
        let prompt = build_prompt(&PromptContext {
            follow_up: Some(&context),
            ..base()
        });
        assert!(prompt.contains("UPPER(team) = UPPER('O''Brien')"));
    }
}
