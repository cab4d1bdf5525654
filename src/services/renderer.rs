// src/services/renderer.rs
//! Turns a query result into the HTML fragment shown in the chat window.

use crate::models::{QueryResult, Scalar};

pub const NO_RESULTS_MESSAGE: &str = "<p>I could not find any information for that query.</p>";

const COMPARISON_MARKER: &str = "for";

pub fn render(result: &QueryResult) -> String {
    if let Some(html) = comparative_answer(result) {
        return html;
    }

    if result.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    if result.column_count() == 1 {
        if let Some([value]) = result.single_row() {
            return format!(
                "<p><strong>{}:</strong> {}</p>",
                escape_html(&humanize_header(&result.columns[0])),
                escape_html(&value.to_string())
            );
        }
    }

    format!(
        "<p>Displaying <strong>{}</strong> matching records.</p>{}",
        result.row_count(),
        html_table(result)
    )
}

/// Answers "is A higher than B" questions. The query is expected to return
/// one row with two numeric columns named `<metric>_for_<entity>`.
pub fn comparative_answer(result: &QueryResult) -> Option<String> {
    if result.column_count() != 2 {
        return None;
    }
    let [first, second] = result.single_row()? else {
        return None;
    };
    if !first.is_numeric() || !second.is_numeric() {
        return None;
    }
    let (left, right) = (first.as_f64()?, second.as_f64()?);

    let (metric, left_entity) = split_metric_entity(&result.columns[0])?;
    let (_, right_entity) = split_metric_entity(&result.columns[1])?;

    let sentence = if left > right {
        format!("Yes, the {metric} for {left_entity} is higher than for {right_entity}.")
    } else if left < right {
        format!("No, the {metric} for {left_entity} is not higher than for {right_entity}.")
    } else {
        format!("The {metric} is the same for both {left_entity} and {right_entity}.")
    };

    Some(format!("<p>{}</p>{}", escape_html(&sentence), html_table(result)))
}

/// `total_salary_for_dp002` → ("total salary", "DP002"). The metric ends at the
/// first "for", the entity starts after the last one.
fn split_metric_entity(column: &str) -> Option<(String, String)> {
    let first = column.find(COMPARISON_MARKER)?;
    let last = column.rfind(COMPARISON_MARKER)?;

    let is_separator = |c: char| c == '_' || c.is_whitespace();
    let metric = column[..first].trim_matches(is_separator).replace('_', " ");
    let entity = column[last + COMPARISON_MARKER.len()..]
        .trim_matches(is_separator)
        .to_uppercase();

    if metric.is_empty() || entity.is_empty() {
        return None;
    }
    Some((metric, entity))
}

pub fn html_table(result: &QueryResult) -> String {
    let mut html = String::from("<div class=\"table-container\"><table><thead><tr>");
    for column in &result.columns {
        html.push_str(&format!("<th>{}</th>", escape_html(&humanize_header(column))));
    }
    html.push_str("</tr></thead><tbody>");
    for row in &result.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(&cell_text(cell))));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table></div>");
    html
}

fn cell_text(cell: &Scalar) -> String {
    match cell {
        Scalar::Null => String::new(),
        other => other.to_string(),
    }
}

/// `emp_name` → `Emp Name`. A letter is uppercased when it starts a word
/// (follows anything that is not a letter) and lowercased otherwise.
pub fn humanize_header(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut previous_cased = false;
    for ch in name.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphabetic() {
            if previous_cased {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_cased = true;
        } else {
            out.push(ch);
            previous_cased = false;
        }
    }
    out
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(columns: &[&str], rows: Vec<Vec<Scalar>>) -> QueryResult {
        QueryResult::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    #[test]
    fn test_comparative_higher() {
        let html = render(&result(
            &["total_for_dp002", "total_for_dp003"],
            vec![vec![Scalar::Int(50000), Scalar::Float(45000.0)]],
        ));
        assert!(html.starts_with("<p>Yes, the total for DP002 is higher than for DP003.</p>"));
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>45000.0</td>"));
    }

    #[test]
    fn test_comparative_lower_and_equal() {
        let lower = render(&result(
            &["total_salary_for_a", "total_salary_for_b"],
            vec![vec![Scalar::Int(1), Scalar::Int(2)]],
        ));
        assert!(lower.starts_with("<p>No, the total salary for A is not higher than for B.</p>"));

        let same = render(&result(
            &["headcount_for_x", "headcount_for_y"],
            vec![vec![Scalar::Int(3), Scalar::Int(3)]],
        ));
        assert!(same.starts_with("<p>The headcount is the same for both X and Y.</p>"));
    }

    #[test]
    fn test_comparative_falls_through_without_marker() {
        let html = render(&result(&["min_salary", "max_salary"], vec![vec![Scalar::Int(1), Scalar::Int(9)]]));
        assert!(html.starts_with("<p>Displaying <strong>1</strong> matching records.</p>"));

        let empty_metric = render(&result(&["for_a", "for_b"], vec![vec![Scalar::Int(1), Scalar::Int(9)]]));
        assert!(empty_metric.starts_with("<p>Displaying"));
    }

    #[test]
    fn test_single_value() {
        let html = render(&result(&["emp_name"], vec![vec![Scalar::Text("John".into())]]));
        assert_eq!(html, "<p><strong>Emp Name:</strong> John</p>");

        let null = render(&result(&["max_salary"], vec![vec![Scalar::Null]]));
        assert_eq!(null, "<p><strong>Max Salary:</strong> </p>");
    }

    #[test]
    fn test_empty_result() {
        assert_eq!(render(&result(&["emp_name"], vec![])), NO_RESULTS_MESSAGE);
    }

    #[test]
    fn test_table_with_row_count() {
        let html = render(&result(
            &["emp_name", "department"],
            vec![
                vec![Scalar::Text("Ann".into()), Scalar::Text("DP001".into())],
                vec![Scalar::Text("Ben".into()), Scalar::Null],
                vec![Scalar::Text("<b>".into()), Scalar::Text("DP003".into())],
            ],
        ));
        assert!(html.starts_with("<p>Displaying <strong>3</strong> matching records.</p>"));
        assert!(html.contains("<th>Emp Name</th><th>Department</th>"));
        assert!(html.contains("<tr><td>Ben</td><td></td></tr>"));
        assert!(html.contains("<td>&lt;b&gt;</td>"));
    }

    #[test]
    fn test_humanize_header() {
        assert_eq!(humanize_header("emp_name"), "Emp Name");
        assert_eq!(humanize_header("COUNT(*)"), "Count(*)");
        assert_eq!(humanize_header("total2024_sales"), "Total2024 Sales");
    }
}
