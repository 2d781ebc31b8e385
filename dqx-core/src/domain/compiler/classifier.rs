// dqx-core/src/domain/compiler/classifier.rs

use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// What a statement hands back once executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementShape {
    /// Produces a result set (SELECT, SHOW, EXPLAIN, ... RETURNING).
    Rows,
    /// Produces an affected-row count only.
    Count,
}

const ROW_KEYWORDS: [&str; 8] = [
    "select", "with", "values", "show", "describe", "explain", "pragma", "from",
];

/// True when `sql`, trimmed, starts with `SELECT` (any casing).
pub fn is_select(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("select"))
}

/// Decides whether a statement yields rows. Uses a real parse when the text is
/// understood by the generic grammar and falls back to the leading keyword for
/// engine-specific syntax.
pub fn classify(sql: &str) -> StatementShape {
    let lowered = sql.to_lowercase();
    let returning = lowered.split_whitespace().any(|word| word == "returning");

    match Parser::parse_sql(&GenericDialect {}, sql) {
        Ok(statements) => match statements.last() {
            Some(stmt) if yields_rows(stmt) || returning => StatementShape::Rows,
            Some(_) => StatementShape::Count,
            None => StatementShape::Count,
        },
        Err(e) => {
            tracing::debug!("Statement not understood by sqlparser ({}), using keyword fallback", e);
            let head = lowered
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .trim_start_matches('(');
            if ROW_KEYWORDS.contains(&head) || returning {
                StatementShape::Rows
            } else {
                StatementShape::Count
            }
        }
    }
}

fn yields_rows(stmt: &Statement) -> bool {
    matches!(
        stmt,
        Statement::Query(_)
            | Statement::Explain { .. }
            | Statement::ExplainTable { .. }
            | Statement::ShowTables { .. }
            | Statement::ShowColumns { .. }
            | Statement::Pragma { .. }
    )
}
