// dqx-core/src/domain/quality/contract.rs

//! Structural check of a rule script's projection.
//!
//! A rule script must be a single SELECT whose output columns are exactly
//! [`FINDING_COLUMNS`]. The check is textual: it never touches the database
//! and does not try to understand the full SQL grammar. Commas and the `FROM`
//! keyword only count at bracket depth 0 and outside quoted text.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::domain::compiler::classifier::is_select;
use crate::domain::error::DomainError;
use crate::domain::quality::finding::FINDING_COLUMNS;

const QUOTES: [char; 3] = ['\'', '"', '`'];

#[allow(clippy::expect_used)]
fn alias_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?is)^(.*\S)\s+as\s+["'`]?([a-z0-9_]+)["'`]?$"#).expect("static alias regex")
    })
}

/// Trimmed statement without its optional trailing `;`.
pub fn strip_statement(sql: &str) -> &str {
    let trimmed = sql.trim();
    trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end()
}

/// Checks that `sql` projects exactly the finding columns.
pub fn validate_columns(sql: &str) -> Result<(), DomainError> {
    let resolved: BTreeSet<String> = resolve_columns(sql)?.into_iter().collect();
    let required: BTreeSet<String> = FINDING_COLUMNS.iter().map(|c| c.to_string()).collect();

    let missing: Vec<String> = required.difference(&resolved).cloned().collect();
    let extra: Vec<String> = resolved.difference(&required).cloned().collect();

    if missing.is_empty() && extra.is_empty() {
        Ok(())
    } else {
        Err(DomainError::ColumnContractViolation { missing, extra })
    }
}

/// Output column names of a SELECT, in projection order, lower-cased.
pub fn resolve_columns(sql: &str) -> Result<Vec<String>, DomainError> {
    let statement = strip_statement(sql);
    if !is_select(statement) {
        return Err(DomainError::InvalidStatementKind);
    }

    let body = &statement["select".len()..];
    let list = match find_top_level_from(body) {
        Some(idx) => &body[..idx],
        None => body,
    };
    let list = strip_set_quantifier(list);
    if list.trim().is_empty() {
        return Err(DomainError::EmptyColumnList);
    }

    Ok(split_top_level(list).into_iter().map(resolve_name).collect())
}

/// Characters at bracket depth 0 that are not inside a quoted literal or
/// quoted identifier. Doubled quotes (`'it''s'`) close and reopen, which
/// leaves the state unchanged.
fn top_level(text: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    text.char_indices().filter(move |&(_, c)| match quote {
        Some(q) => {
            if c == q {
                quote = None;
            }
            false
        }
        None => match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                false
            }
            '(' | '[' => {
                depth += 1;
                false
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                false
            }
            _ => depth == 0,
        },
    })
}

/// Byte offset of the whitespace preceding the first top-level `FROM`.
fn find_top_level_from(text: &str) -> Option<usize> {
    top_level(text)
        .filter(|(_, c)| c.is_whitespace())
        .find_map(|(i, c)| {
            let start = i + c.len_utf8();
            let word = text.get(start..start + 4)?;
            let delimited = text[start + 4..]
                .chars()
                .next()
                .is_none_or(char::is_whitespace);
            (word.eq_ignore_ascii_case("from") && delimited).then_some(i)
        })
}

fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut last = 0;
    for (i, c) in top_level(list) {
        if c == ',' {
            parts.push(&list[last..i]);
            last = i + 1;
        }
    }
    parts.push(&list[last..]);
    parts
}

/// Drops a leading `DISTINCT` or `ALL`.
fn strip_set_quantifier(list: &str) -> &str {
    let trimmed = list.trim_start();
    for keyword in ["distinct", "all"] {
        let Some(head) = trimmed.get(..keyword.len()) else {
            continue;
        };
        let rest = &trimmed[keyword.len()..];
        if head.eq_ignore_ascii_case(keyword) && rest.starts_with(char::is_whitespace) {
            return rest;
        }
    }
    trimmed
}

fn resolve_name(expr: &str) -> String {
    let expr = expr.trim();
    let name = match alias_pattern().captures(expr) {
        Some(caps) => caps.get(2).map_or(expr, |m| m.as_str()),
        None => match expr.rsplit_once('.') {
            Some((_, tail)) => tail,
            None => expr,
        },
    };
    name.trim().trim_matches(QUOTES).to_lowercase()
}
