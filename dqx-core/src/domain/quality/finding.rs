// dqx-core/src/domain/quality/finding.rs

use serde::Serialize;
use serde_json::{Map, Value};

/// Output contract shared by every rule script, the staging tables and the
/// findings table. The order is the findings table column order.
pub const FINDING_COLUMNS: [&str; 5] = [
    "rule_id",
    "source_id",
    "source_uid",
    "data_value",
    "txn_date",
];

/// Columns forming the unit of replacement during publish.
pub const FINDING_KEY: [&str; 2] = ["rule_id", "source_id"];

pub const DEFAULT_FINDINGS_LIMIT: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopulateReport {
    pub script_id: i64,
    pub table: String,
    pub inserted_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub script_id: i64,
    pub published_rows: usize,
    pub keys_replaced_count: usize,
    pub message: String,
}

impl PublishReport {
    pub fn nothing_to_publish(script_id: i64) -> Self {
        Self {
            script_id,
            published_rows: 0,
            keys_replaced_count: 0,
            message: "Staging table is empty. Nothing to publish.".to_string(),
        }
    }

    pub fn published(script_id: i64, published_rows: usize, keys_replaced_count: usize) -> Self {
        Self {
            script_id,
            published_rows,
            keys_replaced_count,
            message: format!(
                "Published {} row(s) for {} (rule_id, source_id) key(s).",
                published_rows, keys_replaced_count
            ),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.published_rows == 0 && self.keys_replaced_count == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub script_count: i64,
    pub finding_count: i64,
}

/// Equality filters for browsing the findings table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindingsFilter {
    pub rule_id: Option<String>,
    pub source_id: Option<String>,
    pub limit: usize,
}

impl Default for FindingsFilter {
    fn default() -> Self {
        Self {
            rule_id: None,
            source_id: None,
            limit: DEFAULT_FINDINGS_LIMIT,
        }
    }
}

/// Rows plus their column names in projection order, values normalized for
/// transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryOutput {
    pub rows: Vec<Map<String, Value>>,
    pub column_names: Vec<String>,
}

impl QueryOutput {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_publish_report() {
        let report = PublishReport::nothing_to_publish(3);
        assert!(report.is_noop());
        assert_eq!(report.message, "Staging table is empty. Nothing to publish.");
    }

    #[test]
    fn test_default_filter_limit() {
        assert_eq!(FindingsFilter::default().limit, 1000);
    }
}
