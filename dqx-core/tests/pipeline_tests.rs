use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::thread;

use dqx_core::application::{QualityPipeline, StatementIntent};
use dqx_core::domain::DomainError;
use dqx_core::domain::project::ProjectConfig;
use dqx_core::domain::quality::{FindingsFilter, NewRuleScript};
use dqx_core::domain::value::Param;
use dqx_core::infrastructure::adapters::DuckDbConnector;

const NEGATIVE_AMOUNTS: &str = "SELECT 'R_NEG' AS rule_id, e.source_id, e.uid AS source_uid, \
     CAST(e.amount AS VARCHAR) AS data_value, e.event_date AS txn_date \
     FROM raw_events e WHERE e.amount < 0";

const LARGE_AMOUNTS: &str = "SELECT 'R_BIG' AS rule_id, e.source_id, e.uid AS source_uid, \
     CAST(e.amount AS VARCHAR) AS data_value, e.event_date AS txn_date \
     FROM raw_events e WHERE e.amount > 1000;";

/// In-memory engine with the catalog bootstrapped and a small source table.
struct PipelineTestEnv {
    pipeline: QualityPipeline,
}

impl PipelineTestEnv {
    fn new() -> Result<Self> {
        let connector = Arc::new(DuckDbConnector::in_memory()?);
        let config = ProjectConfig {
            database: ":memory:".into(),
            ..ProjectConfig::default()
        };
        let pipeline = QualityPipeline::new(connector, &config)?;
        pipeline.init_catalog()?;

        pipeline.run_statement(
            "CREATE TABLE raw_events (source_id VARCHAR, uid VARCHAR, amount DECIMAL(10, 2), event_date DATE)",
            &[],
            StatementIntent::Write,
        )?;
        pipeline.run_statement(
            "INSERT INTO raw_events VALUES \
             ('SRC_A', 'a-1', -5.00, DATE '2024-01-02'), \
             ('SRC_A', 'a-2', 1500.00, DATE '2024-01-03'), \
             ('SRC_B', 'b-1', -0.50, DATE '2024-01-04'), \
             ('SRC_B', 'b-2', 20.00, DATE '2024-01-05')",
            &[],
            StatementIntent::Infer,
        )?;
        Ok(Self { pipeline })
    }

    fn create(&self, name: &str, content: &str) -> Result<i64> {
        Ok(self
            .pipeline
            .create_script(&NewRuleScript::new(name, None, content))?
            .id)
    }

    fn findings(&self) -> Result<Vec<Map<String, Value>>> {
        Ok(self.pipeline.query_findings(&FindingsFilter::default())?.rows)
    }

    fn staged(&self, script_id: i64) -> Result<Vec<Map<String, Value>>> {
        let sql = format!(
            "SELECT * FROM stg.dq_script_{} ORDER BY source_id, source_uid",
            script_id
        );
        Ok(self.pipeline.run_select(&sql, &[])?.rows)
    }

    fn staging_ids(&self) -> Result<Vec<i64>> {
        Ok(self
            .pipeline
            .list_staging_tables()?
            .into_iter()
            .map(|t| t.script_id)
            .collect())
    }
}

#[test]
fn test_create_builds_empty_staging_table() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let id = env.create("negative amounts", NEGATIVE_AMOUNTS)?;

    assert_eq!(env.staging_ids()?, vec![id]);
    assert!(env.staged(id)?.is_empty());

    let script = env.pipeline.get_script(id)?;
    assert_eq!(script.name, "negative amounts");
    assert_eq!(script.created_at, script.updated_at);
    Ok(())
}

#[test]
fn test_duplicate_name_has_no_side_effects() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    env.create("dup", NEGATIVE_AMOUNTS)?;

    let err = env
        .pipeline
        .create_script(&NewRuleScript::new("dup", None, LARGE_AMOUNTS))
        .unwrap_err();
    assert_eq!(err.as_domain(), Some(&DomainError::DuplicateName("dup".into())));

    assert_eq!(env.pipeline.list_scripts()?.len(), 1);
    assert_eq!(env.staging_ids()?.len(), 1);
    Ok(())
}

#[test]
fn test_invalid_script_is_rejected_with_both_lists() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let err = env
        .pipeline
        .create_script(&NewRuleScript::new(
            "bad",
            None,
            "SELECT rule_id, source_id, data_value, txn_date, extra_col FROM t",
        ))
        .unwrap_err();

    assert_eq!(
        err.as_domain(),
        Some(&DomainError::ColumnContractViolation {
            missing: vec!["source_uid".into()],
            extra: vec!["extra_col".into()],
        })
    );
    assert!(env.pipeline.list_scripts()?.is_empty());
    Ok(())
}

#[test]
fn test_populate_is_idempotent() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let id = env.create("neg", NEGATIVE_AMOUNTS)?;

    let first = env.pipeline.populate_staging(id)?;
    let after_first = env.staged(id)?;
    let second = env.pipeline.populate_staging(id)?;
    let after_second = env.staged(id)?;

    assert_eq!(first.inserted_rows, 2);
    assert_eq!(second.inserted_rows, 2);
    assert_eq!(after_first, after_second);
    assert_eq!(after_first[0]["source_uid"], json!("a-1"));
    assert_eq!(after_first[0]["txn_date"], json!("2024-01-02"));
    Ok(())
}

#[test]
fn test_populate_recreates_a_missing_staging_table() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let id = env.create("neg", NEGATIVE_AMOUNTS)?;
    env.pipeline.run_statement(
        &format!("DROP TABLE stg.dq_script_{}", id),
        &[],
        StatementIntent::Infer,
    )?;

    let report = env.pipeline.populate_staging(id)?;
    assert_eq!(report.inserted_rows, 2);
    assert_eq!(report.table, format!("stg.dq_script_{}", id));
    Ok(())
}

#[test]
fn test_populate_unknown_script_is_not_found() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let err = env.pipeline.populate_staging(77).unwrap_err();
    assert_eq!(err.as_domain(), Some(&DomainError::NotFound(77)));
    Ok(())
}

#[test]
fn test_publish_is_idempotent_and_replace_safe() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let id = env.create("neg", NEGATIVE_AMOUNTS)?;
    env.pipeline.populate_staging(id)?;

    let first = env.pipeline.publish_findings(id)?;
    let after_first = env.findings()?;
    let second = env.pipeline.publish_findings(id)?;
    let after_second = env.findings()?;

    assert_eq!(first.published_rows, 2);
    assert_eq!(first.keys_replaced_count, 2);
    assert_eq!(second.published_rows, 2);
    assert_eq!(after_first, after_second);
    assert_eq!(after_second.len(), 2);
    Ok(())
}

#[test]
fn test_publish_replaces_stale_rows_for_staged_keys() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let id = env.create("neg", NEGATIVE_AMOUNTS)?;
    env.pipeline.populate_staging(id)?;
    env.pipeline.publish_findings(id)?;

    // Same keys, new value for one source row.
    env.pipeline.run_statement(
        "UPDATE raw_events SET amount = -9.00 WHERE uid = 'a-1'",
        &[],
        StatementIntent::Infer,
    )?;
    env.pipeline.populate_staging(id)?;
    env.pipeline.publish_findings(id)?;

    let findings = env.findings()?;
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0]["data_value"], json!("-9.00"));
    Ok(())
}

#[test]
fn test_empty_publish_is_a_noop() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let neg = env.create("neg", NEGATIVE_AMOUNTS)?;
    env.pipeline.populate_staging(neg)?;
    env.pipeline.publish_findings(neg)?;

    let never = env.create(
        "never",
        "SELECT rule_id, source_id, source_uid, data_value, txn_date FROM dq.bad_detail WHERE 1 = 0",
    )?;
    env.pipeline.populate_staging(never)?;
    let report = env.pipeline.publish_findings(never)?;

    assert_eq!(report.published_rows, 0);
    assert_eq!(report.keys_replaced_count, 0);
    assert!(report.message.contains("Nothing to publish"));
    assert_eq!(env.findings()?.len(), 2);
    Ok(())
}

#[test]
fn test_publish_never_touches_other_scripts_keys() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let neg = env.create("neg", NEGATIVE_AMOUNTS)?;
    let big = env.create("big", LARGE_AMOUNTS)?;

    env.pipeline.populate_staging(big)?;
    env.pipeline.publish_findings(big)?;
    let big_rows: Vec<_> = env.findings()?;

    env.pipeline.populate_staging(neg)?;
    env.pipeline.publish_findings(neg)?;
    env.pipeline.publish_findings(neg)?;

    let all = env.findings()?;
    assert_eq!(all.len(), 3);
    let still_big: Vec<_> = all
        .into_iter()
        .filter(|r| r["rule_id"] == json!("R_BIG"))
        .collect();
    assert_eq!(still_big, big_rows);
    Ok(())
}

#[test]
fn test_null_keys_are_replaced_not_duplicated() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let id = env.create(
        "nullable",
        "SELECT 'R_NULL' AS rule_id, CAST(NULL AS VARCHAR) AS source_id, uid AS source_uid, \
         CAST(amount AS VARCHAR) AS data_value, event_date AS txn_date FROM raw_events",
    )?;
    env.pipeline.populate_staging(id)?;
    env.pipeline.publish_findings(id)?;
    env.pipeline.publish_findings(id)?;

    assert_eq!(env.findings()?.len(), 4);
    Ok(())
}

#[test]
fn test_delete_keeps_published_findings() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let id = env.create("neg", NEGATIVE_AMOUNTS)?;
    env.pipeline.populate_staging(id)?;
    env.pipeline.publish_findings(id)?;

    assert_eq!(env.pipeline.delete_script(id)?, 1);
    assert!(env.staging_ids()?.is_empty());
    assert!(env.pipeline.list_scripts()?.is_empty());
    assert_eq!(env.findings()?.len(), 2);

    // Unknown ids are not an error.
    assert_eq!(env.pipeline.delete_script(id)?, 0);
    Ok(())
}

#[test]
fn test_update_leaves_staging_alone() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let id = env.create("neg", NEGATIVE_AMOUNTS)?;
    env.pipeline.populate_staging(id)?;
    let before = env.staged(id)?;

    let updated = env.pipeline.update_script(
        id,
        &NewRuleScript::new("big now", Some("moved".into()), LARGE_AMOUNTS),
    )?;
    assert_eq!(updated.name, "big now");
    assert_eq!(updated.description.as_deref(), Some("moved"));
    assert!(updated.updated_at >= updated.created_at);
    assert_eq!(env.staged(id)?, before);

    env.pipeline.populate_staging(id)?;
    let after = env.staged(id)?;
    assert_eq!(after.len(), 1);
    assert_eq!(after[0]["rule_id"], json!("R_BIG"));
    Ok(())
}

#[test]
fn test_update_conflicts() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let first = env.create("first", NEGATIVE_AMOUNTS)?;
    env.create("second", LARGE_AMOUNTS)?;

    let dup = env
        .pipeline
        .update_script(first, &NewRuleScript::new("second", None, NEGATIVE_AMOUNTS))
        .unwrap_err();
    assert_eq!(dup.as_domain(), Some(&DomainError::DuplicateName("second".into())));

    // Keeping its own name is fine.
    env.pipeline
        .update_script(first, &NewRuleScript::new("first", None, NEGATIVE_AMOUNTS))?;

    let missing = env
        .pipeline
        .update_script(999, &NewRuleScript::new("x", None, NEGATIVE_AMOUNTS))
        .unwrap_err();
    assert_eq!(missing.as_domain(), Some(&DomainError::NotFound(999)));
    Ok(())
}

#[test]
fn test_scripts_are_listed_by_id() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let a = env.create("b-second-alphabetically", NEGATIVE_AMOUNTS)?;
    let b = env.create("a-first-alphabetically", LARGE_AMOUNTS)?;

    let ids: Vec<i64> = env.pipeline.list_scripts()?.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![a, b]);
    assert!(a < b);
    Ok(())
}

#[test]
fn test_run_select_and_statement_paths() -> Result<()> {
    let env = PipelineTestEnv::new()?;

    let err = env
        .pipeline
        .run_select("DELETE FROM raw_events", &[])
        .unwrap_err();
    assert_eq!(err.as_domain(), Some(&DomainError::NotASelect));
    assert_eq!(
        env.pipeline
            .run_select("SELECT count(*) AS n FROM raw_events", &[])?
            .rows[0]["n"],
        json!(4)
    );

    let out = env.pipeline.run_select(
        "SELECT uid, amount, TIMESTAMP '2024-02-03 04:05:06' AS seen FROM raw_events WHERE uid = ?",
        &[Param::from("b-2")],
    )?;
    assert_eq!(out.column_names, vec!["uid", "amount", "seen"]);
    assert_eq!(out.rows[0]["amount"], json!(20.0));
    assert_eq!(out.rows[0]["seen"], json!("2024-02-03T04:05:06"));

    let read_only = env.pipeline.run_statement(
        "DELETE FROM raw_events",
        &[],
        StatementIntent::ReadOnly,
    )?;
    assert!(!read_only.committed());
    assert_eq!(
        env.pipeline
            .run_select("SELECT count(*) AS n FROM raw_events", &[])?
            .rows[0]["n"],
        json!(4)
    );
    Ok(())
}

#[test]
fn test_stats_and_filtered_findings() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let neg = env.create("neg", NEGATIVE_AMOUNTS)?;
    let big = env.create("big", LARGE_AMOUNTS)?;
    for id in [neg, big] {
        env.pipeline.populate_staging(id)?;
        env.pipeline.publish_findings(id)?;
    }

    let stats = env.pipeline.stats()?;
    assert_eq!(stats.script_count, 2);
    assert_eq!(stats.finding_count, 3);

    let filtered = env.pipeline.query_findings(&FindingsFilter {
        rule_id: Some("R_NEG".into()),
        source_id: Some("SRC_B".into()),
        ..FindingsFilter::default()
    })?;
    assert_eq!(filtered.rows.len(), 1);
    assert_eq!(filtered.rows[0]["source_uid"], json!("b-1"));
    Ok(())
}

#[test]
fn test_preview_runs_without_persisting() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let out = env.pipeline.preview_script(NEGATIVE_AMOUNTS)?;
    assert_eq!(out.rows.len(), 2);
    assert_eq!(
        out.column_names,
        vec!["rule_id", "source_id", "source_uid", "data_value", "txn_date"]
    );
    assert!(env.pipeline.list_scripts()?.is_empty());
    assert!(env.staging_ids()?.is_empty());
    Ok(())
}

#[test]
fn test_init_catalog_is_rerunnable() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    env.create("neg", NEGATIVE_AMOUNTS)?;
    env.pipeline.init_catalog()?;
    assert_eq!(env.pipeline.stats()?.script_count, 1);
    Ok(())
}

#[test]
fn test_concurrent_runs_of_one_script_do_not_duplicate() -> Result<()> {
    let env = Arc::new(PipelineTestEnv::new()?);
    let id = env.create("neg", NEGATIVE_AMOUNTS)?;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let env = Arc::clone(&env);
            thread::spawn(move || -> Result<()> {
                env.pipeline.populate_staging(id)?;
                env.pipeline.publish_findings(id)?;
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("worker panicked"))?
            .context("worker failed")?;
    }

    assert_eq!(env.staged(id)?.len(), 2);
    assert_eq!(env.findings()?.len(), 2);
    Ok(())
}

#[test]
fn test_reordered_projection_lands_in_named_columns() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let id = env.create("neg", NEGATIVE_AMOUNTS)?;

    env.pipeline.update_script(
        id,
        &NewRuleScript::new(
            "neg",
            None,
            "SELECT e.source_id, e.event_date AS txn_date, 'R_NEG' AS rule_id, \
             CAST(e.amount AS VARCHAR) AS data_value, e.uid AS source_uid \
             FROM raw_events e WHERE e.amount < 0",
        ),
    )?;
    env.pipeline.populate_staging(id)?;
    env.pipeline.publish_findings(id)?;

    let findings = env.findings()?;
    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0]["rule_id"], json!("R_NEG"));
    assert_eq!(findings[0]["source_id"], json!("SRC_A"));
    assert_eq!(findings[0]["source_uid"], json!("a-1"));
    assert_eq!(findings[0]["data_value"], json!("-5.00"));
    assert_eq!(findings[0]["txn_date"], json!("2024-01-02"));
    Ok(())
}

#[test]
fn test_create_is_all_or_nothing_when_staging_fails() -> Result<()> {
    let env = PipelineTestEnv::new()?;
    let result = env.pipeline.create_script(&NewRuleScript::new(
        "dangling",
        None,
        "SELECT rule_id, source_id, source_uid, data_value, txn_date FROM no_such_table",
    ));

    assert!(result.is_err());
    assert!(env.pipeline.list_scripts()?.is_empty());
    assert!(env.staging_ids()?.is_empty());
    Ok(())
}
