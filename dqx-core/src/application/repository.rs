// dqx-core/src/application/repository.rs

use chrono::{NaiveDateTime, Utc};
use tracing::{info, instrument};

use crate::application::staging::StagingTables;
use crate::application::unit_of_work::UnitOfWork;
use crate::domain::compiler::builder::{Ident, SqlBuilder};
use crate::domain::compiler::dialect::Dialect;
use crate::domain::error::DomainError;
use crate::domain::quality::catalog::Catalog;
use crate::domain::quality::script::{NewRuleScript, RuleScript};
use crate::error::DqxError;

/// Persistence of rule scripts. Content is validated before any statement
/// is sent.
pub struct ScriptRepository<'a> {
    dialect: Dialect,
    catalog: &'a Catalog,
}

impl<'a> ScriptRepository<'a> {
    pub fn new(dialect: Dialect, catalog: &'a Catalog) -> Self {
        Self { dialect, catalog }
    }

    /// Inserts the script and creates its staging table in the same unit of
    /// work; either both exist afterwards or neither does.
    #[instrument(skip(self, uow, script), fields(name = %script.name))]
    pub fn create(
        &self,
        uow: &mut UnitOfWork,
        script: &NewRuleScript,
    ) -> Result<RuleScript, DqxError> {
        script.validate()?;
        self.ensure_name_free(uow, &script.name, None)?;

        let now = now();
        let columns = self.catalog.script_columns();
        let mut b = SqlBuilder::new(self.dialect);
        b.push("INSERT INTO ")
            .push_table(&self.catalog.scripts)
            .push(" (")
            .push_ident_list(&columns[1..])
            .push(") VALUES (")
            .push_param(script.name.as_str())
            .push(", ")
            .push_param(script.description.clone())
            .push(", ")
            .push_param(script.content.as_str())
            .push(", ")
            .push_timestamp(now)
            .push(", ")
            .push_timestamp(now)
            .push(") RETURNING ")
            .push_ident_list(&columns);

        let created = single(RuleScript::from_result_set(&uow.query(&b.build())?)?)?;

        StagingTables::new(self.dialect, self.catalog).create_or_replace(
            uow,
            created.id,
            &created.content,
        )?;
        info!(id = created.id, "Script created");
        Ok(created)
    }

    /// Replaces name, description and content. The staging table keeps its
    /// shape until the next populate.
    #[instrument(skip(self, uow, script))]
    pub fn update(
        &self,
        uow: &mut UnitOfWork,
        id: i64,
        script: &NewRuleScript,
    ) -> Result<RuleScript, DqxError> {
        script.validate()?;
        if self.get(uow, id)?.is_none() {
            return Err(DomainError::NotFound(id).into());
        }
        self.ensure_name_free(uow, &script.name, Some(id))?;

        let columns = self.catalog.script_columns();
        let mut b = SqlBuilder::new(self.dialect);
        b.push("UPDATE ")
            .push_table(&self.catalog.scripts)
            .push(" SET ")
            .push_ident(&columns[1])
            .push(" = ")
            .push_param(script.name.as_str())
            .push(", ")
            .push_ident(&columns[2])
            .push(" = ")
            .push_param(script.description.clone())
            .push(", ")
            .push_ident(&columns[3])
            .push(" = ")
            .push_param(script.content.as_str())
            .push(", ")
            .push_ident(&columns[5])
            .push(" = ")
            .push_timestamp(now())
            .push(" WHERE ")
            .push_ident(&columns[0])
            .push(" = ")
            .push_param(id)
            .push(" RETURNING ")
            .push_ident_list(&columns);

        let updated = single(RuleScript::from_result_set(&uow.query(&b.build())?)?)?;
        info!(id, "Script updated");
        Ok(updated)
    }

    /// Drops the staging table, then the row. Unknown ids delete nothing.
    #[instrument(skip(self, uow))]
    pub fn delete(&self, uow: &mut UnitOfWork, id: i64) -> Result<usize, DqxError> {
        StagingTables::new(self.dialect, self.catalog).drop(uow, id)?;

        let mut b = SqlBuilder::new(self.dialect);
        b.push("DELETE FROM ")
            .push_table(&self.catalog.scripts)
            .push(" WHERE ")
            .push_ident(&Ident::trusted("id"))
            .push(" = ")
            .push_param(id);
        let deleted = uow.execute(&b.build())?;
        info!(id, deleted, "Script deleted");
        Ok(deleted)
    }

    pub fn get(&self, uow: &mut UnitOfWork, id: i64) -> Result<Option<RuleScript>, DqxError> {
        let mut b = self.select_all();
        b.push(" WHERE ")
            .push_ident(&Ident::trusted("id"))
            .push(" = ")
            .push_param(id);
        let mut scripts = RuleScript::from_result_set(&uow.query(&b.build())?)?;
        Ok(scripts.pop())
    }

    pub fn list(&self, uow: &mut UnitOfWork) -> Result<Vec<RuleScript>, DqxError> {
        let mut b = self.select_all();
        b.push(" ORDER BY ").push_ident(&Ident::trusted("id"));
        Ok(RuleScript::from_result_set(&uow.query(&b.build())?)?)
    }

    fn select_all(&self) -> SqlBuilder {
        let mut b = SqlBuilder::new(self.dialect);
        b.push("SELECT ")
            .push_ident_list(&self.catalog.script_columns())
            .push(" FROM ")
            .push_table(&self.catalog.scripts);
        b
    }

    fn ensure_name_free(
        &self,
        uow: &mut UnitOfWork,
        name: &str,
        except_id: Option<i64>,
    ) -> Result<(), DqxError> {
        let id = Ident::trusted("id");
        let mut b = SqlBuilder::new(self.dialect);
        b.push("SELECT ")
            .push_ident(&id)
            .push(" FROM ")
            .push_table(&self.catalog.scripts)
            .push(" WHERE ")
            .push_ident(&Ident::trusted("name"))
            .push(" = ")
            .push_param(name);
        if let Some(except) = except_id {
            b.push(" AND ").push_ident(&id).push(" <> ").push_param(except);
        }
        if uow.query(&b.build())?.is_empty() {
            Ok(())
        } else {
            Err(DomainError::DuplicateName(name.to_string()).into())
        }
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn single(scripts: Vec<RuleScript>) -> Result<RuleScript, DqxError> {
    let count = scripts.len();
    match (scripts.into_iter().next(), count) {
        (Some(script), 1) => Ok(script),
        _ => Err(DomainError::RowShape {
            entity: "rule_script".to_string(),
            reason: format!("expected exactly one returned row, got {}", count),
        }
        .into()),
    }
}
