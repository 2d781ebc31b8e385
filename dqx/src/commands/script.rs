// dqx/src/commands/script.rs
//
// USE CASE: Rule script CRUD, validation and preview.

use anyhow::Context;
use serde_json::json;
use std::fs;

use dqx_core::QualityPipeline;
use dqx_core::domain::quality::NewRuleScript;

use crate::cli::{ContentArgs, GlobalOpts, ScriptCommands};
use crate::commands::context::open_pipeline;
use crate::commands::output::{print_json, rows_table, scripts_table};

impl ContentArgs {
    pub fn read(&self) -> anyhow::Result<String> {
        match (&self.sql, &self.file) {
            (Some(sql), _) => Ok(sql.clone()),
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read script file {:?}", path)),
            (None, None) => anyhow::bail!("Provide the script with --sql or --file"),
        }
    }
}

pub fn execute(global: &GlobalOpts, cmd: ScriptCommands) -> anyhow::Result<()> {
    match cmd {
        ScriptCommands::Create {
            name,
            description,
            content,
        } => {
            let script = NewRuleScript::new(name, description, content.read()?);
            let created = open_pipeline(global)?.create_script(&script)?;
            if global.json {
                return print_json(&created);
            }
            println!(
                "✅ Created script #{} '{}' (staging table ready)",
                created.id, created.name
            );
        }

        ScriptCommands::Update {
            id,
            name,
            description,
            content,
        } => {
            let script = NewRuleScript::new(name, description, content.read()?);
            let updated = open_pipeline(global)?.update_script(id, &script)?;
            if global.json {
                return print_json(&updated);
            }
            println!("✅ Updated script #{} '{}'", updated.id, updated.name);
            println!("   Staged rows are untouched until the next populate.");
        }

        ScriptCommands::Delete { id } => {
            let deleted = open_pipeline(global)?.delete_script(id)?;
            if global.json {
                return print_json(&json!({ "id": id, "deleted": deleted }));
            }
            if deleted == 0 {
                println!("🤷 No script with id {}", id);
            } else {
                println!("🗑️  Deleted script #{} and its staging table", id);
            }
        }

        ScriptCommands::Show { id } => {
            let script = open_pipeline(global)?.get_script(id)?;
            if global.json {
                return print_json(&script);
            }
            println!("📜 #{} {}", script.id, script.name);
            if let Some(description) = &script.description {
                println!("   {}", description);
            }
            println!(
                "   created {} | updated {}",
                script.created_at, script.updated_at
            );
            println!("\n{}", script.content);
        }

        ScriptCommands::List => {
            let scripts = open_pipeline(global)?.list_scripts()?;
            if global.json {
                return print_json(&scripts);
            }
            if scripts.is_empty() {
                println!("No scripts yet. Create one with `dqx script create`.");
            } else {
                println!("{}", scripts_table(&scripts));
            }
        }

        ScriptCommands::Validate { content } => {
            let columns = QualityPipeline::validate_script(&content.read()?)?;
            if global.json {
                return print_json(&json!({ "valid": true, "columns": columns }));
            }
            println!("✅ Valid. Columns: [{}]", columns.join(", "));
        }

        ScriptCommands::Preview { content } => {
            let output = open_pipeline(global)?.preview_script(&content.read()?)?;
            if global.json {
                return print_json(&output);
            }
            println!("{}", rows_table(&output));
            println!("   {} row(s), nothing persisted", output.len());
        }
    }
    Ok(())
}
