// dqx/src/commands/mod.rs

pub mod catalog;
pub mod context;
pub mod init;
pub mod output;
pub mod query;
pub mod run;
pub mod script;

use crate::cli::{Cli, Commands};

pub fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let global = cli.global;
    match cli.command {
        Commands::Init { name } => init::execute(&global, &name),
        Commands::Script(cmd) => script::execute(&global, cmd),
        Commands::Populate { id } => run::populate(&global, id),
        Commands::Publish { id } => run::publish(&global, id),
        Commands::Query { sql, params } => query::select(&global, &sql, &params),
        Commands::Exec { sql, params, mode } => query::exec(&global, &sql, &params, mode),
        Commands::Stats => catalog::stats(&global),
        Commands::Findings {
            rule_id,
            source_id,
            limit,
        } => catalog::findings(&global, rule_id, source_id, limit),
        Commands::Staging => catalog::staging(&global),
    }
}
