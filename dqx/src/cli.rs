// dqx/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use dqx_core::StatementIntent;

#[derive(Parser)]
#[command(name = "dqx")]
#[command(about = "Quality-rule scripts: validate, stage and publish data-quality findings", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Project directory (holds dqx.yaml)
    #[arg(long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Database file, overrides the configured one (":memory:" for a scratch engine)
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🏗️  Writes a default dqx.yaml and creates the catalog tables
    Init {
        /// Project name written to dqx.yaml
        #[arg(long, default_value = "quality")]
        name: String,
    },

    /// 📜 Manages rule scripts
    #[command(subcommand)]
    Script(ScriptCommands),

    /// 📥 Runs a script into its staging table
    Populate {
        /// Script id
        id: i64,
    },

    /// 📤 Publishes a script's staged rows into the findings table
    Publish {
        /// Script id
        id: i64,
    },

    /// 🔎 Runs a read-only SELECT (always rolled back)
    Query {
        sql: String,

        /// Positional parameter; JSON scalars are typed, anything else is text
        #[arg(long = "param", short = 'p')]
        params: Vec<String>,
    },

    /// ⚡ Runs any statement (DDL/DML)
    Exec {
        sql: String,

        #[arg(long = "param", short = 'p')]
        params: Vec<String>,

        /// Commit policy: infer | read-only | write
        #[arg(long, default_value = "infer")]
        mode: StatementIntent,
    },

    /// 📊 Counts scripts and findings
    Stats,

    /// 🐞 Lists published findings
    Findings {
        #[arg(long)]
        rule_id: Option<String>,

        #[arg(long)]
        source_id: Option<String>,

        #[arg(long, default_value = "1000")]
        limit: usize,
    },

    /// 🗂️  Lists staging tables with their row counts
    Staging,
}

#[derive(Subcommand)]
pub enum ScriptCommands {
    /// Creates a script and its empty staging table
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        content: ContentArgs,
    },

    /// Replaces a script's name, description and content
    Update {
        id: i64,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[command(flatten)]
        content: ContentArgs,
    },

    /// Deletes a script and its staging table; published findings stay
    Delete { id: i64 },

    /// Shows one script
    Show { id: i64 },

    /// Lists scripts by id
    List,

    /// Checks content against the column contract (no database needed)
    Validate {
        #[command(flatten)]
        content: ContentArgs,
    },

    /// Runs content read-only and prints what it would stage
    Preview {
        #[command(flatten)]
        content: ContentArgs,
    },
}

/// Script content, inline or from a file.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct ContentArgs {
    /// SQL text
    #[arg(long)]
    pub sql: Option<String>,

    /// File holding the SQL
    #[arg(long)]
    pub file: Option<PathBuf>,
}
