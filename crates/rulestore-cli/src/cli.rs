use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "rulestore")]
#[command(about = "Manage Casbin policy rules stored in MongoDB")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (defaults to ./rulestore.toml when present)
    #[arg(short, long, global = true, env = "RULESTORE_CONFIG")]
    pub config: Option<PathBuf>,

    /// MongoDB connection string (overrides config)
    #[arg(short, long, global = true, env = "RULESTORE_URI")]
    pub uri: Option<String>,

    /// Database holding the rule collection (overrides config)
    #[arg(short, long, global = true, env = "RULESTORE_DATABASE")]
    pub database: Option<String>,

    /// Rule collection name (overrides config)
    #[arg(long, global = true, env = "RULESTORE_COLLECTION")]
    pub collection: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log level or filter directive (overrides config; RUST_LOG wins over both)
    #[arg(long, global = true, env = "RULESTORE_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    /// Policy lines, as in a Casbin policy.csv
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List stored rules in store order, duplicates included, optionally filtered
    List(ListArgs),
    /// Store a rule
    Add(RuleArgs),
    /// Remove the rules holding exactly the given values
    Remove(RuleArgs),
    /// Remove every rule whose values match from a position onwards
    RemoveFiltered(RemoveFilteredArgs),
    /// Load a policy CSV file into the store
    Import(ImportArgs),
    /// Write every stored rule as policy lines
    Export(ExportArgs),
    /// Delete every stored rule
    Clear(ClearArgs),
    /// Show the effective configuration
    Config,
}

#[derive(clap::Args, Default)]
pub struct ListArgs {
    /// Policy types to include (repeatable)
    #[arg(long)]
    pub ptype: Vec<String>,
    /// Accepted values for v0 (repeatable)
    #[arg(long)]
    pub v0: Vec<String>,
    /// Accepted values for v1 (repeatable)
    #[arg(long)]
    pub v1: Vec<String>,
    /// Accepted values for v2 (repeatable)
    #[arg(long)]
    pub v2: Vec<String>,
    /// Accepted values for v3 (repeatable)
    #[arg(long)]
    pub v3: Vec<String>,
    /// Accepted values for v4 (repeatable)
    #[arg(long)]
    pub v4: Vec<String>,
    /// Accepted values for v5 (repeatable)
    #[arg(long)]
    pub v5: Vec<String>,
    /// Raw MongoDB query as JSON; other filter options are ignored
    #[arg(long)]
    pub raw: Option<String>,
}

#[derive(clap::Args)]
pub struct RuleArgs {
    /// Policy type (e.g. p, g, g2)
    pub ptype: String,
    /// Rule values, at most six
    #[arg(required = true)]
    pub values: Vec<String>,
}

#[derive(clap::Args)]
pub struct RemoveFilteredArgs {
    /// Policy type (e.g. p, g, g2)
    pub ptype: String,
    /// Position of the first value (0-5)
    pub field_index: usize,
    /// Values to match from field_index onwards
    pub values: Vec<String>,
}

#[derive(clap::Args)]
pub struct ImportArgs {
    /// Policy CSV file
    pub file: PathBuf,
    /// Casbin model file defining the policy types to import
    #[arg(short, long)]
    pub model: PathBuf,
    /// Delete every stored rule before importing
    #[arg(long)]
    pub replace: bool,
}

#[derive(clap::Args)]
pub struct ExportArgs {
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ClearArgs {
    /// Confirm deletion of every stored rule
    #[arg(long)]
    pub yes: bool,
}
