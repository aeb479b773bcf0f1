//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// patchlevel - apply versioned patches to a database, in order, exactly once
#[derive(Parser, Debug)]
#[command(name = "pl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Named target from the config (also read from PL_TARGET)
    #[arg(short, long, global = true)]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending patches
    Migrate(MigrateArgs),

    /// Show the current patch level and pending patches
    Status(StatusArgs),

    /// Check patch files and configuration without touching the database
    Validate(ValidateArgs),

    /// Create the next patch file
    New(NewArgs),
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Stop after this patch version
    #[arg(long, value_name = "VERSION")]
    pub to: Option<u64>,

    /// List what would be applied without applying it
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// Human-readable table
    Table,
    /// JSON document
    Json,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the new command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Short description, used in the file name
    pub description: String,

    /// Kind of patch to create
    #[arg(short, long, value_enum, default_value = "sql")]
    pub kind: NewPatchKind,
}

/// Patch kinds `pl new` can scaffold
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewPatchKind {
    /// SQL script
    Sql,
    /// Declarative data load
    DataLoad,
    /// Programmatic task reference
    Task,
}
