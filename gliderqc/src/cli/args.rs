//! CLI argument definitions
//!
//! All Clap derive structs for `gliderqc` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::observability::LogFormat;
use gliderqc_core::config::{CdmDataType, DatasetLevel, DatasetMode};

// ============================================================================
// Root CLI
// ============================================================================

/// Validate and inspect glider derived-variable configuration.
#[derive(Parser, Debug)]
#[command(name = "gliderqc", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "GLIDERQC_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(
        long,
        default_value = "human",
        global = true,
        env = "GLIDERQC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate derived-variable documents.
    Validate(ValidateArgs),

    /// Print a document as the loader sees it.
    Show(ShowArgs),

    /// Print the derivation plan for a document.
    Plan(PlanArgs),

    /// List the QC definition files available to `runqc`.
    ListQc(ListQcArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Documents to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Enable strict validation (warnings become errors).
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub context: ContextArgs,

    #[command(flatten)]
    pub deployment: DeploymentArgs,
}

/// Arguments for `show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Document to print.
    pub file: PathBuf,

    /// Output format.
    #[arg(short, long, default_value = "yaml")]
    pub format: DocumentFormat,
}

/// Arguments for `plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Document to plan.
    pub file: PathBuf,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub context: ContextArgs,

    #[command(flatten)]
    pub deployment: DeploymentArgs,
}

/// Arguments for `list-qc`.
#[derive(Args, Debug)]
pub struct ListQcArgs {
    /// Additional QC definition directory (repeatable).
    #[arg(long = "qc-dir", value_name = "DIR")]
    pub qc_dirs: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub deployment: DeploymentArgs,
}

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Shared Argument Groups
// ============================================================================

/// What documents are checked against.
#[derive(Args, Debug, Default)]
pub struct ContextArgs {
    /// Variable catalog (YAML mapping of input variables to attributes).
    #[arg(long, value_name = "FILE", env = "GLIDERQC_VARIABLES")]
    pub variables: Option<PathBuf>,

    /// Additional known variable name (repeatable).
    #[arg(long = "known-var", value_name = "NAME")]
    pub known_vars: Vec<String>,

    /// Additional calculation name the pipeline provides (repeatable).
    #[arg(long = "calculation", value_name = "NAME")]
    pub calculations: Vec<String>,

    /// Additional QC definition directory (repeatable).
    #[arg(long = "qc-dir", value_name = "DIR")]
    pub qc_dirs: Vec<PathBuf>,
}

/// Locates a deployment in the glider data tree.
#[derive(Args, Debug, Default)]
pub struct DeploymentArgs {
    /// Deployment name (`glider-YYYYmmddTHHMM`).
    #[arg(long, env = "GLIDERQC_DEPLOYMENT")]
    pub deployment: Option<String>,

    /// Dataset mode.
    #[arg(long, default_value = "rt", requires = "deployment")]
    pub mode: DatasetMode,

    /// Dataset level.
    #[arg(long, default_value = "sci", requires = "deployment")]
    pub level: DatasetLevel,

    /// CDM data type.
    #[arg(long, default_value = "profile", requires = "deployment")]
    pub cdm_data_type: CdmDataType,

    /// Use the test data home (`GLIDER_DATA_HOME_TEST`).
    #[arg(long, requires = "deployment")]
    pub test: bool,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Output format for documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DocumentFormat {
    /// YAML, as written.
    #[default]
    Yaml,
    /// JSON.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
