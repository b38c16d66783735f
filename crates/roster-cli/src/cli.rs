//! CLI argument definitions for roster imports.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use roster_model::ImportIntent;

#[derive(Parser)]
#[command(
    name = "roster-import",
    version,
    about = "Import roster and drill-score spreadsheets",
    long_about = "Map arbitrary spreadsheet columns onto an event's roster fields and drills,\n\
                  resolve athlete identities, detect duplicates and report what each row becomes."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow athlete names and ids in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the built-in sport templates.
    Templates,

    /// Show how a sheet's columns would be mapped.
    Map(MapArgs),

    /// Import a sheet and report the outcome of every row.
    Import(ImportArgs),
}

/// Where the event schema comes from. Without either flag the template is
/// detected from the headers.
#[derive(Args, Debug, Clone, Default)]
pub struct SchemaArgs {
    /// Built-in template id or sport name.
    #[arg(long = "template", value_name = "ID", conflicts_with = "schema")]
    pub template: Option<String>,

    /// Event schema definition (TOML or JSON).
    #[arg(long = "schema", value_name = "FILE")]
    pub schema: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct MapArgs {
    /// CSV, TSV/TXT or spreadsheet workbook.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Worksheet to read from a workbook (default: first sheet).
    #[arg(long = "sheet", value_name = "NAME")]
    pub sheet: Option<String>,

    /// Event id recorded in the written mapping.
    #[arg(long = "event-id", value_name = "ID", default_value = "default")]
    pub event_id: String,

    /// Let several columns feed one field.
    #[arg(long = "allow-shared-targets")]
    pub allow_shared_targets: bool,

    /// Write the proposed mapping as JSON for later `--mapping` use.
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// CSV, TSV/TXT or spreadsheet workbook.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// What the import may do.
    #[arg(long = "intent", value_enum, default_value = "roster-only")]
    pub intent: IntentArg,

    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Worksheet to read from a workbook (default: first sheet).
    #[arg(long = "sheet", value_name = "NAME")]
    pub sheet: Option<String>,

    /// JSON array of records already stored for the event.
    #[arg(long = "existing", value_name = "FILE")]
    pub existing: Option<PathBuf>,

    /// Import options (TOML).
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Event id (overrides the config file).
    #[arg(long = "event-id", value_name = "ID")]
    pub event_id: Option<String>,

    /// Let several columns feed one field (overrides the config file).
    #[arg(long = "allow-shared-targets")]
    pub allow_shared_targets: bool,

    /// Confirmed mapping (JSON) applied to weak or unmapped columns.
    #[arg(long = "mapping", value_name = "FILE")]
    pub mapping: Option<PathBuf>,

    /// Directory of remembered mappings; read before and updated after the import.
    #[arg(long = "mappings-dir", value_name = "DIR")]
    pub mappings_dir: Option<PathBuf>,

    /// Write the full import result as JSON.
    #[arg(long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum IntentArg {
    RosterOnly,
    RosterAndScores,
    ScoresOnly,
}

impl From<IntentArg> for ImportIntent {
    fn from(value: IntentArg) -> Self {
        match value {
            IntentArg::RosterOnly => Self::RosterOnly,
            IntentArg::RosterAndScores => Self::RosterAndScores,
            IntentArg::ScoresOnly => Self::ScoresOnly,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
