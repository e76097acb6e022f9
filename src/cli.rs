//! CLI argument definitions.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::export::SchemaFormat;
use crate::loader::LoadOptions;

/// Top-level CLI parser for `knack-sleuth`.
#[derive(Debug, Parser)]
#[command(
    name = "knack-sleuth",
    version,
    about = "Find where Knack objects and fields are used and what a change would break"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// YAML file overriding analysis thresholds.
    #[arg(long, value_name = "YAML", global = true)]
    pub policy: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Where to read application metadata from.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Local metadata export; when absent the API is used.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Application id (overrides KNACK_APP_ID).
    #[arg(long)]
    pub app_id: Option<String>,

    /// Ignore the cache and fetch fresh metadata.
    #[arg(long)]
    pub refresh: bool,

    /// Neither read nor write the cache.
    #[arg(long, conflicts_with = "refresh")]
    pub no_cache: bool,
}

impl SourceArgs {
    /// Loader options for these arguments.
    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            file: self.file.clone(),
            app_id: self.app_id.clone(),
            refresh: self.refresh,
            no_cache: self.no_cache,
        }
    }
}

/// Report formats for analysis commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
    /// Markdown document.
    Markdown,
}

/// Formats for `export-schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// JSON Schema draft-07.
    Json,
    /// Database Markup Language.
    Dbml,
    /// YAML table listing.
    Yaml,
}

impl From<ExportFormat> for SchemaFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::JsonSchema,
            ExportFormat::Dbml => Self::Dbml,
            ExportFormat::Yaml => Self::Yaml,
        }
    }
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every place an object and its fields are used.
    SearchObject {
        /// Object key (object_12) or name.
        identifier: String,
        /// Only show object-level usages.
        #[arg(long)]
        no_fields: bool,
        /// Metadata source.
        #[command(flatten)]
        source: SourceArgs,
    },
    /// List every place a field is used.
    SearchField {
        /// Field key (field_34) or name.
        identifier: String,
        /// Metadata source.
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Table of objects with record counts and coupling.
    ListObjects {
        /// Sort by record count, largest first.
        #[arg(long)]
        sort_by_rows: bool,
        /// Metadata source.
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Inbound and outbound connections of one object.
    ShowCoupling {
        /// Object key or name.
        identifier: String,
        /// Metadata source.
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Fetch metadata from the API and save it to a file.
    DownloadMetadata {
        /// Destination file (default: <app_id>_metadata.json).
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,
        /// Application id (overrides KNACK_APP_ID).
        #[arg(long)]
        app_id: Option<String>,
        /// Ignore the cache and fetch fresh metadata.
        #[arg(long)]
        refresh: bool,
    },
    /// Change-impact report for an object or field.
    ImpactAnalysis {
        /// Object or field key or name.
        identifier: String,
        /// Output format.
        #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
        format: ReportFormat,
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Metadata source.
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Architecture summary of the whole application.
    AppSummary {
        /// Output format.
        #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
        format: ReportFormat,
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Metadata source.
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Export the database schema.
    ExportSchema {
        /// Output format.
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Metadata source.
        #[command(flatten)]
        source: SourceArgs,
    },
}
