//! # Tabula CLI
//!
//! Command-line interface for browsing JSON datasets as tables.
//!
//! ## Commands
//!
//! - `tabula query <dataset> [search]` - Filter, sort and page a dataset
//! - `tabula columns <dataset>` - Show or hide columns
//! - `tabula limit <dataset> <n>` - Set the page size
//! - `tabula sort <dataset> <prop[:desc]>...` - Set the sort order
//! - `tabula interactive <dataset>` - Start interactive TUI mode
//! - `tabula status` - Show stored table configurations
//! - `tabula clear` - Remove stored table configurations
//!
//! ## Example Usage
//!
//! ```bash
//! # Rows whose "Host name" column contains "web" and any column contains 8080
//! tabula query hosts.json "name:web 8080"
//!
//! # Quoted column names may contain spaces
//! tabula query hosts.json "'Last seen':2024"
//!
//! # Hide a column, sort descending by uptime
//! tabula columns hosts.json --hide owner
//! tabula sort hosts.json uptime:desc
//! ```

mod app;
mod commands;
mod render;
mod tui;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Tabula - Filter, sort and page tabular data
#[derive(Parser)]
#[command(name = "tabula")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// The dataset a command works on
#[derive(Args, Clone, Debug)]
pub struct TableArgs {
    /// JSON dataset: an array of rows or {identifier, columns, rows}
    pub dataset: PathBuf,

    /// Name the stored configuration is kept under (defaults to the identifier)
    #[arg(short, long)]
    pub table: Option<String>,

    /// Row identifier column
    #[arg(long)]
    pub identifier: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter, sort and page a dataset
    Query {
        #[command(flatten)]
        table: TableArgs,

        /// Search text; the stored search is used when omitted
        #[arg(allow_hyphen_values = true)]
        search: Option<String>,

        /// Drop the stored search and show every row
        #[arg(long, conflicts_with = "search")]
        reset: bool,

        /// Page to show (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Show or hide columns
    Columns {
        #[command(flatten)]
        table: TableArgs,

        /// Columns to hide (by prop)
        #[arg(long)]
        hide: Vec<String>,

        /// Columns to show (by prop)
        #[arg(long)]
        show: Vec<String>,
    },

    /// Set the page size
    Limit {
        #[command(flatten)]
        table: TableArgs,

        /// Rows per page; values below 1 become 1
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Set the sort order
    Sort {
        #[command(flatten)]
        table: TableArgs,

        /// Sort keys as `prop` or `prop:desc`; none restores the default
        keys: Vec<String>,
    },

    /// Start interactive TUI mode
    #[command(alias = "i")]
    Interactive {
        #[command(flatten)]
        table: TableArgs,
    },

    /// Show stored table configurations
    Status,

    /// Remove stored table configurations
    Clear {
        /// Only clear this table
        #[arg(short, long)]
        table: Option<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => tabula_core::Config::load_from(path)?,
        None => tabula_core::Config::load()?,
    };

    // Setup logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.general.log_level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();

    // Execute command
    match cli.command {
        Commands::Query {
            table,
            search,
            reset,
            page,
            output,
        } => commands::query::run(config, &table, search, reset, page, output),
        Commands::Columns { table, hide, show } => commands::columns::run(config, &table, hide, show),
        Commands::Limit { table, value } => commands::limit::run(config, &table, &value),
        Commands::Sort { table, keys } => commands::sort::run(config, &table, &keys),
        Commands::Interactive { table } => tui::run(config, &table),
        Commands::Status => commands::status::run(config),
        Commands::Clear { table, yes } => commands::clear::run(config, table, yes),
    }
}
