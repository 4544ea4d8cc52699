//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PDS person search client
#[derive(Parser, Debug)]
#[command(name = "pds")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Client configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// API key (overrides PDS_APIKEY and the config file)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Environment name: dev, test, stage or prod
    #[arg(short, long, global = true)]
    pub environment: Option<String>,

    /// Explicit search URL, overrides the environment
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one search and print the response
    Search {
        /// Query JSON
        #[arg(long)]
        query_json: String,

        /// Open a session and print its id
        #[arg(long)]
        paginate: bool,
    },

    /// Retrieve every page of a search
    Paginate {
        /// Query JSON
        #[arg(long)]
        query_json: String,

        /// Accumulator mode: queue or list
        #[arg(long, default_value = "queue")]
        mode: String,

        /// Backlog (records) above which fetching slows down
        #[arg(long)]
        backlog_limit: Option<usize>,

        /// Server-side session timeout in seconds
        #[arg(long)]
        session_timeout: Option<u64>,

        /// Fetch everything before printing
        #[arg(long)]
        wait: bool,
    },

    /// List known environments and their search URLs
    Environments,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
