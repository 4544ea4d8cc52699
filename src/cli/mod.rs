//! CLI module
//!
//! Command-line interface for the PDS client.
//!
//! # Commands
//!
//! - `search` - Run one search and print the response
//! - `paginate` - Retrieve every page, printing batches as they arrive
//! - `environments` - List known environments

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
