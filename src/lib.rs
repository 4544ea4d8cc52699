// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # PDS Client
//!
//! Client for the People Directory Service person search API.
//!
//! ## Features
//!
//! - **Retrying Requests**: Bounded attempts with backoff; client errors fail fast
//! - **Session Pagination**: Follows the server-side `session_id` cursor
//! - **Background Retrieval**: A worker task fetches pages while you consume them
//! - **Backlog Throttling**: Fetching slows down when results pile up
//! - **Queue or List Accumulation**: Take results page by page or record by record
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pds_client::{AccumulatorMode, PaginationOptions, PdsClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut client = PdsClient::from_env()?;
//!     let query = serde_json::json!({"fields": ["names"], "conditions": {"names.name": "smith"}});
//!
//!     // One page
//!     let page = client.search(&query, false).await?;
//!
//!     // Everything, in the background
//!     client
//!         .start_pagination(&query, PaginationOptions::new(AccumulatorMode::Queue))
//!         .await?;
//!     while client.is_paginating() || client.has_results() {
//!         if let Some(people) = client.next_people() {
//!             // process people
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          PdsClient                              │
//! │  search() / next()   start_pagination()   next_results()        │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌───────────┬──────────────────┴─────┬──────────────┬────────────┐
//! │   HTTP    │   Session              │   Engine     │ Accumulator│
//! ├───────────┼────────────────────────┼──────────────┼────────────┤
//! │ Retry     │ search (paginate=true) │ Worker task  │ Queue      │
//! │ Backoff   │ next (session_id)      │ Throttle     │ List       │
//! │ Rate Limit│ Short page ends it     │ Cancel       │            │
//! └───────────┴────────────────────────┴──────────────┴────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client configuration
pub mod config;

/// HTTP client with retry and rate limiting
pub mod http;

/// Search session protocol
pub mod session;

/// Result accumulators shared with the pagination worker
pub mod accumulator;

/// Backlog-based request throttling
pub mod throttle;

/// Background pagination engine
pub mod engine;

/// Person record accessor
pub mod person;

/// Client facade
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use client::PdsClient;
pub use config::ClientConfig;
pub use engine::{PaginationOptions, RunProgress, RunState};
pub use person::{make_people, Person};
pub use session::{Page, SearchOptions};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
