//! Session protocol
//!
//! A PDS search can open a server-side session whose identifier is handed
//! back with every page. Continuation requests address that identifier
//! instead of re-sending the query.
//!
//! # Overview
//!
//! - `Session::search` issues the first request and resets the cursor
//! - `Session::next` fetches the next page of the open session
//! - A page shorter than the configured page size ends the session

mod protocol;
mod types;

pub use protocol::{session_url, Session};
pub use types::{Page, SearchOptions};
