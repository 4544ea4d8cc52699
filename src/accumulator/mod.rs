//! Result accumulators
//!
//! Where a pagination run puts the pages it fetches until the consumer
//! takes them.
//!
//! # Overview
//!
//! - `PageQueue` - FIFO of whole pages, the consumer takes one page at a time
//! - `RecordList` - flat ordered records, the consumer takes up to a page size
//! - `Accumulator` - sum of the two, fixed for the lifetime of a run
//! - `SharedAccumulator` - lock-protected handle shared by worker and consumer

mod sinks;

pub use sinks::{Accumulator, PageQueue, RecordList, SharedAccumulator};
