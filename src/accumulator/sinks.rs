//! Accumulator implementations

use crate::types::{AccumulatorMode, Record};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// ============================================================================
// Page Queue
// ============================================================================

/// FIFO of whole pages
///
/// Backlog is approximated as `pages * page_size`; a short final page is
/// counted as full.
#[derive(Debug, Clone, Default)]
pub struct PageQueue {
    pages: VecDeque<Vec<Record>>,
    page_size: usize,
}

impl PageQueue {
    /// Create an empty queue
    pub fn new(page_size: usize) -> Self {
        Self {
            pages: VecDeque::new(),
            page_size,
        }
    }

    /// Append a page
    pub fn push_page(&mut self, page: Vec<Record>) {
        self.pages.push_back(page);
    }

    /// Take the oldest page
    pub fn take(&mut self) -> Option<Vec<Record>> {
        self.pages.pop_front()
    }

    /// Number of queued pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no pages are queued
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Approximate number of queued records
    pub fn backlog(&self) -> usize {
        self.pages.len().saturating_mul(self.page_size)
    }

    /// Take every queued record, in order
    pub fn drain_all(&mut self) -> Vec<Record> {
        self.pages.drain(..).flatten().collect()
    }
}

// ============================================================================
// Record List
// ============================================================================

/// Flat, ordered list of records
#[derive(Debug, Clone, Default)]
pub struct RecordList {
    records: VecDeque<Record>,
    page_size: usize,
}

impl RecordList {
    /// Create an empty list
    pub fn new(page_size: usize) -> Self {
        Self {
            records: VecDeque::new(),
            page_size,
        }
    }

    /// Append the records of a page
    pub fn push_page(&mut self, page: Vec<Record>) {
        self.records.extend(page);
    }

    /// Take up to one page worth of records from the front
    pub fn take(&mut self) -> Option<Vec<Record>> {
        if self.records.is_empty() {
            return None;
        }
        let n = self.page_size.max(1).min(self.records.len());
        Some(self.records.drain(..n).collect())
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are held
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records held
    pub fn backlog(&self) -> usize {
        self.records.len()
    }

    /// Take every record, in order
    pub fn drain_all(&mut self) -> Vec<Record> {
        self.records.drain(..).collect()
    }
}

// ============================================================================
// Accumulator
// ============================================================================

/// Result sink of a pagination run
#[derive(Debug, Clone)]
pub enum Accumulator {
    /// Whole pages
    Queue(PageQueue),
    /// Flattened records
    List(RecordList),
}

impl Accumulator {
    /// Create an empty accumulator of the given mode
    pub fn new(mode: AccumulatorMode, page_size: usize) -> Self {
        match mode {
            AccumulatorMode::Queue => Self::Queue(PageQueue::new(page_size)),
            AccumulatorMode::List => Self::List(RecordList::new(page_size)),
        }
    }

    /// Mode of this accumulator
    pub fn mode(&self) -> AccumulatorMode {
        match self {
            Self::Queue(_) => AccumulatorMode::Queue,
            Self::List(_) => AccumulatorMode::List,
        }
    }

    /// Append one page of results
    pub fn push_page(&mut self, page: Vec<Record>) {
        match self {
            Self::Queue(q) => q.push_page(page),
            Self::List(l) => l.push_page(page),
        }
    }

    /// Take the next batch: a whole page, or up to a page size of records
    pub fn take(&mut self) -> Option<Vec<Record>> {
        match self {
            Self::Queue(q) => q.take(),
            Self::List(l) => l.take(),
        }
    }

    /// Pages queued (queue mode) or records held (list mode)
    pub fn len(&self) -> usize {
        match self {
            Self::Queue(q) => q.len(),
            Self::List(l) => l.len(),
        }
    }

    /// Whether nothing is waiting for the consumer
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Queue(q) => q.is_empty(),
            Self::List(l) => l.is_empty(),
        }
    }

    /// Records-equivalent size used for throttling
    pub fn backlog(&self) -> usize {
        match self {
            Self::Queue(q) => q.backlog(),
            Self::List(l) => l.backlog(),
        }
    }

    /// Take everything, in order
    pub fn drain_all(&mut self) -> Vec<Record> {
        match self {
            Self::Queue(q) => q.drain_all(),
            Self::List(l) => l.drain_all(),
        }
    }
}

// ============================================================================
// Shared Accumulator
// ============================================================================

/// Accumulator shared between the pagination worker and the consumer
///
/// Every operation takes the lock for its own duration only, so a consumer
/// taking a batch never observes a half-appended page.
#[derive(Debug, Clone)]
pub struct SharedAccumulator {
    inner: Arc<Mutex<Accumulator>>,
}

impl SharedAccumulator {
    /// Create an empty shared accumulator
    pub fn new(mode: AccumulatorMode, page_size: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Accumulator::new(mode, page_size))),
        }
    }

    // poisoning ignored: no operation leaves the collections half-updated
    fn lock(&self) -> MutexGuard<'_, Accumulator> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mode of the wrapped accumulator
    pub fn mode(&self) -> AccumulatorMode {
        self.lock().mode()
    }

    /// Append one page of results
    pub fn push_page(&self, page: Vec<Record>) {
        self.lock().push_page(page);
    }

    /// Take the next batch
    pub fn take(&self) -> Option<Vec<Record>> {
        self.lock().take()
    }

    /// Pages queued (queue mode) or records held (list mode)
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is waiting for the consumer
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Records-equivalent size used for throttling
    pub fn backlog(&self) -> usize {
        self.lock().backlog()
    }

    /// Take everything, in order
    pub fn drain_all(&self) -> Vec<Record> {
        self.lock().drain_all()
    }
}
