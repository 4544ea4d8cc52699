//! Person records
//!
//! Thin accessor over a result record so callers can write
//! `person.get_str("names.0.firstName")` instead of walking JSON by hand.

use crate::types::Record;
use serde_json::Value;

/// One person returned by a search
#[derive(Debug, Clone, PartialEq)]
pub struct Person(Record);

impl Person {
    /// Wrap a result record
    pub fn new(record: Record) -> Self {
        Self(record)
    }

    /// Look up a dot-separated path; numeric segments index into arrays
    pub fn get(&self, path: &str) -> Option<&Value> {
        let path = path.strip_prefix("$.").unwrap_or(path);
        if path.is_empty() {
            return Some(&self.0);
        }

        let mut current = &self.0;
        for part in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Look up a path and render scalars as a string
    pub fn get_str(&self, path: &str) -> Option<String> {
        match self.get(path)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// The underlying record
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the underlying record
    pub fn into_inner(self) -> Record {
        self.0
    }
}

impl From<Record> for Person {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

/// Wrap a batch of records
pub fn make_people(records: Vec<Record>) -> Vec<Person> {
    records.into_iter().map(Person::new).collect()
}
