//! Common types used throughout the PDS client
//!
//! This module contains shared type definitions, type aliases,
//! and small enums used across multiple modules.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// A single result record as returned by the service
pub type Record = serde_json::Value;

// ============================================================================
// Environment
// ============================================================================

/// Named PDS deployment
///
/// Deserializes through [`Environment::from_name`], so unknown names in a
/// config file select prod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Environment {
    Dev,
    Test,
    Stage,
    #[default]
    Prod,
}

impl Environment {
    /// All environments, in promotion order
    pub const ALL: [Environment; 4] = [Self::Dev, Self::Test, Self::Stage, Self::Prod];

    /// Search endpoint for this environment
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Dev => "https://go.dev.apis.huit.harvard.edu/ats/person/v3/search",
            Self::Test => "https://go.stage.apis.huit.harvard.edu/ats/person/v3/search?env=test",
            Self::Stage => "https://go.stage.apis.huit.harvard.edu/ats/person/v3/search",
            Self::Prod => "https://go.apis.huit.harvard.edu/ats/person/v3/search",
        }
    }

    /// Short name as used in config files and on the command line
    pub fn name(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Stage => "stage",
            Self::Prod => "prod",
        }
    }

    /// Resolve a name; anything unrecognised falls back to prod
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "dev" => Self::Dev,
            "test" => Self::Test,
            "stage" => Self::Stage,
            _ => Self::Prod,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for Environment {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<String> for Environment {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

// ============================================================================
// Accumulator Mode
// ============================================================================

/// How paginated results are collected for the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulatorMode {
    /// FIFO of whole pages
    #[default]
    Queue,
    /// One flat, ordered list of records
    List,
}

impl AccumulatorMode {
    /// Short name
    pub fn name(self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::List => "list",
        }
    }
}

impl fmt::Display for AccumulatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccumulatorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queue" => Ok(Self::Queue),
            "list" => Ok(Self::List),
            _ => Err(Error::UnknownAccumulatorMode {
                mode: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}
