//! Deduplication configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::indexed::IndexedDeduplicator;
use super::pairwise::PairwiseDeduplicator;
use super::types::Deduplicator;

/// Environment variable selecting the deduplication strategy.
pub const DEDUP_STRATEGY_ENV: &str = "CALLFLOW_DEDUP_STRATEGY";

/// How redundant legs are found within a group.
///
/// Both strategies remove exactly the same records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupStrategy {
    /// Compare every pair of records.
    #[default]
    Pairwise,
    /// Index terminating legs by `(start time, called number)`.
    Indexed,
}

impl DedupStrategy {
    /// Returns the strategy name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pairwise => "pairwise",
            Self::Indexed => "indexed",
        }
    }

    /// Builds the deduplicator for this strategy.
    #[must_use]
    pub fn build(&self) -> Box<dyn Deduplicator> {
        match self {
            Self::Pairwise => Box::new(PairwiseDeduplicator::new()),
            Self::Indexed => Box::new(IndexedDeduplicator::new()),
        }
    }
}

impl FromStr for DedupStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pairwise" | "pairs" | "all-pairs" => Ok(Self::Pairwise),
            "indexed" | "index" => Ok(Self::Indexed),
            _ => Err(Error::InvalidInput(format!(
                "Unknown dedup strategy: {s} (expected pairwise or indexed)"
            ))),
        }
    }
}

impl fmt::Display for DedupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the deduplication stage.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `CALLFLOW_DEDUP_STRATEGY` | string | `pairwise` | `pairwise` or `indexed`, applied by [`crate::CallflowConfig::with_env_overrides`] |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeduplicationConfig {
    /// Strategy used to find redundant legs.
    pub strategy: DedupStrategy,
}

impl DeduplicationConfig {
    /// Creates a configuration with the given strategy.
    #[must_use]
    pub const fn new(strategy: DedupStrategy) -> Self {
        Self { strategy }
    }
}
