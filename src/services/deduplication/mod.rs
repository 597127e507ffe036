//! Deduplication of dual-logged connections.
//!
//! The platform reports a two-way connection once per direction. Within a
//! correlated group, a `TERMINATING` leg and an `ORIGINATING` leg that share
//! start time and called number describe the same connection; the
//! originating copy is removed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                DeduplicationService                  │
//! │  ┌────────────────────┐  ┌────────────────────────┐  │
//! │  │ Pairwise           │  │ Indexed                │  │
//! │  │ Deduplicator       │  │ Deduplicator           │  │
//! │  │                    │  │                        │  │
//! │  │ all-pairs scan     │  │ terminating-key index  │  │
//! │  └────────────────────┘  └────────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Both strategies remove exactly the same records; the strategy is a
//! configuration choice ([`DedupStrategy`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use callflow::services::deduplication::{
//!     DedupStrategy, DeduplicationConfig, DeduplicationService,
//! };
//!
//! let service = DeduplicationService::new(DeduplicationConfig::new(DedupStrategy::Indexed));
//! let history = service.deduplicate(history)?;
//! ```

mod config;
mod indexed;
mod pairwise;
mod service;
mod types;

pub use config::{DEDUP_STRATEGY_ENV, DedupStrategy, DeduplicationConfig};
pub use indexed::IndexedDeduplicator;
pub use pairwise::PairwiseDeduplicator;
pub use service::DeduplicationService;
pub use types::{
    ConnectionKey, DeduplicationResult, Deduplicator, LegSignature,
    is_same_bidirectional_connection,
};
