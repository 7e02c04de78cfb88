//! logsift: turn diagnostic-bundle server logs into typed observations.
//!
//! Free-text, multi-line log entries are split into `name = value` fields
//! without a per-format grammar, and every field name is summarized in a
//! statistics dictionary. This crate holds the two layers that need the
//! rest of the workspace: the entry extractor and the concurrent
//! aggregation pipeline. Integration tests import them directly.
//!
//! # Architecture
//!
//! ```text
//! discover ──► worker pool ──► EntryReader ──► Extractor ──► sinks
//!                   │                              │
//!                   └──── merge_result ◄── per-file Dict
//! ```

pub mod extractor;
pub mod pipeline;
pub mod progress;

pub use extractor::{Extractor, ScopeWalk, ValueTypes};
pub use pipeline::{Pipeline, RunReport, RunState};
pub use progress::{FileOutcome, RunSummary};
