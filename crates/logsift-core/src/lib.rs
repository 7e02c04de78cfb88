//! logsift-core: shared model and leaf algorithms for logsift.
//!
//! This crate holds everything the extractor and the aggregation pipeline
//! agree on: the entry/field data model, configuration, the lexical
//! scanner, the statistics dictionary with its log-scale histogram, the
//! file-meta catalog describing each log dialect, and the graph data feed.
//!
//! # Architecture
//!
//! ```text
//! bundle dir ──► Segmenter ──► Entry ──► Extractor ──► Field ──► sinks
//!                                            │
//!                                            └──► Dict (per file) ──► merge ──► global Dict
//! ```
//!
//! The segmenter lives in `logsift-feeds`, the sinks in `logsift-emit`, and
//! the extractor plus pipeline in the root `logsift` crate.

pub mod config;
pub mod dict;
pub mod error;
pub mod graph;
pub mod histogram;
pub mod meta;
pub mod scanner;
pub mod types;

pub use config::Config;
pub use dict::{Dict, DictEntry, DictPolicy, DictSnapshot};
pub use error::Error;
pub use graph::{GraphData, GraphEntry};
pub use histogram::{Histogram, HistogramError, HistogramShape};
pub use meta::{Catalog, FileMeta};
pub use types::{Entry, EntryContext, Field, FieldSink, PartKind, SourceFile, ValueKind, TS_FORMAT};
