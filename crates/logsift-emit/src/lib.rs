//! logsift-emit: output sinks for extracted fields.
//!
//! An [`Emitter`] renders the fields its [`PartFilter`] accepts as one text
//! line each. A [`SinkSet`] fans every field out to its emitters and can
//! also echo raw entries and collect a [`logsift_core::GraphData`] feed.

pub mod format;
pub mod sink;

pub use format::format_field;
pub use sink::{Emitter, PartFilter, SinkSet};

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Per-purpose file sinks written under `--out-dir`.
pub const FULL_LOG: &str = "full.log";
pub const INTS_LOG: &str = "ints.log";

/// Create (truncating) `dir/name` and wrap it in an [`Emitter`].
pub fn file_emitter(dir: &Path, name: &str, filter: PartFilter) -> Result<Emitter, logsift_core::Error> {
    let path = dir.join(name);
    let file = File::create(&path).map_err(|e| logsift_core::Error::io(&path, e))?;
    tracing::info!(path = %path.display(), "writing emitter output");
    Ok(Emitter::new(name, filter, Box::new(BufWriter::new(file))))
}
