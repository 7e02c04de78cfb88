//! logsift-feeds: log sources for logsift.
//!
//! [`discover`] turns bundle directories into a list of [`FileJob`]s, and
//! [`EntryReader`] splits one file into multi-line
//! [`logsift_core::Entry`] values according to its
//! [`logsift_core::FileMeta`].

pub mod discover;
pub mod segment;

pub use discover::{discover, Discovery, FileJob, SkipReason, SkippedFile};
pub use segment::EntryReader;

use std::fs::File;
use std::io::BufReader;

/// Open a job's file for segmenting.
pub fn open(job: &FileJob) -> Result<EntryReader<BufReader<File>>, logsift_core::Error> {
    let path = job.source.path();
    let file = File::open(&path).map_err(|e| logsift_core::Error::io(&path, e))?;
    Ok(EntryReader::new(
        BufReader::with_capacity(64 * 1024, file),
        job.meta,
        std::sync::Arc::clone(&job.source),
    ))
}
