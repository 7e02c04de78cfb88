//! Run-wide progress: file and entry counts, byte progress per file, and the
//! observed timestamp range.
//!
//! Workers never touch a [`RunSummary`] directly; each finished file hands a
//! [`FileOutcome`] to the pipeline's merge step.

use chrono::NaiveDateTime;
use logsift_core::{Dict, SourceFile};
use logsift_feeds::Discovery;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything one worker produced for one file.
#[derive(Debug)]
pub struct FileOutcome {
    pub source: Arc<SourceFile>,
    pub dict: Dict,
    pub entries: u64,
    pub dropped: u64,
    pub bytes: u64,
    pub min_ts: Option<NaiveDateTime>,
    pub max_ts: Option<NaiveDateTime>,
}

impl FileOutcome {
    pub fn new(source: Arc<SourceFile>, dict: Dict) -> Self {
        Self {
            source,
            dict,
            entries: 0,
            dropped: 0,
            bytes: 0,
            min_ts: None,
            max_ts: None,
        }
    }

    pub fn observe(&mut self, ts: NaiveDateTime) {
        self.min_ts = Some(self.min_ts.map_or(ts, |m| m.min(ts)));
        self.max_ts = Some(self.max_ts.map_or(ts, |m| m.max(ts)));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProgress {
    /// Size at discovery.
    pub size: u64,
    /// Bytes consumed by the segmenter.
    pub processed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub min_timestamp: Option<NaiveDateTime>,
    pub max_timestamp: Option<NaiveDateTime>,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub entries: u64,
    pub entries_dropped: u64,
    pub fields_emitted: u64,
    /// Keyed by `dir/file` label.
    pub files: BTreeMap<String, FileProgress>,
}

impl RunSummary {
    pub fn from_discovery(found: &Discovery) -> Self {
        Self {
            files_skipped: found.skipped.len(),
            files: found
                .jobs
                .iter()
                .map(|j| {
                    (
                        j.source.label(),
                        FileProgress {
                            size: j.size,
                            processed: 0,
                        },
                    )
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn record_file(&mut self, outcome: &FileOutcome) {
        self.files_processed += 1;
        self.entries += outcome.entries;
        self.entries_dropped += outcome.dropped;
        self.files.entry(outcome.source.label()).or_default().processed = outcome.bytes;
        for ts in [outcome.min_ts, outcome.max_ts].into_iter().flatten() {
            self.min_timestamp = Some(self.min_timestamp.map_or(ts, |m| m.min(ts)));
            self.max_timestamp = Some(self.max_timestamp.map_or(ts, |m| m.max(ts)));
        }
    }

    pub fn bytes_total(&self) -> u64 {
        self.files.values().map(|f| f.size).sum()
    }

    pub fn bytes_processed(&self) -> u64 {
        self.files.values().map(|f| f.processed).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
