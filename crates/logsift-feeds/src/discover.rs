//! Bundle directory discovery.
//!
//! Lists each input directory (non-recursively, sorted by name) and pairs
//! every regular file with its catalog entry. Unknown and `skip = true`
//! files are reported as skipped; a directory that cannot be listed is a
//! hard error.

use logsift_core::{Catalog, Error, FileMeta, SourceFile};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// One file selected for processing.
#[derive(Debug, Clone)]
pub struct FileJob {
    pub source: Arc<SourceFile>,
    pub meta: FileMeta,
    /// Size at discovery time.
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No catalog entry for this file name.
    Unknown,
    /// Catalogued with `skip = true`.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub source: SourceFile,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub jobs: Vec<FileJob>,
    pub skipped: Vec<SkippedFile>,
}

impl Discovery {
    pub fn total_bytes(&self) -> u64 {
        self.jobs.iter().map(|j| j.size).sum()
    }
}

pub fn discover<P: AsRef<Path>>(dirs: &[P], catalog: &Catalog) -> Result<Discovery, Error> {
    let mut found = Discovery::default();
    for dir in dirs {
        discover_dir(dir.as_ref(), catalog, &mut found)?;
    }
    info!(
        files = found.jobs.len(),
        skipped = found.skipped.len(),
        bytes = found.total_bytes(),
        "discovery complete"
    );
    Ok(found)
}

fn discover_dir(dir: &Path, catalog: &Catalog, found: &mut Discovery) -> Result<(), Error> {
    let mut names = Vec::new();
    for item in std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let item = item.map_err(|e| Error::io(dir, e))?;
        let path = item.path();
        // Follows symlinks, so a linked log file counts like a regular one.
        let meta = std::fs::metadata(&path).map_err(|e| Error::io(&path, e))?;
        if !meta.is_file() {
            continue;
        }
        names.push((item.file_name().to_string_lossy().into_owned(), meta.len()));
    }
    names.sort();

    for (name, size) in names {
        let source = SourceFile::new(dir, name);
        match catalog.lookup(&source.name) {
            Some(meta) if !meta.skip => {
                debug!(file = %source.label(), size, "queued");
                found.jobs.push(FileJob {
                    source: Arc::new(source),
                    meta,
                    size,
                });
            }
            other => {
                let reason = if other.is_some() {
                    SkipReason::Skipped
                } else {
                    SkipReason::Unknown
                };
                info!(file = %source.label(), ?reason, "skipped");
                found.skipped.push(SkippedFile { source, reason });
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
