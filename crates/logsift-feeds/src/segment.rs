//! Entry segmenter: splits a log file into multi-line [`Entry`] values.
//!
//! - The first `header_lines` lines are discarded; byte offsets still count them
//! - A line for which the file's entry-start predicate holds closes the
//!   pending entry and opens a new one
//! - Lines before the first entry start belong to no entry and are dropped
//! - The pending entry is flushed at end of file
//!
//! Lines are split on `\n` only and decoded lossily, so offsets are exact
//! byte positions even for files with stray non-UTF-8 bytes.

use logsift_core::{Entry, FileMeta, SourceFile};
use std::io::{self, BufRead};
use std::sync::Arc;

pub struct EntryReader<R> {
    reader: R,
    meta: FileMeta,
    source: Arc<SourceFile>,
    buf: Vec<u8>,
    /// Bytes consumed so far.
    offset: u64,
    /// Number of lines consumed so far.
    line_no: u64,
    pending: Option<Entry>,
    /// Lines seen before any entry start.
    orphans: u64,
    done: bool,
}

impl<R: BufRead> EntryReader<R> {
    pub fn new(reader: R, meta: FileMeta, source: Arc<SourceFile>) -> Self {
        Self {
            reader,
            meta,
            source,
            buf: Vec::with_capacity(256),
            offset: 0,
            line_no: 0,
            pending: None,
            orphans: 0,
            done: false,
        }
    }

    /// Bytes read from the underlying reader so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn lines_read(&self) -> u64 {
        self.line_no
    }

    /// Lines dropped because no entry had started yet.
    pub fn orphan_lines(&self) -> u64 {
        self.orphans
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.offset += n as u64;
        self.line_no += 1;
        let mut line = &self.buf[..];
        if let Some(stripped) = line.strip_suffix(b"\n") {
            line = stripped;
        }
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }
        Ok(Some(String::from_utf8_lossy(line).into_owned()))
    }
}

impl<R: BufRead> Iterator for EntryReader<R> {
    type Item = io::Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let start = self.offset;
            let line = match self.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.done = true;
                    return self.pending.take().map(Ok);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            if self.line_no <= self.meta.header_lines as u64 {
                continue;
            }

            if self.meta.matches_entry_start(&line) {
                let fresh = Entry {
                    lines: vec![line],
                    start_offset: start,
                    start_line: self.line_no,
                    source: Arc::clone(&self.source),
                };
                if let Some(done) = self.pending.replace(fresh) {
                    return Some(Ok(done));
                }
            } else if let Some(entry) = self.pending.as_mut() {
                entry.lines.push(line);
            } else {
                self.orphans += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
