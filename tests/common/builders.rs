//! Test builders: ergonomic constructors for entries, bundles and runs.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use logsift::{Extractor, RunReport};
use logsift_core::{Catalog, Config, Dict, Entry, Field, FileMeta, SourceFile, ValueKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// EntryBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Entry`] fixtures.
///
/// # Example
///
/// ```rust
/// let entry = EntryBuilder::new("memcached.log")
///     .line("2016-04-14T16:10:09.463447-07:00 WARNING conn_count=5")
///     .at(120, 5)
///     .build();
/// ```
pub struct EntryBuilder {
    source: SourceFile,
    lines: Vec<String>,
    start_offset: u64,
    start_line: u64,
}

impl EntryBuilder {
    pub fn new(file_name: &str) -> Self {
        Self {
            source: SourceFile::new("/bundle/n1", file_name),
            lines: Vec::new(),
            start_offset: 0,
            start_line: 1,
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn lines<'a>(mut self, lines: impl IntoIterator<Item = &'a str>) -> Self {
        self.lines.extend(lines.into_iter().map(str::to_string));
        self
    }

    pub fn at(mut self, byte: u64, line: u64) -> Self {
        self.start_offset = byte;
        self.start_line = line;
        self
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn build(self) -> Entry {
        Entry {
            lines: self.lines,
            start_offset: self.start_offset,
            start_line: self.start_line,
            source: Arc::new(self.source),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction helpers
// ---------------------------------------------------------------------------

/// Catalog entry for a built-in file name.
pub fn builtin_meta(file_name: &str) -> FileMeta {
    Catalog::builtin()
        .lookup(file_name)
        .unwrap_or_else(|| panic!("{file_name} is not in the built-in catalog"))
}

/// What one call to [`extract_entry`] produced.
pub struct Extracted {
    pub ts: Option<chrono::NaiveDateTime>,
    pub fields: Vec<Field>,
    pub dict: Dict,
}

/// Run the extractor over one entry with default settings, collecting every
/// part and both value kinds.
pub fn extract_entry(file_name: &str, lines: &[&str]) -> Extracted {
    let builder = EntryBuilder::new(file_name).lines(lines.iter().copied());
    let extractor = Extractor::new(builtin_meta(file_name), &ValueKind::ALL, builder.source());
    let entry = builder.build();
    let mut dict = Dict::new(Arc::new(Config::defaults().dict_policy()));
    let mut fields: Vec<Field> = Vec::new();
    let ts = extractor
        .extract(&entry, &mut dict, &mut fields)
        .expect("extraction into a Vec cannot fail");
    Extracted { ts, fields, dict }
}

// ---------------------------------------------------------------------------
// BundleBuilder
// ---------------------------------------------------------------------------

/// Writes a diagnostic-bundle-like directory tree: one directory per node,
/// each holding log files.
///
/// ```rust
/// let bundle = BundleBuilder::new()
///     .file("n1", "memcached.log", &memcached_lines(10))
///     .file("n2", "memcached.log", &memcached_lines(3))
///     .build();
/// let dirs = bundle.node_dirs();
/// ```
#[derive(Default)]
pub struct BundleBuilder {
    files: Vec<(String, String, String)>,
}

impl BundleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `node/name` with the given lines, each terminated by `\n`.
    pub fn file<S: AsRef<str>>(mut self, node: &str, name: &str, lines: &[S]) -> Self {
        let mut text = String::new();
        for line in lines {
            text.push_str(line.as_ref());
            text.push('\n');
        }
        self.files.push((node.to_string(), name.to_string(), text));
        self
    }

    pub fn build(self) -> Bundle {
        let root = TempDir::new().expect("create temp bundle dir");
        let mut nodes: Vec<PathBuf> = Vec::new();
        for (node, name, text) in self.files {
            let dir = root.path().join(&node);
            std::fs::create_dir_all(&dir).expect("create node dir");
            std::fs::write(dir.join(&name), text).expect("write log file");
            if !nodes.contains(&dir) {
                nodes.push(dir);
            }
        }
        Bundle { root, nodes }
    }
}

/// A written bundle. The directory is removed when this drops.
pub struct Bundle {
    root: TempDir,
    nodes: Vec<PathBuf>,
}

impl Bundle {
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Node directories in insertion order.
    pub fn node_dirs(&self) -> Vec<PathBuf> {
        self.nodes.clone()
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Default configuration with a fixed worker count.
pub fn config_with_workers(workers: usize) -> Config {
    let mut config = Config::defaults();
    config.pipeline.workers = workers;
    config
}

/// `seenCount` per name from a finished run.
pub fn seen_counts<S>(report: &RunReport<S>) -> Vec<(String, u64)> {
    report
        .dict
        .iter()
        .map(|(name, entry)| (name.clone(), entry.seen_count))
        .collect()
}

// ---------------------------------------------------------------------------
// SharedBuf
// ---------------------------------------------------------------------------

/// In-memory writer that can be handed to a sink and read back afterwards.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<std::sync::Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn std::io::Write + Send> {
        Box::new(self.clone())
    }

    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).expect("sink output is UTF-8")
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl std::io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
