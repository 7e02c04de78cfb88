//! Core types for logsift-core.
//!
//! This module defines the data structures shared across all layers: the
//! source [`SourceFile`], the multi-line [`Entry`] produced by the
//! segmenter, the classified [`Field`] produced by the extractor, the
//! [`PartKind`] / [`ValueKind`] discriminants, and the [`FieldSink`] trait
//! through which fields leave the extractor.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Sources and entries
// ---------------------------------------------------------------------------

/// One log file inside a diagnostic bundle directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    /// Directory the file was discovered in.
    pub dir: PathBuf,
    /// Last path component of `dir`, used in labels.
    pub dir_label: String,
    /// File name (the catalog key).
    pub name: String,
}

impl SourceFile {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        let dir = dir.into();
        let dir_label = dir
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.to_string_lossy().into_owned());
        Self {
            dir,
            dir_label,
            name: name.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// `dir_label/name`, the form used in emitted lines and graph records.
    pub fn label(&self) -> String {
        format!("{}/{}", self.dir_label, self.name)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// One logical, possibly multi-line, log record.
///
/// Built incrementally by the segmenter, consumed once by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Raw lines without their line terminators.
    pub lines: Vec<String>,
    /// Byte offset of the first line within the file.
    pub start_offset: u64,
    /// 1-based line number of the first line.
    pub start_line: u64,
    pub source: Arc<SourceFile>,
}

// ---------------------------------------------------------------------------
// Discriminants
// ---------------------------------------------------------------------------

/// Type of a value token recognised by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    #[serde(rename = "INT", alias = "int")]
    Int,
    #[serde(rename = "STRING", alias = "string")]
    String,
}

impl ValueKind {
    pub const ALL: [ValueKind; 2] = [ValueKind::Int, ValueKind::String];
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Int => write!(f, "INT"),
            ValueKind::String => write!(f, "STRING"),
        }
    }
}

impl FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INT" => Ok(ValueKind::Int),
            "STRING" => Ok(ValueKind::String),
            other => Err(format!("unknown value type {other:?} (expected INT or STRING)")),
        }
    }
}

/// Which part of an entry a [`Field`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PartKind {
    /// The whole entry, flattened onto one line.
    #[serde(rename = "FULL")]
    Full,
    /// A `name = value` observation.
    #[serde(rename = "NAME", alias = "VALS")]
    Name,
    /// Text found between two values.
    #[serde(rename = "MIDS", alias = "STRS")]
    Mids,
    /// Text following the last value of a scope.
    #[serde(rename = "ENDS", alias = "TAIL")]
    Ends,
}

impl PartKind {
    pub const ALL: [PartKind; 4] = [PartKind::Full, PartKind::Name, PartKind::Mids, PartKind::Ends];
}

impl std::fmt::Display for PartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartKind::Full => write!(f, "FULL"),
            PartKind::Name => write!(f, "NAME"),
            PartKind::Mids => write!(f, "MIDS"),
            PartKind::Ends => write!(f, "ENDS"),
        }
    }
}

impl FromStr for PartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FULL" => Ok(PartKind::Full),
            "NAME" | "VALS" => Ok(PartKind::Name),
            "MIDS" | "STRS" => Ok(PartKind::Mids),
            "ENDS" | "TAIL" => Ok(PartKind::Ends),
            other => Err(format!("unknown part {other:?} (expected FULL, NAME, MIDS or ENDS)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Timestamp layout used in emitted lines and graph records.
pub const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Per-entry facts shared by every field extracted from that entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryContext {
    pub ts: NaiveDateTime,
    /// Empty when the dialect's prefix has no module capture.
    pub module: String,
    /// Empty when the dialect's prefix has no level capture.
    pub level: String,
    /// `dir/file` label of the source.
    pub source: Arc<str>,
    pub offset_byte: u64,
    pub offset_line: u64,
}

/// One classified observation extracted from an entry. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub context: Arc<EntryContext>,
    pub part: PartKind,
    /// Enclosing scope path, outermost first.
    pub path: Vec<String>,
    /// Empty for FULL, MIDS and ENDS parts.
    pub name: String,
    pub kind: ValueKind,
    /// Value text; STRING literals are stored without their quotes.
    pub value: String,
    /// Whether sinks should render `value` as a quoted string.
    pub quoted: bool,
}

/// Destination for extracted fields.
///
/// `accepts` lets the extractor skip building fields nobody wants; `emit`
/// is only called for accepted combinations. Write failures are I/O class
/// errors and abort the run.
pub trait FieldSink {
    fn accepts(&self, part: PartKind, kind: ValueKind) -> bool;

    fn emit(&mut self, field: &Field) -> std::io::Result<()>;

    /// Raw entry lines, offered before extraction when echoing is enabled.
    fn emit_raw(&mut self, _lines: &[String]) -> std::io::Result<()> {
        Ok(())
    }
}

/// Collects every field; used by tests and small tools.
impl FieldSink for Vec<Field> {
    fn accepts(&self, _part: PartKind, _kind: ValueKind) -> bool {
        true
    }

    fn emit(&mut self, field: &Field) -> std::io::Result<()> {
        self.push(field.clone());
        Ok(())
    }
}

impl<S: FieldSink + ?Sized> FieldSink for Box<S> {
    fn accepts(&self, part: PartKind, kind: ValueKind) -> bool {
        (**self).accepts(part, kind)
    }

    fn emit(&mut self, field: &Field) -> std::io::Result<()> {
        (**self).emit(field)
    }

    fn emit_raw(&mut self, lines: &[String]) -> std::io::Result<()> {
        (**self).emit_raw(lines)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
