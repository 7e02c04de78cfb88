//! Graph data feed: per-name, time-ordered series of integer observations.
//!
//! A [`GraphData`] is built either live from NAME × INT fields or after the
//! fact from emitted lines, and several of them can be folded together.
//! Merging concatenates each name's series and re-sorts it by timestamp
//! with a stable sort. Merging the same batch twice keeps both copies.

use crate::types::{Field, PartKind, ValueKind, TS_FORMAT};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEntry {
    pub ts: NaiveDateTime,
    pub level: String,
    pub source: String,
    pub offset_byte: u64,
    pub offset_line: u64,
    pub module: String,
    pub path: Vec<String>,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphData {
    pub rev: u64,
    pub data: BTreeMap<String, Vec<GraphEntry>>,
}

impl GraphData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field if it is a NAME × INT observation; other fields are
    /// ignored. Series stay in arrival order until [`GraphData::sort`].
    pub fn record(&mut self, field: &Field) {
        if field.part != PartKind::Name || field.kind != ValueKind::Int {
            return;
        }
        let ctx = &field.context;
        self.data
            .entry(field.name.clone())
            .or_default()
            .push(GraphEntry {
                ts: ctx.ts,
                level: ctx.level.clone(),
                source: ctx.source.to_string(),
                offset_byte: ctx.offset_byte,
                offset_line: ctx.offset_line,
                module: ctx.module.clone(),
                path: field.path.clone(),
                value: field.value.clone(),
            });
    }

    /// Stable sort of every series by timestamp.
    pub fn sort(&mut self) {
        for series in self.data.values_mut() {
            series.sort_by_key(|e| e.ts);
        }
    }

    pub fn merge(&mut self, incoming: &GraphData) {
        for (name, entries) in &incoming.data {
            let series = self.data.entry(name.clone()).or_default();
            series.extend(entries.iter().cloned());
            series.sort_by_key(|e| e.ts);
        }
        self.rev = self.rev.max(incoming.rev) + 1;
    }

    /// Number of observations across all names.
    pub fn len(&self) -> usize {
        self.data.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.data.values().all(Vec::is_empty)
    }

    /// Rebuild graph data from previously emitted field lines. Lines that are
    /// not NAME × INT fields are skipped.
    pub fn from_emitted_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut graph = GraphData::new();
        for (name, entry) in lines.into_iter().filter_map(parse_emitted_line) {
            graph.data.entry(name).or_default().push(entry);
        }
        graph.sort();
        graph
    }
}

/// Parse one emitted line of the form
/// `  <ts> <level> <source> <byte>:<line> [NAME ]<module> [<path…>] <name> = INT <value>`.
///
/// Path segments that themselves contain spaces cannot be told apart from
/// separate segments and come back split.
pub fn parse_emitted_line(line: &str) -> Option<(String, GraphEntry)> {
    let body = line.strip_prefix("  ")?;
    let parts: Vec<&str> = body.split_whitespace().collect();
    let n = parts.len();
    if n < 8 || parts[n - 2] != "INT" || parts[n - 3] != "=" {
        return None;
    }

    let ts = NaiveDateTime::parse_from_str(parts[0], TS_FORMAT).ok()?;
    let (offset_byte, offset_line) = parts[3].split_once(':')?;
    let mut module_at = 4;
    if parts[module_at] == PartKind::Name.to_string() {
        module_at += 1;
    }
    let path_end = n - 4;
    if module_at >= path_end {
        return None;
    }

    let path_text = parts[module_at + 1..path_end].join(" ");
    let path_text = path_text.strip_prefix('[')?.strip_suffix(']')?;

    Some((
        parts[n - 4].to_string(),
        GraphEntry {
            ts,
            level: undash(parts[1]),
            source: parts[2].to_string(),
            offset_byte: offset_byte.parse().ok()?,
            offset_line: offset_line.parse().ok()?,
            module: undash(parts[module_at]),
            path: path_text.split_whitespace().map(str::to_string).collect(),
            value: parts[n - 1].to_string(),
        },
    ))
}

/// Emitted lines print an empty module or level as `-`.
fn undash(column: &str) -> String {
    if column == "-" {
        String::new()
    } else {
        column.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
