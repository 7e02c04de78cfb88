//! Filtered line sinks and the composite [`SinkSet`] the pipeline writes to.

use crate::format::format_field;
use logsift_core::{Field, FieldSink, GraphData, PartKind, ValueKind};
use std::collections::BTreeSet;
use std::io::{self, Write};

/// `{parts} × {types}` gate of one emitter.
///
/// The type set applies to NAME fields only: FULL, MIDS and ENDS carry text
/// and pass whenever their part is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartFilter {
    parts: BTreeSet<PartKind>,
    types: BTreeSet<ValueKind>,
}

impl PartFilter {
    pub fn new(
        parts: impl IntoIterator<Item = PartKind>,
        types: impl IntoIterator<Item = ValueKind>,
    ) -> Self {
        Self {
            parts: parts.into_iter().collect(),
            types: types.into_iter().collect(),
        }
    }

    pub fn accepts(&self, part: PartKind, kind: ValueKind) -> bool {
        self.parts.contains(&part) && (part != PartKind::Name || self.types.contains(&kind))
    }

    /// Lines carry a part label only when more than one part can appear.
    pub fn labels_parts(&self) -> bool {
        self.parts.len() > 1
    }
}

/// Writes accepted fields, one line each, to a writer.
pub struct Emitter {
    name: String,
    filter: PartFilter,
    writer: Box<dyn Write + Send>,
    lines: u64,
}

impl Emitter {
    pub fn new(name: impl Into<String>, filter: PartFilter, writer: Box<dyn Write + Send>) -> Self {
        Self {
            name: name.into(),
            filter,
            writer,
            lines: 0,
        }
    }

    pub fn stdout(filter: PartFilter) -> Self {
        Self::new("stdout", filter, Box::new(io::stdout()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines_written(&self) -> u64 {
        self.lines
    }
}

impl FieldSink for Emitter {
    fn accepts(&self, part: PartKind, kind: ValueKind) -> bool {
        self.filter.accepts(part, kind)
    }

    fn emit(&mut self, field: &Field) -> io::Result<()> {
        if !self.filter.accepts(field.part, field.kind) {
            return Ok(());
        }
        let line = format_field(field, self.filter.labels_parts());
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }
}

/// Every output of a run: line emitters, the optional raw echo, and the
/// optional graph collector.
#[derive(Default)]
pub struct SinkSet {
    emitters: Vec<Emitter>,
    echo: Option<Box<dyn Write + Send>>,
    graph: Option<GraphData>,
}

impl SinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_emitter(mut self, emitter: Emitter) -> Self {
        self.emitters.push(emitter);
        self
    }

    /// Echo raw entry lines to `writer` before their fields.
    pub fn with_echo(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.echo = Some(writer);
        self
    }

    /// Collect NAME × INT fields into a [`GraphData`].
    pub fn with_graph(mut self) -> Self {
        self.graph = Some(GraphData::new());
        self
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn flush(&mut self) -> io::Result<()> {
        for e in &mut self.emitters {
            e.writer.flush()?;
        }
        if let Some(echo) = self.echo.as_mut() {
            echo.flush()?;
        }
        Ok(())
    }

    /// Take the collected graph data, sorted by timestamp.
    pub fn take_graph(&mut self) -> Option<GraphData> {
        let mut graph = self.graph.take()?;
        graph.sort();
        Some(graph)
    }
}

impl FieldSink for SinkSet {
    fn accepts(&self, part: PartKind, kind: ValueKind) -> bool {
        self.emitters.iter().any(|e| e.accepts(part, kind))
            || (self.graph.is_some() && part == PartKind::Name && kind == ValueKind::Int)
    }

    fn emit(&mut self, field: &Field) -> io::Result<()> {
        for e in &mut self.emitters {
            e.emit(field)?;
        }
        if let Some(graph) = self.graph.as_mut() {
            graph.record(field);
        }
        Ok(())
    }

    fn emit_raw(&mut self, lines: &[String]) -> io::Result<()> {
        let Some(echo) = self.echo.as_mut() else {
            return Ok(());
        };
        for line in lines {
            echo.write_all(line.as_bytes())?;
            echo.write_all(b"\n")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
