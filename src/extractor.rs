//! Entry extractor: turns one multi-line log entry into classified fields.
//!
//! The entry's first line must match the file's timestamp prefix, otherwise
//! the entry is dropped without touching the dictionary or the sink. The
//! remaining text is cleansed, tokenized with [`Scanner`], and walked by a
//! [`ScopeWalk`]: brackets open and close scopes, and every INT or STRING
//! token becomes a `name = value` field whose name is the closest preceding
//! identifier or string in the same scope.
//!
//! ```text
//! foo = 1 bar = 2 ( baz = 3 )   →   [] foo = 1, [] bar = 2, [bar] baz = 3
//! ```

use chrono::NaiveDateTime;
use logsift_core::scanner::{Scanner, Token, TokenKind};
use logsift_core::{
    Dict, Entry, EntryContext, Field, FieldSink, FileMeta, PartKind, SourceFile, ValueKind,
};
use std::io;
use std::sync::Arc;
use tracing::trace;

/// Characters trimmed from MIDS/ENDS text runs.
const TEXT_TRIM: &[char] = &['\t', '\n', ' ', '.', ':', ','];

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Per-file extraction settings.
#[derive(Debug, Clone)]
pub struct Extractor {
    meta: FileMeta,
    value_types: ValueTypes,
    source: Arc<str>,
}

impl Extractor {
    pub fn new(meta: FileMeta, value_types: &[ValueKind], source: &SourceFile) -> Self {
        Self {
            meta,
            value_types: ValueTypes::from(value_types),
            source: Arc::from(source.label()),
        }
    }

    /// Extract one entry. Returns the entry's timestamp, or `None` when the
    /// prefix did not match and the entry was dropped.
    pub fn extract(
        &self,
        entry: &Entry,
        dict: &mut Dict,
        sink: &mut dyn FieldSink,
    ) -> io::Result<Option<NaiveDateTime>> {
        sink.emit_raw(&entry.lines)?;

        let Some(first) = entry.lines.first() else {
            return Ok(None);
        };
        let Some(prefix) = self.meta.parse_prefix(first) else {
            trace!(
                file = &*self.source,
                line = entry.start_line,
                "prefix did not match, entry dropped"
            );
            return Ok(None);
        };
        let ts = prefix.ts;
        let ctx = Arc::new(EntryContext {
            ts,
            module: prefix.module,
            level: prefix.level,
            source: Arc::clone(&self.source),
            offset_byte: entry.start_offset,
            offset_line: entry.start_line,
        });
        let body_lines = std::iter::once(&first[prefix.end..])
            .chain(entry.lines[1..].iter().map(String::as_str));

        if sink.accepts(PartKind::Full, ValueKind::String) {
            let joined = body_lines
                .clone()
                .map(str::trim_end)
                .collect::<Vec<_>>()
                .join(" ");
            sink.emit(&Field {
                context: Arc::clone(&ctx),
                part: PartKind::Full,
                path: Vec::new(),
                name: String::new(),
                kind: ValueKind::String,
                value: joined,
                quoted: false,
            })?;
        }

        let mut body = String::with_capacity(entry.lines.iter().map(|l| l.len() + 1).sum());
        for line in body_lines {
            body.push_str(line);
            body.push('\n');
        }
        let body = self.meta.cleanse(body);

        let mut walk = ScopeWalk::new(ctx, self.value_types, dict, sink);
        for tok in Scanner::new(&body) {
            walk.feed(tok)?;
        }
        walk.finish()?;
        Ok(Some(ts))
    }
}

/// Which token kinds count as values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueTypes {
    int: bool,
    string: bool,
}

impl From<&[ValueKind]> for ValueTypes {
    fn from(kinds: &[ValueKind]) -> Self {
        Self {
            int: kinds.contains(&ValueKind::Int),
            string: kinds.contains(&ValueKind::String),
        }
    }
}

impl ValueTypes {
    pub const ALL: ValueTypes = ValueTypes {
        int: true,
        string: true,
    };

    fn classify(self, kind: TokenKind) -> Option<ValueKind> {
        match kind {
            TokenKind::Int if self.int => Some(ValueKind::Int),
            TokenKind::String if self.string => Some(ValueKind::String),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Scope walk
// ---------------------------------------------------------------------------

/// How a token moves the scope machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delta {
    Open,
    Close,
    /// Stays its own pending token.
    Fixed,
    /// May merge with a preceding free token into one text run.
    Free,
    /// Dropped before any other handling.
    Skip,
}

fn delta(tok: &Token<'_>) -> Delta {
    match tok.kind {
        TokenKind::Open(_) => Delta::Open,
        TokenKind::Close(_) => Delta::Close,
        TokenKind::Int
        | TokenKind::Float
        | TokenKind::Char
        | TokenKind::String
        | TokenKind::Colon
        | TokenKind::Comma
        | TokenKind::Period
        | TokenKind::Semicolon => Delta::Fixed,
        TokenKind::Operator => match tok.lit {
            "<<" | ">>" => Delta::Skip,
            "+" | "-" | "*" | "/" => Delta::Fixed,
            _ => Delta::Free,
        },
        TokenKind::Ident | TokenKind::Other => Delta::Free,
    }
}

#[derive(Debug, Clone)]
struct Pending {
    kind: TokenKind,
    lit: String,
    fixed: bool,
    emitted: bool,
}

#[derive(Debug, Default)]
struct Frame {
    pending: Vec<Pending>,
    path: Vec<String>,
}

impl Frame {
    /// Last identifier or string among `pending[..end]`.
    fn name_before(&self, end: usize) -> Option<&str> {
        self.pending[..end]
            .iter()
            .rev()
            .find(|p| matches!(p.kind, TokenKind::Ident | TokenKind::String))
            .map(|p| p.lit.as_str())
    }
}

/// Explicit-stack scope machine over one entry's tokens.
///
/// Frame 0 is the entry's top scope and is never popped, so an excess
/// closing bracket is ignored instead of underflowing.
pub struct ScopeWalk<'a> {
    frames: Vec<Frame>,
    out: Output<'a>,
}

struct Output<'a> {
    ctx: Arc<EntryContext>,
    value_types: ValueTypes,
    dict: &'a mut Dict,
    sink: &'a mut dyn FieldSink,
}

impl<'a> ScopeWalk<'a> {
    pub fn new(
        ctx: Arc<EntryContext>,
        value_types: ValueTypes,
        dict: &'a mut Dict,
        sink: &'a mut dyn FieldSink,
    ) -> Self {
        Self {
            frames: vec![Frame::default()],
            out: Output {
                ctx,
                value_types,
                dict,
                sink,
            },
        }
    }

    /// Nesting depth; `0` at the top scope.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn path(&self) -> &[String] {
        self.frames.last().map(|f| f.path.as_slice()).unwrap_or(&[])
    }

    pub fn feed(&mut self, tok: Token<'_>) -> io::Result<()> {
        match delta(&tok) {
            Delta::Skip => Ok(()),
            Delta::Open => {
                let Some(top) = self.frames.last_mut() else {
                    return Ok(());
                };
                let mut path = top.path.clone();
                let segment = top.name_before(top.pending.len()).map(clean_name);
                if let Some(segment) = segment.filter(|s| !s.is_empty()) {
                    path.push(segment.to_string());
                }
                self.out.flush(top)?;
                self.frames.push(Frame {
                    pending: Vec::new(),
                    path,
                });
                Ok(())
            }
            Delta::Close => {
                if self.frames.len() > 1 {
                    if let Some(mut frame) = self.frames.pop() {
                        self.out.flush(&mut frame)?;
                    }
                }
                Ok(())
            }
            d @ (Delta::Fixed | Delta::Free) => {
                let Some(top) = self.frames.last_mut() else {
                    return Ok(());
                };
                if d == Delta::Free {
                    if let Some(prev) = top.pending.last_mut() {
                        if !prev.emitted && !prev.fixed {
                            prev.lit.push(' ');
                            prev.lit.push_str(tok.lit);
                            return Ok(());
                        }
                    }
                }
                top.pending.push(Pending {
                    kind: tok.kind,
                    lit: tok.lit.to_string(),
                    fixed: d == Delta::Fixed,
                    emitted: false,
                });
                Ok(())
            }
        }
    }

    /// Flush every open scope, innermost first.
    pub fn finish(mut self) -> io::Result<()> {
        while let Some(mut frame) = self.frames.pop() {
            self.out.flush(&mut frame)?;
        }
        Ok(())
    }
}

impl Output<'_> {
    /// Classify the frame's not-yet-emitted pending tokens.
    fn flush(&mut self, frame: &mut Frame) -> io::Result<()> {
        let mut text: Vec<String> = Vec::new();
        for i in 0..frame.pending.len() {
            if frame.pending[i].emitted {
                continue;
            }
            frame.pending[i].emitted = true;

            let Some(kind) = self.value_types.classify(frame.pending[i].kind) else {
                // Automatic semicolons only mark line ends.
                if frame.pending[i].lit != "\n" {
                    text.push(frame.pending[i].lit.clone());
                }
                continue;
            };

            self.emit_text(PartKind::Mids, &frame.path, &text)?;
            text.clear();

            let Some((path, name)) = frame
                .name_before(i)
                .and_then(|raw| resolve_name(raw, &frame.path))
            else {
                continue;
            };
            let (value, quoted) = match kind {
                ValueKind::String => (unquote(&frame.pending[i].lit).to_string(), true),
                ValueKind::Int => (frame.pending[i].lit.clone(), false),
            };
            self.dict.record(kind, &name, &value);
            if self.sink.accepts(PartKind::Name, kind) {
                self.sink.emit(&Field {
                    context: Arc::clone(&self.ctx),
                    part: PartKind::Name,
                    path,
                    name,
                    kind,
                    value,
                    quoted,
                })?;
            }
        }
        self.emit_text(PartKind::Ends, &frame.path, &text)
    }

    fn emit_text(&mut self, part: PartKind, path: &[String], text: &[String]) -> io::Result<()> {
        if text.is_empty() || !self.sink.accepts(part, ValueKind::String) {
            return Ok(());
        }
        let joined = text.join(" ");
        let trimmed = joined.trim_matches(TEXT_TRIM);
        if trimmed.is_empty() {
            return Ok(());
        }
        self.sink.emit(&Field {
            context: Arc::clone(&self.ctx),
            part,
            path: path.to_vec(),
            name: String::new(),
            kind: ValueKind::String,
            value: trimmed.to_string(),
            quoted: true,
        })
    }
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// Trim whitespace, quotes and assignment punctuation around a candidate.
fn clean_name(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '`' | '=' | ':'))
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c: char| c.is_whitespace() || matches!(c, '<' | '>' | '/'))
}

/// Turn a candidate into `(path, name)`.
///
/// At the top scope a multi-word candidate such as `foo bar baz` splits
/// into path `[foo, bar]` and name `baz`. Inside a bracket scope the
/// candidate must already be a single word.
pub fn resolve_name(raw: &str, scope: &[String]) -> Option<(Vec<String>, String)> {
    let cleaned = clean_name(raw);
    let (path, name) = if scope.is_empty() && cleaned.contains(char::is_whitespace) {
        let mut words: Vec<&str> = cleaned.split_whitespace().collect();
        let name = words.pop()?;
        (words.into_iter().map(str::to_string).collect(), name)
    } else {
        (scope.to_vec(), cleaned)
    };
    valid_name(name).then(|| (path, name.to_string()))
}

fn unquote(lit: &str) -> &str {
    let quote = match lit.chars().next() {
        Some(q @ ('"' | '`')) => q,
        _ => return lit,
    };
    let inner = &lit[1..];
    inner.strip_suffix(quote).unwrap_or(inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
