//! File-meta catalog: how each known log file is segmented, prefix-parsed
//! and normalized before tokenizing.
//!
//! A [`FileMeta`] is plain data. Its behaviour comes from three closed
//! enums ([`EntryStart`], [`Prefix`], [`Cleanser`]) that map onto the
//! dialects found in a cluster diagnostic bundle. The built-in table is a
//! compile-time map keyed by file name; configuration may add entries or
//! override built-in ones through [`Catalog::with_overrides`].

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use phf::phf_map;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Dialect enums
// ---------------------------------------------------------------------------

/// Decides whether a line begins a new entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStart {
    /// Every line is an entry of its own.
    #[default]
    EveryLine,
    /// `[module:level,2016-04-14T16:10:05.262-07:00,...`: starts with `[`
    /// and the second comma-separated part begins with a digit.
    BracketedTimestamp,
    /// The line matches the file's prefix pattern.
    PrefixMatch,
}

/// Shape of the timestamp prefix on an entry's first line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prefix {
    /// `2016-04-14T16:10:09.463447-07:00 WARNING `
    #[default]
    IsoLevel,
    /// `ReplicationManager 2016-04-14T16:10:09.652-07:00 [INFO] `
    ModuleIsoLevel,
    /// `[error_logger:info,2016-04-14T16:10:05.262-07:00,`
    Bracketed,
}

/// Text normalization applied to an entry body before tokenizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cleanser {
    #[default]
    None,
    /// Quote UUID-like hex runs.
    QuoteIdents,
    /// Remove newlines so a multi-line entry scans as one line.
    JoinLines,
    /// Erlang term output: stray `]`, banners, pids, node names, timestamps
    /// and hex idents.
    Erlang,
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

// `\d` would match any Unicode digit; timestamps are ASCII only.
const YMD: &str = r"(?P<year>[0-9]{4})-(?P<month>[0-9]{2})-(?P<day>[0-9]{2})";
const HMS: &str =
    r"T(?P<hour>[0-9]{2}):(?P<minute>[0-9]{2}):(?P<second>[0-9]{2})\.(?P<fraction>[0-9]+)";

static ISO_LEVEL_RE: Lazy<Regex> = Lazy::new(|| compile(&format!(r"^{YMD}{HMS}[-+Z]\S*\s(?P<level>\S+)\s")));

static MODULE_ISO_LEVEL_RE: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"^(?P<module>\w+)\s{YMD}{HMS}[-+Z]\S*\s(?P<level>\S+)\s")));

static BRACKETED_RE: Lazy<Regex> =
    Lazy::new(|| compile(&format!(r"^\[(?P<module>\w+):(?P<level>\w+),{YMD}{HMS}[-+Z][^,]*,")));

static YMD_HMS_RE: Lazy<Regex> = Lazy::new(|| compile(&format!("{YMD}{HMS}")));
static IDENT_RE: Lazy<Regex> = Lazy::new(|| compile(r"(\w[a-z0\-_:]+)?[a-f0-9]{6,}-[a-f0-9]{6,}"));
static EQUALS_BAR_RE: Lazy<Regex> = Lazy::new(|| compile(r"=======+([^=]+)=======+"));
static PID_RE: Lazy<Regex> = Lazy::new(|| compile(r"<\d+\.\d+\.\d+>"));
static NODE_RE: Lazy<Regex> = Lazy::new(|| compile(r"ns_\d+@\d+\.\d+\.\d+\.\d+"));

// Patterns are constants, see `all_patterns_compile`.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern must compile")
}

// ---------------------------------------------------------------------------
// FileMeta
// ---------------------------------------------------------------------------

/// Per-file-type parsing rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct FileMeta {
    /// Recognised but deliberately not processed.
    #[serde(default)]
    pub skip: bool,
    /// Lines discarded at the top of the file.
    #[serde(default)]
    pub header_lines: usize,
    #[serde(default)]
    pub entry_start: EntryStart,
    #[serde(default)]
    pub prefix: Prefix,
    #[serde(default)]
    pub cleanser: Cleanser,
}

/// Result of matching a [`Prefix`] against an entry's first line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatch {
    pub ts: NaiveDateTime,
    pub module: String,
    pub level: String,
    /// Byte length of the matched prefix.
    pub end: usize,
}

impl FileMeta {
    pub fn matches_entry_start(&self, line: &str) -> bool {
        match self.entry_start {
            EntryStart::EveryLine => true,
            EntryStart::PrefixMatch => self.prefix_re().is_match(line),
            EntryStart::BracketedTimestamp => {
                if !line.starts_with('[') {
                    return false;
                }
                let mut parts = line.split(',');
                let second = parts.nth(1);
                let has_third = parts.next().is_some();
                has_third && second.is_some_and(|p| p.starts_with(|c: char| c.is_ascii_digit()))
            }
        }
    }

    /// Match the prefix on `line`. `None` when it does not match or the
    /// captured date is not a real calendar date.
    pub fn parse_prefix(&self, line: &str) -> Option<PrefixMatch> {
        let caps = self.prefix_re().captures(line)?;
        let ts = timestamp(&caps)?;
        let group = |name: &str| caps.name(name).map_or(String::new(), |m| m.as_str().to_string());
        Some(PrefixMatch {
            ts,
            module: group("module"),
            level: group("level"),
            end: caps.get(0)?.end(),
        })
    }

    pub fn cleanse(&self, body: String) -> String {
        match self.cleanser {
            Cleanser::None => body,
            Cleanser::JoinLines => body.replace('\n', ""),
            Cleanser::QuoteIdents => quote_all(&IDENT_RE, body),
            Cleanser::Erlang => {
                let body = blank_stray_close(body);
                let body = EQUALS_BAR_RE.replace_all(&body, "\"${1}\"").into_owned();
                let body = quote_all(&PID_RE, body);
                let body = quote_all(&NODE_RE, body);
                let body = quote_all(&YMD_HMS_RE, body);
                quote_all(&IDENT_RE, body)
            }
        }
    }

    fn prefix_re(&self) -> &'static Regex {
        match self.prefix {
            Prefix::IsoLevel => &ISO_LEVEL_RE,
            Prefix::ModuleIsoLevel => &MODULE_ISO_LEVEL_RE,
            Prefix::Bracketed => &BRACKETED_RE,
        }
    }
}

fn timestamp(caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let num = |name: &str| caps.name(name)?.as_str().parse::<u32>().ok();
    let year = caps.name("year")?.as_str().parse::<i32>().ok()?;
    // Nanosecond precision: pad or truncate the fraction to 9 digits.
    let fraction = caps.name("fraction")?.as_str();
    let nanos = format!("{:0<9}", fraction.get(..9).unwrap_or(fraction))
        .parse::<u32>()
        .ok()?;
    NaiveDate::from_ymd_opt(year, num("month")?, num("day")?)?.and_hms_nano_opt(
        num("hour")?,
        num("minute")?,
        num("second")?,
        nanos,
    )
}

fn quote_all(re: &Regex, body: String) -> String {
    if !re.is_match(&body) {
        return body;
    }
    re.replace_all(&body, "\"${0}\"").into_owned()
}

/// Erlang reports often open with a `]` closing a bracket that lived in the
/// stripped prefix. Blank it so it does not pop a scope.
fn blank_stray_close(mut body: String) -> String {
    if let Some(close) = body.find(']') {
        if body.find('[').map_or(true, |open| close < open) {
            body.replace_range(close..close + 1, " ");
        }
    }
    body
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

const ERLANG: FileMeta = FileMeta {
    skip: false,
    header_lines: 4,
    entry_start: EntryStart::BracketedTimestamp,
    prefix: Prefix::Bracketed,
    cleanser: Cleanser::Erlang,
};

const SKIPPED: FileMeta = FileMeta {
    skip: true,
    header_lines: 4,
    entry_start: EntryStart::EveryLine,
    prefix: Prefix::IsoLevel,
    cleanser: Cleanser::None,
};

static BUILTIN: phf::Map<&'static str, FileMeta> = phf_map! {
    "memcached.log" => FileMeta {
        skip: false,
        header_lines: 4,
        entry_start: EntryStart::EveryLine,
        prefix: Prefix::IsoLevel,
        cleanser: Cleanser::QuoteIdents,
    },
    "ns_server.babysitter.log" => ERLANG,
    "ns_server.couchdb.log" => ERLANG,
    "ns_server.error.log" => ERLANG,
    "ns_server.fts.log" => FileMeta {
        skip: false,
        header_lines: 4,
        entry_start: EntryStart::PrefixMatch,
        prefix: Prefix::IsoLevel,
        cleanser: Cleanser::JoinLines,
    },
    "ns_server.goxdcr.log" => FileMeta {
        skip: false,
        header_lines: 4,
        entry_start: EntryStart::EveryLine,
        prefix: Prefix::ModuleIsoLevel,
        cleanser: Cleanser::None,
    },
    "ns_server.http_access.log" => SKIPPED,
    "ns_server.http_access_internal.log" => SKIPPED,
    "ns_server.info.log" => ERLANG,
    "ns_server.metakv.log" => ERLANG,
    "ns_server.ns_couchdb.log" => ERLANG,
    "ns_server.projector.log" => FileMeta {
        skip: false,
        header_lines: 4,
        entry_start: EntryStart::EveryLine,
        prefix: Prefix::IsoLevel,
        cleanser: Cleanser::None,
    },
    "ns_server.reports.log" => ERLANG,
    "ns_server.ssl_proxy.log" => ERLANG,
    "ns_server.stats.log" => ERLANG,
    "ns_server.xdcr.log" => ERLANG,
};

/// File name → [`FileMeta`] lookup: configured overrides first, then the
/// built-in table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    overrides: HashMap<String, FileMeta>,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn with_overrides(entries: impl IntoIterator<Item = (String, FileMeta)>) -> Self {
        Self {
            overrides: entries.into_iter().collect(),
        }
    }

    /// `None` means the file is unknown; callers also skip `skip = true`.
    pub fn lookup(&self, file_name: &str) -> Option<FileMeta> {
        self.overrides
            .get(file_name)
            .or_else(|| BUILTIN.get(file_name))
            .copied()
    }

    pub fn builtin_names() -> impl Iterator<Item = &'static str> {
        BUILTIN.keys().copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
