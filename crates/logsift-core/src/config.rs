//! Configuration types for logsift.
//!
//! [`Config::load`] layers, from lowest to highest precedence: the built-in
//! defaults below, `~/.config/logsift/config.toml` (if present), an explicit
//! file given on the command line, and `LOGSIFT__*` environment variables
//! (for example `LOGSIFT__PIPELINE__WORKERS=8`). [`Config::defaults`] returns
//! the built-in defaults without touching the filesystem (useful in tests).

use crate::dict::DictPolicy;
use crate::error::Error;
use crate::histogram::HistogramShape;
use crate::meta::{Catalog, Cleanser, EntryStart, FileMeta, Prefix};
use crate::types::{PartKind, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[pipeline]
workers     = 0
queue_depth = 0

[extract]
value_types = ["INT", "STRING"]

[dictionary]
exclude_values_for = ["median"]

[histogram]
bins          = 20
first_bin     = 10
growth_factor = 3.0

[emit]
parts = ["NAME"]
types = ["INT"]
orig  = false
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub dictionary: DictionaryConfig,
    #[serde(default)]
    pub histogram: HistogramShape,
    #[serde(default)]
    pub emit: EmitConfig,
    /// Extra or overriding file-meta entries (`[[catalog]]` tables).
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    /// Concurrent file workers; `0` means one per available CPU.
    #[serde(default)]
    pub workers: usize,
    /// Bound of the work queue; `0` means the worker count.
    #[serde(default)]
    pub queue_depth: usize,
}

impl PipelineConfig {
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    pub fn effective_queue_depth(&self) -> usize {
        if self.queue_depth > 0 {
            self.queue_depth
        } else {
            self.effective_workers()
        }
    }
}

/// `[extract]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    /// Token kinds treated as values.
    #[serde(default = "default_value_types")]
    pub value_types: Vec<ValueKind>,
}

fn default_value_types() -> Vec<ValueKind> { ValueKind::ALL.to_vec() }

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            value_types: default_value_types(),
        }
    }
}

/// `[dictionary]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DictionaryConfig {
    #[serde(default = "default_exclude_values_for")]
    pub exclude_values_for: Vec<String>,
}

fn default_exclude_values_for() -> Vec<String> { vec!["median".to_string()] }

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            exclude_values_for: default_exclude_values_for(),
        }
    }
}

/// `[emit]` section: the stdout sink's filter.
#[derive(Debug, Clone, Deserialize)]
pub struct EmitConfig {
    #[serde(default = "default_parts")]
    pub parts: Vec<PartKind>,
    #[serde(default = "default_types")]
    pub types: Vec<ValueKind>,
    /// Echo each entry's raw lines before its fields.
    #[serde(default)]
    pub orig: bool,
}

fn default_parts() -> Vec<PartKind> { vec![PartKind::Name] }
fn default_types() -> Vec<ValueKind> { vec![ValueKind::Int] }

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            parts: default_parts(),
            types: default_types(),
            orig: false,
        }
    }
}

/// One `[[catalog]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub file: String,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub header_lines: usize,
    #[serde(default)]
    pub entry_start: EntryStart,
    #[serde(default)]
    pub prefix: Prefix,
    #[serde(default)]
    pub cleanser: Cleanser,
}

impl CatalogEntry {
    pub fn meta(&self) -> FileMeta {
        FileMeta {
            skip: self.skip,
            header_lines: self.header_lines,
            entry_start: self.entry_start,
            prefix: self.prefix,
            cleanser: self.cleanser,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load the layered configuration. `explicit` must exist when given.
    pub fn load(explicit: Option<&Path>) -> Result<Self, Error> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(config_path().as_path()).required(false));
        if let Some(path) = explicit {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let cfg: Config = builder
            .add_source(
                config::Environment::with_prefix("LOGSIFT")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("extract.value_types")
                    .with_list_parse_key("dictionary.exclude_values_for")
                    .with_list_parse_key("emit.parts")
                    .with_list_parse_key("emit.types")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.histogram.validate()?;
        if self.extract.value_types.is_empty() {
            return Err(Error::InvalidConfig(
                "extract.value_types must name at least one of INT, STRING".into(),
            ));
        }
        if let Some(entry) = self.catalog.iter().find(|e| e.file.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!(
                "catalog entry without a file name: {entry:?}"
            )));
        }
        Ok(())
    }

    pub fn dict_policy(&self) -> DictPolicy {
        DictPolicy {
            shape: self.histogram,
            exclude_values_for: self.dictionary.exclude_values_for.iter().cloned().collect(),
        }
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::with_overrides(self.catalog.iter().map(|e| (e.file.clone(), e.meta())))
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("logsift")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
