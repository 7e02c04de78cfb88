//! Statistics dictionary: per field-name counts, string value frequencies
//! and numeric histograms.
//!
//! One [`Dict`] is built per file by the worker that owns the file, then
//! folded into the run's global dictionary with [`Dict::merge_into`]. Counts,
//! frequency tables and histograms merge commutatively and associatively.
//! When two sides disagree on a name's kind the result is always
//! [`ValueKind::String`], so the final kind does not depend on merge order.

use crate::histogram::{Histogram, HistogramError, HistogramShape};
use crate::types::ValueKind;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Run-wide recording rules shared by every dictionary of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct DictPolicy {
    pub shape: HistogramShape,
    /// Names whose string values are too high-cardinality to tabulate.
    pub exclude_values_for: BTreeSet<String>,
}

impl Default for DictPolicy {
    fn default() -> Self {
        Self {
            shape: HistogramShape::default(),
            exclude_values_for: ["median".to_string()].into_iter().collect(),
        }
    }
}

/// Aggregate for one field name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DictEntry {
    pub kind: ValueKind,
    pub seen_count: u64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub value_frequencies: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Histogram>,
    pub numeric_total: u64,
}

impl DictEntry {
    fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            seen_count: 0,
            value_frequencies: BTreeMap::new(),
            histogram: None,
            numeric_total: 0,
        }
    }

    /// Sum of histogram bucket counts, zero when no value was recorded.
    pub fn histogram_total(&self) -> u64 {
        self.histogram.as_ref().map_or(0, Histogram::total_count)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dict {
    entries: BTreeMap<String, DictEntry>,
    policy: Arc<DictPolicy>,
}

impl Dict {
    pub fn new(policy: Arc<DictPolicy>) -> Self {
        Self {
            entries: BTreeMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &Arc<DictPolicy> {
        &self.policy
    }

    /// Record one observation of `name`.
    ///
    /// INT values that do not parse as `i64`, or are negative, still count
    /// towards `seen_count` but never reach the histogram or the total.
    pub fn record(&mut self, kind: ValueKind, name: &str, raw: &str) {
        let entry = self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| DictEntry::new(kind));
        entry.seen_count += 1;
        if entry.kind != kind && entry.kind != ValueKind::String {
            debug!(name, "kind conflict, promoting to STRING");
            entry.kind = ValueKind::String;
        }

        match kind {
            ValueKind::String => {
                if !self.policy.exclude_values_for.contains(name) {
                    *entry.value_frequencies.entry(raw.to_string()).or_insert(0) += 1;
                }
            }
            ValueKind::Int => {
                let Some(v) = raw.parse::<i64>().ok().and_then(|v| u64::try_from(v).ok()) else {
                    return;
                };
                let shape = self.policy.shape;
                entry
                    .histogram
                    .get_or_insert_with(|| Histogram::new(shape))
                    .add(v);
                entry.numeric_total = entry.numeric_total.saturating_add(v);
            }
        }
    }

    /// Fold every entry of `self` into `dst`.
    ///
    /// Fails when the two policies use different histogram shapes, which
    /// means the dictionaries came from differently configured runs. The
    /// check runs before any entry moves, so `dst` is left untouched.
    pub fn merge_into(&self, dst: &mut Dict) -> Result<(), HistogramError> {
        if !self.policy.shape.same_as(&dst.policy.shape) {
            return Err(HistogramError::ShapeMismatch {
                left: dst.policy.shape,
                right: self.policy.shape,
            });
        }
        for (name, src) in &self.entries {
            let Some(dst_entry) = dst.entries.get_mut(name) else {
                dst.entries.insert(name.clone(), src.clone());
                continue;
            };
            if dst_entry.kind != src.kind {
                debug!(name = %name, "kind conflict on merge, promoting to STRING");
                dst_entry.kind = ValueKind::String;
            }
            dst_entry.seen_count += src.seen_count;
            for (value, count) in &src.value_frequencies {
                *dst_entry.value_frequencies.entry(value.clone()).or_insert(0) += count;
            }
            match (&mut dst_entry.histogram, &src.histogram) {
                (Some(d), Some(s)) => d.merge(s)?,
                (d @ None, Some(s)) => *d = Some(s.clone()),
                (_, None) => {}
            }
            dst_entry.numeric_total = dst_entry.numeric_total.saturating_add(src.numeric_total);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DictEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DictEntry)> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &BTreeMap<String, DictEntry> {
        &self.entries
    }

    pub fn snapshot(
        &self,
        min_timestamp: Option<NaiveDateTime>,
        max_timestamp: Option<NaiveDateTime>,
    ) -> DictSnapshot<'_> {
        DictSnapshot {
            min_timestamp,
            max_timestamp,
            dictionary: &self.entries,
        }
    }
}

/// Persisted form of the global dictionary, consumed by the web layer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DictSnapshot<'a> {
    pub min_timestamp: Option<NaiveDateTime>,
    pub max_timestamp: Option<NaiveDateTime>,
    pub dictionary: &'a BTreeMap<String, DictEntry>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
