//! Domain-specific assertion macros for logsift harnesses.
//!
//! These wrap `pretty_assertions` and print the fields or dictionary names
//! that were actually produced when an expectation fails.

use logsift_core::{Field, PartKind};

// ---------------------------------------------------------------------------
// Field assertions
// ---------------------------------------------------------------------------

/// `(path, name, value)` of every NAME field, in emission order.
pub fn name_fields(fields: &[Field]) -> Vec<(Vec<String>, String, String)> {
    fields
        .iter()
        .filter(|f| f.part == PartKind::Name)
        .map(|f| (f.path.clone(), f.name.clone(), f.value.clone()))
        .collect()
}

/// Values of every field of `part`, in emission order.
pub fn part_values(fields: &[Field], part: PartKind) -> Vec<String> {
    fields
        .iter()
        .filter(|f| f.part == part)
        .map(|f| f.value.clone())
        .collect()
}

/// Assert that a NAME field with the given path, name and value was emitted.
///
/// ```rust
/// assert_name_field!(fields, ["pipeline"], "docs_written", "10");
/// ```
#[macro_export]
macro_rules! assert_name_field {
    ($fields:expr, [$($seg:expr),* $(,)?], $name:expr, $value:expr) => {{
        let fields: &[logsift_core::Field] = &$fields;
        let path: Vec<String> = vec![$($seg.to_string()),*];
        let name: &str = $name;
        let value: &str = $value;
        let found = fields.iter().any(|f| {
            f.part == logsift_core::PartKind::Name
                && f.path == path
                && f.name == name
                && f.value == value
        });
        if !found {
            panic!(
                "assert_name_field! failed: {:?} {} = {:?} not emitted.\n  NAME fields: {:#?}",
                path,
                name,
                value,
                $crate::common::name_fields(fields)
            );
        }
    }};
}

/// Assert that no NAME field with this name was emitted.
#[macro_export]
macro_rules! assert_no_name_field {
    ($fields:expr, $name:expr) => {{
        let fields: &[logsift_core::Field] = &$fields;
        let name: &str = $name;
        if let Some(f) = fields
            .iter()
            .find(|f| f.part == logsift_core::PartKind::Name && f.name == name)
        {
            panic!("assert_no_name_field! failed: {:?} was emitted as {:?}", name, f);
        }
    }};
}

// ---------------------------------------------------------------------------
// Dictionary assertions
// ---------------------------------------------------------------------------

/// Assert a dictionary entry's kind and `seenCount`.
///
/// ```rust
/// assert_dict_entry!(dict, "conn_count", ValueKind::Int, 1);
/// ```
#[macro_export]
macro_rules! assert_dict_entry {
    ($dict:expr, $name:expr, $kind:expr, $seen:expr) => {{
        let dict: &logsift_core::Dict = &$dict;
        let name: &str = $name;
        match dict.get(name) {
            Some(entry) => {
                pretty_assertions::assert_eq!(entry.kind, $kind, "kind of {:?}", name);
                pretty_assertions::assert_eq!(entry.seen_count, $seen, "seenCount of {:?}", name);
            }
            None => panic!(
                "assert_dict_entry! failed: {:?} not in dictionary.\n  Names: {:?}",
                name,
                dict.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>()
            ),
        }
    }};
}

/// Assert that every INT entry's histogram holds exactly the values that
/// were parseable and non-negative.
#[macro_export]
macro_rules! assert_histograms_consistent {
    ($dict:expr) => {{
        let dict: &logsift_core::Dict = &$dict;
        for (name, entry) in dict.iter() {
            if entry.kind != logsift_core::ValueKind::Int {
                continue;
            }
            let sum: u64 = entry
                .histogram
                .as_ref()
                .map_or(0, |h| h.counts().iter().sum());
            pretty_assertions::assert_eq!(
                sum,
                entry.histogram_total(),
                "bucket counts of {:?} disagree with its total",
                name
            );
            assert!(
                sum <= entry.seen_count,
                "{:?}: histogram holds {} values but only {} were seen",
                name,
                sum,
                entry.seen_count
            );
        }
    }};
}
