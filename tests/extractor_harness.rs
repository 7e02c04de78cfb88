#![allow(unused)]
//! Entry extractor integration harness.
//!
//! # What this covers
//!
//! - **End-to-end single line**: a memcached entry with a matching prefix
//!   yields exactly one NAME field and one dictionary entry.
//! - **Scope paths**: bracket nesting and top-level multi-word names both
//!   produce the expected `namePath`.
//! - **Name validation**: angle-bracketed process ids are never names.
//! - **Dropped entries**: a prefix miss produces nothing at all.
//! - **Dialects**: erlang reports (multi-line, pid/node quoting, banners),
//!   goxdcr module prefixes, and memcached hex-id quoting.
//! - **Scope depth properties**: balanced input returns to depth 0 with an
//!   empty path; arbitrary input never underflows and tracks a clamped
//!   bracket counter exactly.
//!
//! # Running
//!
//! ```sh
//! cargo test --test extractor_harness
//! ```

mod common;
use chrono::NaiveDate;
use common::*;
use logsift::{Extractor, ScopeWalk, ValueTypes};
use logsift_core::scanner::{Scanner, TokenKind};
use logsift_core::{Dict, DictPolicy, EntryContext, Field, PartKind, ValueKind};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use std::sync::Arc;

fn ctx() -> Arc<EntryContext> {
    Arc::new(EntryContext {
        ts: NaiveDate::from_ymd_opt(2016, 4, 14)
            .unwrap()
            .and_hms_opt(16, 10, 9)
            .unwrap(),
        module: String::new(),
        level: "INFO".into(),
        source: Arc::from("n1/test.log"),
        offset_byte: 0,
        offset_line: 1,
    })
}

// ---------------------------------------------------------------------------
// Single entries
// ---------------------------------------------------------------------------

#[test]
fn single_int_field_end_to_end() {
    let out = extract_entry(
        "memcached.log",
        &["2016-04-14T16:10:09.463447-07:00 WARNING conn_count=5"],
    );

    let expected_ts = NaiveDate::from_ymd_opt(2016, 4, 14)
        .unwrap()
        .and_hms_micro_opt(16, 10, 9, 463_447)
        .unwrap();
    assert_eq!(out.ts, Some(expected_ts));
    assert_eq!(
        name_fields(&out.fields),
        vec![(vec![], "conn_count".to_string(), "5".to_string())]
    );

    let name = out.fields.iter().find(|f| f.part == PartKind::Name).unwrap();
    assert_eq!(name.kind, ValueKind::Int);
    assert!(!name.quoted);
    assert_eq!(name.context.level, "WARNING");
    assert_eq!(name.context.ts, expected_ts);

    assert_dict_entry!(out.dict, "conn_count", ValueKind::Int, 1);
    assert_eq!(out.dict.get("conn_count").unwrap().numeric_total, 5);
    assert_eq!(out.dict.len(), 1);
}

#[test]
fn bracket_scopes_extend_the_path() {
    let out = extract_entry(
        "memcached.log",
        &["2016-04-14T16:10:09.463447-07:00 INFO foo = 1 bar = 2 ( baz = 3 )"],
    );
    assert_eq!(
        name_fields(&out.fields),
        vec![
            (vec![], "foo".to_string(), "1".to_string()),
            (vec![], "bar".to_string(), "2".to_string()),
            (vec!["bar".to_string()], "baz".to_string(), "3".to_string()),
        ]
    );
}

#[rstest]
#[case::quoted_pid("\"<0.66.0>\" 5")]
#[case::pid_assignment("\"<0.66.0>\" = 5")]
#[case::slash("\"a/b\" 5")]
fn invalid_candidates_never_become_names(#[case] body: &str) {
    let line = format!("2016-04-14T16:10:09.463447-07:00 INFO {body}");
    let out = extract_entry("memcached.log", &[line.as_str()]);
    assert!(name_fields(&out.fields).is_empty());
    assert!(out.dict.is_empty());
}

#[test]
fn prefix_miss_drops_the_entry() {
    let out = extract_entry("memcached.log", &["conn_count=5 without any timestamp"]);
    assert_eq!(out.ts, None);
    assert!(out.fields.is_empty());
    assert!(out.dict.is_empty());
}

#[test]
fn impossible_calendar_date_drops_the_entry() {
    let out = extract_entry(
        "memcached.log",
        &["2016-02-31T16:10:09.463447-07:00 INFO conn_count=5"],
    );
    assert_eq!(out.ts, None);
    assert!(out.dict.is_empty());
}

#[test]
fn prose_between_values_becomes_mids_and_ends() {
    let out = extract_entry("memcached.log", &[MEMCACHED_ENTRIES[3]]);
    assert_eq!(
        part_values(&out.fields, PartKind::Mids),
        vec!["Slow operation took".to_string(), "ms , then idle for".to_string()]
    );
    assert_eq!(part_values(&out.fields, PartKind::Ends), vec!["seconds".to_string()]);
    assert_name_field!(out.fields, ["Slow", "operation"], "took", "12");
    assert_name_field!(out.fields, ["then", "idle"], "for", "3");
}

#[test]
fn memcached_hex_ids_stay_whole() {
    let out = extract_entry("memcached.log", &[MEMCACHED_ENTRIES[2]]);
    assert_name_field!(out.fields, [], "bucket", "7c3e2c1f-4a5b6c7d");
    assert_name_field!(out.fields, [], "state", "warming up");
    assert_dict_entry!(out.dict, "state", ValueKind::String, 1);
    assert_eq!(out.dict.get("state").unwrap().value_frequencies["warming up"], 1);
}

#[test]
fn int_only_value_types_ignore_strings() {
    let builder = EntryBuilder::new("memcached.log").line(MEMCACHED_ENTRIES[2]);
    let extractor = Extractor::new(builtin_meta("memcached.log"), &[ValueKind::Int], builder.source());
    let mut dict = Dict::new(Arc::new(DictPolicy::default()));
    let mut fields: Vec<Field> = Vec::new();
    extractor.extract(&builder.build(), &mut dict, &mut fields).unwrap();

    assert!(name_fields(&fields).is_empty());
    assert!(dict.is_empty());
    assert_eq!(part_values(&fields, PartKind::Ends).len(), 1);
}

#[test]
fn full_part_carries_offsets_and_flattened_text() {
    let builder = EntryBuilder::new("memcached.log")
        .line("2016-04-14T16:10:09.463447-07:00 INFO first line  ")
        .line("  second line")
        .at(120, 5);
    let extractor = Extractor::new(builtin_meta("memcached.log"), &ValueKind::ALL, builder.source());
    let mut dict = Dict::default();
    let mut fields: Vec<Field> = Vec::new();
    extractor.extract(&builder.build(), &mut dict, &mut fields).unwrap();

    let full: Vec<&Field> = fields.iter().filter(|f| f.part == PartKind::Full).collect();
    assert_eq!(full.len(), 1);
    assert_eq!(full[0].value, "first line   second line");
    assert_eq!(full[0].context.offset_byte, 120);
    assert_eq!(full[0].context.offset_line, 5);
    assert_eq!(&*full[0].context.source, "n1/memcached.log");
}

// ---------------------------------------------------------------------------
// Dialects
// ---------------------------------------------------------------------------

#[test]
fn erlang_report_quotes_pids_and_nodes() {
    let out = extract_entry("ns_server.info.log", &[NS_SERVER_INFO_ENTRIES[0]]);

    let first = &out.fields[0];
    assert_eq!(first.context.module, "ns_server");
    assert_eq!(first.context.level, "info");

    assert_name_field!(out.fields, [], "load", "123");
    assert_name_field!(out.fields, ["Loading", "config"], "vbuckets", "1024");
    assert!(out
        .fields
        .iter()
        .any(|f| f.value == "<0.66.0>" && f.kind == ValueKind::String && f.quoted));
    assert!(name_fields(&out.fields)
        .iter()
        .all(|(_, name, _)| !name.contains(['<', '>', '/'])));
    assert_dict_entry!(out.dict, "vbuckets", ValueKind::Int, 1);
}

#[test]
fn erlang_multi_line_term_nests_under_the_last_word() {
    let out = extract_entry("ns_server.info.log", &NS_SERVER_INFO_ENTRIES[1..4]);

    assert_name_field!(out.fields, ["heartbeat"], "active_buckets", "2");
    assert_name_field!(out.fields, ["heartbeat"], "memory_total", "8192");
    assert_name_field!(out.fields, [], "grab", "88");

    let full = part_values(&out.fields, PartKind::Full);
    assert_eq!(full.len(), 1);
    assert!(full[0].starts_with("ns_1@127.0.0.1:<0.71.0>:ns_heart:grab:88]heartbeat"));
    assert!(full[0].ends_with("{memory_total, 8192}]"));
}

#[test]
fn erlang_banner_is_one_string() {
    let out = extract_entry("ns_server.info.log", &[NS_SERVER_INFO_ENTRIES[4]]);
    assert!(out
        .fields
        .iter()
        .any(|f| f.part == PartKind::Name && f.value == "CRASH REPORT" && f.quoted));
}

#[test]
fn goxdcr_module_column_and_braces() {
    let out = extract_entry("ns_server.goxdcr.log", &[GOXDCR_ENTRIES[0]]);

    assert_eq!(out.fields[0].context.module, "ReplicationManager");
    assert_eq!(out.fields[0].context.level, "INFO");
    assert_eq!(
        name_fields(&out.fields),
        vec![
            (vec!["pipeline".to_string()], "docs_written".to_string(), "10".to_string()),
            (vec!["pipeline".to_string()], "docs_failed".to_string(), "0".to_string()),
        ]
    );
    assert_eq!(
        part_values(&out.fields, PartKind::Ends),
        vec!["GOXDCR . ReplMgr : pipeline".to_string()]
    );
}

// ---------------------------------------------------------------------------
// Scope depth properties
// ---------------------------------------------------------------------------

fn balanced() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("x = 1".to_string()),
        Just("word".to_string()),
        Just("s = \"v\"".to_string()),
        Just(String::new()),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(|parts| parts.join(" , ")),
            inner.clone().prop_map(|s| format!("a ( {s} )")),
            inner.clone().prop_map(|s| format!("b [ {s} ]")),
            inner.prop_map(|s| format!("c {{ {s} }}")),
        ]
    })
}

proptest! {
    #[test]
    fn balanced_entries_return_to_the_top_scope(src in balanced()) {
        let mut dict = Dict::default();
        let mut fields: Vec<Field> = Vec::new();
        let mut walk = ScopeWalk::new(ctx(), ValueTypes::ALL, &mut dict, &mut fields);
        for tok in Scanner::new(&src) {
            walk.feed(tok).unwrap();
        }
        prop_assert_eq!(walk.depth(), 0);
        prop_assert!(walk.path().is_empty());
        walk.finish().unwrap();
    }

    #[test]
    fn depth_tracks_a_clamped_bracket_counter(src in "[a-z0-9 =(){}\\[\\],.:\n]{0,80}") {
        let mut dict = Dict::default();
        let mut fields: Vec<Field> = Vec::new();
        let mut walk = ScopeWalk::new(ctx(), ValueTypes::ALL, &mut dict, &mut fields);
        let mut expected = 0usize;
        for tok in Scanner::new(&src) {
            match tok.kind {
                TokenKind::Open(_) => expected += 1,
                TokenKind::Close(_) => expected = expected.saturating_sub(1),
                _ => {}
            }
            walk.feed(tok).unwrap();
            prop_assert_eq!(walk.depth(), expected);
        }
        walk.finish().unwrap();
    }
}
