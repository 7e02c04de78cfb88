//! Static log corpora used across harnesses.
//!
//! Every catalogued dialect skips a four-line header, so each `*_FILE`
//! corpus starts with [`HEADER`].

use fake::faker::lorem::en::Word;
use fake::Fake;

/// Four header lines as written at the top of each bundle log file.
pub const HEADER: &[&str] = &[
    "logs_node (memcached):",
    "cbbrowse_logs memcached.log",
    "==============================================================================",
    "",
];

/// memcached.log body lines, one entry per line.
pub const MEMCACHED_ENTRIES: &[&str] = &[
    "2016-04-14T16:10:09.463447-07:00 WARNING conn_count=5",
    "2016-04-14T16:10:10.000100-07:00 NOTICE connections = 42, active = 7 reserved = 3",
    "2016-04-14T16:10:11.250000-07:00 NOTICE bucket 7c3e2c1f-4a5b6c7d state = \"warming up\"",
    "2016-04-14T16:10:12.000000-07:00 WARNING Slow operation took 12 ms, then idle for 3 seconds.",
];

/// ns_server.info.log lines: three entries, the second spanning three lines.
pub const NS_SERVER_INFO_ENTRIES: &[&str] = &[
    "[ns_server:info,2016-04-14T16:10:09.463-07:00,ns_1@127.0.0.1:<0.66.0>:ns_config:load:123]Loading config vbuckets = 1024",
    "[ns_server:debug,2016-04-14T16:10:10.100-07:00,ns_1@127.0.0.1:<0.71.0>:ns_heart:grab:88]heartbeat",
    "  [{active_buckets, 2},",
    "   {memory_total, 8192}]",
    "[ns_server:info,2016-04-14T16:10:11.900-07:00,ns_1@127.0.0.1:<0.80.0>:menelaus:handle:12]=========================CRASH REPORT=========================",
];

/// ns_server.goxdcr.log lines with a leading module column.
pub const GOXDCR_ENTRIES: &[&str] = &[
    "ReplicationManager 2016-04-14T16:10:09.463-07:00 INFO GOXDCR.ReplMgr: pipeline {docs_written 10 docs_failed 0}",
    "ReplicationManager 2016-04-14T16:10:19.463-07:00 INFO GOXDCR.ReplMgr: pipeline {docs_written 25 docs_failed 1}",
];

/// `HEADER` followed by `entries`, ready for [`crate::common::BundleBuilder::file`].
pub fn with_header(entries: &[&str]) -> Vec<String> {
    HEADER
        .iter()
        .chain(entries.iter())
        .map(|s| s.to_string())
        .collect()
}

/// `n` memcached entries with synthetic prose between numeric fields.
///
/// Each entry records `ops` and `latency_us` exactly once, so tests can
/// assert counts without caring about the generated words.
pub fn memcached_lines(n: usize) -> Vec<String> {
    let mut lines = with_header(&[]);
    for i in 0..n {
        let word: String = Word().fake();
        let ops: u32 = (0..50_000).fake();
        lines.push(format!(
            "2016-04-14T16:{:02}:{:02}.{:06}-07:00 NOTICE {} ops={} latency_us={}",
            (i / 60) % 60,
            i % 60,
            i,
            // Keep the prose to letters so it cannot turn into a value.
            word.replace(|c: char| !c.is_ascii_alphabetic(), "x"),
            ops,
            i * 7,
        ));
    }
    lines
}
