//! Line rendering for emitted fields.
//!
//! ```text
//!   <ts> <level> <dir>/<file> <byte>:<line> [<PART> ]<module> [<path…>] [<name> ]= <TYPE> <value>
//!   <ts> <level> <dir>/<file> <byte>:<line> [FULL ]<module> <joined entry text>
//! ```
//!
//! An empty module or level prints as `-` so every line keeps the same
//! number of leading columns.

use logsift_core::{Field, PartKind, TS_FORMAT};
use std::fmt::Write as _;

pub fn format_field(field: &Field, with_part_label: bool) -> String {
    let ctx = &field.context;
    let mut out = String::with_capacity(96 + field.value.len());
    let _ = write!(
        out,
        "  {} {} {} {}:{} ",
        ctx.ts.format(TS_FORMAT),
        or_dash(&ctx.level),
        ctx.source,
        ctx.offset_byte,
        ctx.offset_line,
    );
    if with_part_label {
        let _ = write!(out, "{} ", field.part);
    }
    out.push_str(or_dash(&ctx.module));

    if field.part == PartKind::Full {
        out.push(' ');
        out.push_str(&field.value);
        return out;
    }

    let _ = write!(out, " [{}] ", field.path.join(" "));
    if !field.name.is_empty() {
        out.push_str(&field.name);
        out.push(' ');
    }
    let _ = write!(out, "= {} ", field.kind);
    if field.quoted {
        let _ = write!(out, "{:?}", field.value);
    } else {
        out.push_str(&field.value);
    }
    out
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
