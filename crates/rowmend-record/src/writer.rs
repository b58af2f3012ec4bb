//! Serializer: the inverse of [`crate::load`]
//!
//! Unmodified records come back byte-for-byte; modified fields are quoted
//! when their content requires it.

use crate::record::{Field, LineEnding, RecordSet};

/// Render a record set as CSV text
#[must_use]
pub fn serialize(set: &RecordSet) -> String {
    let mut out = String::new();
    if set.has_bom() {
        out.push('\u{feff}');
    }
    write_row(&mut out, set.header().fields(), set.header().terminator());
    for record in set.records() {
        write_blank_lines(&mut out, record.blank_lines_before());
        write_row(&mut out, record.fields(), record.terminator());
    }
    write_blank_lines(&mut out, set.trailer());
    out
}

fn write_blank_lines(out: &mut String, blanks: &[LineEnding]) {
    for ending in blanks {
        out.push_str(ending.as_str());
    }
}

fn write_row(out: &mut String, fields: &[Field], terminator: LineEnding) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        field.encode_into(out);
    }
    out.push_str(terminator.as_str());
}
