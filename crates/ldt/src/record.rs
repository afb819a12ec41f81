//! The line-record data model and outbound framing.

use serde::{Deserialize, Serialize};

/// A single structurally valid LDT line record.
///
/// Every record carries the three header fields split out of the raw line plus
/// the sanitized content remainder. Records are immutable once parsed; a line
/// that fails any structural check never becomes a `ParsedRecord` at all.
///
/// # Invariants
///
/// - `length_field` is exactly three ASCII digits
/// - `record_type` is exactly four ASCII digits
/// - `field_id` is four alphanumeric-or-`*` characters in the long form, or a
///   single alphanumeric character in the short header-only form
/// - `content` is sanitized: no `<>"'&`, normalized line endings, bounded
///   length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecord {
    /// The raw line as received, before any sanitization.
    pub raw_line: String,
    /// Three-digit length field from the record header.
    pub length_field: String,
    /// Four-digit record type from the record header.
    pub record_type: String,
    /// Field identifier; four chars in the long form, one in the short form.
    pub field_id: String,
    /// Sanitized content remainder. Empty for short header-only records.
    pub content: String,
}

impl ParsedRecord {
    /// The unsplit remainder after the record type: field id + content.
    ///
    /// Several upstream systems pack a bare numeric value directly after the
    /// record type instead of a proper field id. The heuristic identifier
    /// matchers scan this view in addition to `content` so those deliveries
    /// still yield routing codes.
    pub fn tail(&self) -> String {
        format!("{}{}", self.field_id, self.content)
    }
}

/// Frame one outbound line: 3-digit zero-padded length, record type, field
/// id, content.
///
/// The length field counts the full line plus the trailing CRLF the
/// delivering gateways append, which matches what inbound traffic carries.
/// Lines produced here parse back into an equivalent [`ParsedRecord`], the
/// property the export path relies on.
pub fn frame_line(record_type: &str, field_id: &str, content: &str) -> String {
    let line_len = 3 + record_type.len() + field_id.len() + content.len();
    format!("{:03}{}{}{}", line_len + 2, record_type, field_id, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_line_counts_crlf() {
        // 3 + 4 + 4 + 7 payload chars, plus 2 for CRLF.
        let line = frame_line("8000", "9212", "ldtflow");
        assert_eq!(line, "02080009212ldtflow");
        assert_eq!(&line[0..3], "020");
    }

    #[test]
    fn frame_line_short_end_marker() {
        let line = frame_line("8221", "E", "");
        assert_eq!(line, "0108221E");
        assert_eq!(line.len(), 8);
    }

    #[test]
    fn tail_joins_field_id_and_content() {
        let record = ParsedRecord {
            raw_line: "0180201793860200".into(),
            length_field: "018".into(),
            record_type: "0201".into(),
            field_id: "7938".into(),
            content: "60200".into(),
        };
        assert_eq!(record.tail(), "793860200");
    }
}
