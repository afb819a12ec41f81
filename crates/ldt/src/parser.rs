//! Framing detection and per-record parsing.

use crate::config::ParserConfig;
use crate::error::LdtError;
use crate::record::ParsedRecord;
use tracing::debug;

/// JSON wrapper keys probed in order for the embedded LDT text.
const JSON_TEXT_KEYS: [&str; 5] = ["data", "payload", "content", "message", "ldt"];

const WRAP_OPEN: &str = "<column1>";
const WRAP_CLOSE: &str = "</column1>";

/// Minimum line length for any record form.
const MIN_RECORD_LEN: usize = 8;
/// Minimum line length for the long (content-carrying) form.
const LONG_FORM_LEN: usize = 11;

/// Decode a delivery body into the LDT text to parse.
///
/// JSON deliveries embed the wire text under one of a handful of keys
/// ([`JSON_TEXT_KEYS`], probed in order) with newlines escaped. A JSON body
/// carrying none of those keys is handed back verbatim; it will parse to zero
/// valid records and the caller reports that cleanly instead of crashing.
pub fn unwrap_payload(body: &[u8], is_json: bool) -> String {
    let text = String::from_utf8_lossy(body).into_owned();
    if !is_json {
        return text;
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
        return text;
    };
    if let Some(object) = value.as_object() {
        for key in JSON_TEXT_KEYS {
            if let Some(embedded) = object.get(key).and_then(|v| v.as_str()) {
                // Double-escaped newlines survive some gateways' re-encoding.
                return embedded.replace("\\n", "\n");
            }
        }
    }
    text
}

/// Split a message into individual records and parse each one.
///
/// Detects the framing variant first: repeated `<column1>…</column1>`
/// segments, or plain newline-delimited lines. Structurally invalid records
/// are dropped (with a debug log), never fatal; order of the survivors is
/// preserved because the identifier matchers are order-sensitive.
pub fn parse_message(text: &str, cfg: &ParserConfig) -> Vec<ParsedRecord> {
    let segments = split_records(text);
    let mut records = Vec::with_capacity(segments.len());
    for segment in segments {
        match parse_record(&segment, cfg) {
            Some(record) => records.push(record),
            None => debug!(line_len = segment.len(), "dropped malformed record"),
        }
    }
    records
}

/// Like [`parse_message`], but empty input and zero-record messages are
/// reported as typed errors for callers that must reject them.
pub fn parse_message_strict(
    text: &str,
    cfg: &ParserConfig,
) -> Result<Vec<ParsedRecord>, LdtError> {
    if text.trim().is_empty() {
        return Err(LdtError::EmptyMessage);
    }
    let records = parse_message(text, cfg);
    if records.is_empty() {
        return Err(LdtError::NoValidRecords);
    }
    Ok(records)
}

/// Split raw text into candidate record lines per the detected framing.
fn split_records(text: &str) -> Vec<String> {
    if text.contains(WRAP_OPEN) {
        split_wrapped(text)
    } else {
        text.lines()
            .map(|line| line.trim_end().to_string())
            .filter(|line| !line.trim().is_empty())
            .collect()
    }
}

/// Wrapped variant: one record per `<column1>…</column1>` segment. An
/// unterminated final segment is taken as-is rather than discarded.
fn split_wrapped(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(WRAP_OPEN) {
        rest = &rest[start + WRAP_OPEN.len()..];
        match rest.find(WRAP_CLOSE) {
            Some(end) => {
                segments.push(rest[..end].trim().to_string());
                rest = &rest[end + WRAP_CLOSE.len()..];
            }
            None => {
                segments.push(rest.trim().to_string());
                break;
            }
        }
    }
    segments.retain(|segment| !segment.is_empty());
    segments
}

/// Parse one candidate line into a record, or `None` when any structural
/// check fails.
fn parse_record(line: &str, cfg: &ParserConfig) -> Option<ParsedRecord> {
    if line.len() < MIN_RECORD_LEN {
        return None;
    }

    let length_field = line.get(0..3)?;
    if !is_digits(length_field) {
        return None;
    }
    let record_type = line.get(3..7)?;
    if !is_digits(record_type) {
        return None;
    }
    if cfg.strict_record_types {
        let code: u32 = record_type.parse().ok()?;
        if !(8000..=8599).contains(&code) {
            return None;
        }
    }

    if line.len() >= LONG_FORM_LEN {
        let field_id = line.get(7..11)?;
        if !field_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '*') {
            return None;
        }
        let content = sanitize_content(line.get(11..)?, cfg.max_content_len);
        Some(ParsedRecord {
            raw_line: line.to_string(),
            length_field: length_field.to_string(),
            record_type: record_type.to_string(),
            field_id: field_id.to_string(),
            content,
        })
    } else {
        // Short header-only form: single-character field id, no content.
        let field_id = line.get(7..8)?;
        if !field_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(ParsedRecord {
            raw_line: line.to_string(),
            length_field: length_field.to_string(),
            record_type: record_type.to_string(),
            field_id: field_id.to_string(),
            content: String::new(),
        })
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Strip markup-significant characters, normalize line endings, cap length.
fn sanitize_content(raw: &str, max_len: usize) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let mut cleaned: String = normalized
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\'' | '&'))
        .collect();
    if cleaned.chars().count() > max_len {
        cleaned = cleaned.chars().take(max_len).collect();
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ParserConfig {
        ParserConfig::default()
    }

    #[test]
    fn parses_long_form_line() {
        let records = parse_message("0180201793860200", &cfg());
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.length_field, "018");
        assert_eq!(record.record_type, "0201");
        assert_eq!(record.field_id, "7938");
        assert_eq!(record.content, "60200");
        assert_eq!(record.tail(), "793860200");
    }

    #[test]
    fn parses_short_header_only_form() {
        let records = parse_message("0108221E", &cfg());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_type, "8221");
        assert_eq!(records[0].field_id, "E");
        assert!(records[0].content.is_empty());
    }

    #[test]
    fn drops_undersized_lines() {
        let records = parse_message("0108221E\nxx\n0180212772720053", &cfg());
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn drops_non_numeric_headers() {
        assert!(parse_message("abc8000XF12content", &cfg()).is_empty());
        assert!(parse_message("018x2017938content", &cfg()).is_empty());
    }

    #[test]
    fn drops_bad_field_id() {
        // '<' stripped from content is fine, but not allowed in the field id.
        assert!(parse_message("018020179<8content", &cfg()).is_empty());
    }

    #[test]
    fn strict_range_drops_low_record_types() {
        let strict = ParserConfig {
            strict_record_types: true,
            ..ParserConfig::default()
        };
        assert!(parse_message("0180201793860200", &strict).is_empty());
        assert_eq!(parse_message("01380007981Marburg", &strict).len(), 1);
    }

    #[test]
    fn sanitizes_content() {
        let records = parse_message("02082009999a<b>&\"'c", &cfg());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content, "abc");
    }

    #[test]
    fn caps_content_length() {
        let tight = ParserConfig {
            max_content_len: 4,
            ..ParserConfig::default()
        };
        let line = format!("05082009999{}", "x".repeat(40));
        let records = parse_message(&line, &tight);
        assert_eq!(records[0].content, "xxxx");
    }

    #[test]
    fn wrapped_variant_yields_one_record_per_segment() {
        let text = "<column1>0180201793860200</column1><column1>0180212772720053</column1>";
        let records = parse_message(text, &cfg());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record_type, "0201");
        assert_eq!(records[1].record_type, "0212");
    }

    #[test]
    fn wrapped_variant_tolerates_unterminated_tail() {
        let text = "<column1>0180201793860200</column1><column1>0180212772720053";
        let records = parse_message(text, &cfg());
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let records = parse_message("\n\n0180201793860200\n   \n", &cfg());
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn strict_rejects_empty_and_garbage() {
        assert_eq!(
            parse_message_strict("   \n ", &cfg()),
            Err(LdtError::EmptyMessage)
        );
        assert_eq!(
            parse_message_strict("not ldt at all", &cfg()),
            Err(LdtError::NoValidRecords)
        );
    }

    #[test]
    fn unwraps_json_payload_keys_in_order() {
        let body = br#"{"message":"ignored","data":"0180201793860200\n0180212772720053"}"#;
        let text = unwrap_payload(body, true);
        assert_eq!(text, "0180201793860200\n0180212772720053");
    }

    #[test]
    fn json_without_known_keys_is_opaque() {
        let body = br#"{"something":"else"}"#;
        let text = unwrap_payload(body, true);
        assert_eq!(
            parse_message_strict(&text, &cfg()),
            Err(LdtError::NoValidRecords)
        );
    }

    #[test]
    fn non_json_body_passes_through() {
        let text = unwrap_payload(b"0180201793860200", false);
        assert_eq!(text, "0180201793860200");
    }
}
