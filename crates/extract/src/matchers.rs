//! The fixed, ordered matcher pipeline.

use crate::types::{ExtractedIdentifiers, Patient};
use ldt::ParsedRecord;
use tracing::debug;

/// Expected digit count of a facility code.
pub const FACILITY_CODE_LEN: usize = 9;
/// Expected digit count of a practitioner code.
pub const PRACTITIONER_CODE_LEN: usize = 7;
/// National practitioner numbers: 7-digit id plus 2-digit specialty suffix.
const PRACTITIONER_CODE_FULL_LEN: usize = 9;

/// One step of the extraction pipeline: a named pure function applied to
/// every record in message order.
struct Matcher {
    name: &'static str,
    apply: fn(&ParsedRecord, &mut ExtractedIdentifiers),
}

/// The fixed matcher order. Later matchers overwrite earlier values for the
/// same logical field; only the bare-value fallback (run separately) is
/// fill-if-unset.
const MATCHERS: [Matcher; 4] = [
    Matcher {
        name: "facility_canonical",
        apply: match_facility_record,
    },
    Matcher {
        name: "practitioner_canonical",
        apply: match_practitioner_record,
    },
    Matcher {
        name: "identifier_alternate",
        apply: match_alternate_identifier_record,
    },
    Matcher {
        name: "patient_demographics",
        apply: match_patient_record,
    },
];

/// Run the ordered matcher pipeline over the records of one message.
///
/// Record order matters: within a single matcher the last matching record
/// wins, and across matchers the later matcher wins. The fallback scan runs
/// only when a routing code is still missing afterwards, and never
/// overwrites.
pub fn extract_identifiers(records: &[ParsedRecord]) -> ExtractedIdentifiers {
    let mut out = ExtractedIdentifiers::default();
    for matcher in &MATCHERS {
        for record in records {
            (matcher.apply)(record, &mut out);
        }
        debug!(
            matcher = matcher.name,
            facility = out.facility_code.is_some(),
            practitioner = out.practitioner_code.is_some(),
            "matcher pass complete"
        );
    }
    if out.facility_code.is_none() || out.practitioner_code.is_none() {
        apply_bare_value_fallback(records, &mut out);
    }
    out
}

/// Recover the test designation for result labeling.
///
/// Scans for the test-id/test-name fields of a result-test block; the first
/// non-empty hit wins. Returns `None` when the message carries no test
/// designation at all.
pub fn detect_test_type(records: &[ParsedRecord]) -> Option<String> {
    records
        .iter()
        .filter(|r| matches!(r.field_id.as_str(), "8410" | "8411"))
        .map(|r| r.content.trim())
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

/// Matcher 1: canonical facility record (`0201`/`7981`).
///
/// Some senders pack the code directly after the record type with no field
/// id; when the whole tail is numeric we take the tail as the value.
fn match_facility_record(record: &ParsedRecord, out: &mut ExtractedIdentifiers) {
    if record.record_type != "0201" {
        return;
    }
    if let Some(code) = candidate_value(record, "7981").and_then(|v| normalize_facility(&v)) {
        out.facility_code = Some(code);
    }
}

/// Matcher 2: canonical practitioner record (`0212`/`7733`).
fn match_practitioner_record(record: &ParsedRecord, out: &mut ExtractedIdentifiers) {
    if record.record_type != "0212" {
        return;
    }
    if let Some(code) = candidate_value(record, "7733").and_then(|v| normalize_practitioner(&v)) {
        out.practitioner_code = Some(code);
    }
}

/// Matcher 3: alternate encoding inside `8100` blocks, where the field id
/// carries the identifier role.
fn match_alternate_identifier_record(record: &ParsedRecord, out: &mut ExtractedIdentifiers) {
    if record.record_type != "8100" {
        return;
    }
    match record.field_id.as_str() {
        "0201" | "0020" => {
            if let Some(code) = normalize_facility(&record.content) {
                out.facility_code = Some(code);
            }
        }
        "0202" | "0021" => {
            if let Some(code) = normalize_practitioner(&record.content) {
                out.practitioner_code = Some(code);
            }
        }
        _ => {}
    }
}

/// Matcher 4: patient demographics, both encodings.
///
/// `8200` blocks carry the demographic field in the field id; older feeds
/// emit the demographic field id as the record type itself, with the value
/// spanning the rest of the line.
fn match_patient_record(record: &ParsedRecord, out: &mut ExtractedIdentifiers) {
    let (field, value) = if record.record_type == "8200" {
        (record.field_id.clone(), record.content.clone())
    } else if matches!(
        record.record_type.as_str(),
        "3101" | "3102" | "3103" | "3110"
    ) {
        (record.record_type.clone(), record.tail())
    } else {
        return;
    };

    let value = value.trim().to_string();
    if value.is_empty() {
        return;
    }
    apply_patient_field(&mut out.patient, &field, value);
}

fn apply_patient_field(patient: &mut Patient, field: &str, value: String) {
    match field {
        "3101" => patient.last_name = Some(value),
        "3102" => patient.first_name = Some(value),
        "3103" => patient.birth_date = Some(value),
        "3110" => patient.gender = Some(value),
        _ => {}
    }
}

/// Matcher 5 (fallback): scan remaining record values for bare codes.
///
/// Fill-if-unset only. Any value that is exactly 9 digits becomes the
/// facility code, exactly 7 digits the practitioner code. Both the sanitized
/// content and the unsplit tail are considered, since senders that omit the
/// field id put the code where the field id would be.
fn apply_bare_value_fallback(records: &[ParsedRecord], out: &mut ExtractedIdentifiers) {
    for record in records {
        let tail = record.tail();
        for value in [record.content.trim(), tail.trim()] {
            if out.facility_code.is_none() && is_exact_digits(value, FACILITY_CODE_LEN) {
                debug!(record_type = %record.record_type, "facility code via fallback");
                out.facility_code = Some(value.to_string());
            }
            if out.practitioner_code.is_none() && is_exact_digits(value, PRACTITIONER_CODE_LEN) {
                debug!(record_type = %record.record_type, "practitioner code via fallback");
                out.practitioner_code = Some(value.to_string());
            }
        }
        if out.facility_code.is_some() && out.practitioner_code.is_some() {
            break;
        }
    }
}

/// Value for matchers 1-2: canonical field id yields the content, an
/// all-numeric tail yields the tail, anything else is no candidate.
fn candidate_value(record: &ParsedRecord, canonical_field_id: &str) -> Option<String> {
    if record.field_id == canonical_field_id {
        return Some(record.content.trim().to_string());
    }
    let tail = record.tail();
    let tail = tail.trim();
    if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
        return Some(tail.to_string());
    }
    None
}

fn normalize_facility(value: &str) -> Option<String> {
    let value = value.trim();
    is_exact_digits(value, FACILITY_CODE_LEN).then(|| value.to_string())
}

fn normalize_practitioner(value: &str) -> Option<String> {
    let value = value.trim();
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match value.len() {
        PRACTITIONER_CODE_LEN => Some(value.to_string()),
        PRACTITIONER_CODE_FULL_LEN => Some(value[..PRACTITIONER_CODE_LEN].to_string()),
        _ => None,
    }
}

fn is_exact_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}
