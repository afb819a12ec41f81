//! Reverse path: serialize result records back into the wire grammar.
//!
//! Output uses the exact framing the parser accepts ([`ldt::frame_line`]),
//! which is what guarantees the round-trip property: parsing a generated
//! export recovers each result's routing codes and patient name through the
//! normal extractor.

use crate::types::LabResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Software identifier emitted in the header block.
const SOFTWARE_ID: &str = concat!("ldtflow/", env!("CARGO_PKG_VERSION"));

/// Lab metadata emitted in the lab-identification block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabInfo {
    pub name: String,
    pub address: String,
    pub contact: String,
}

/// Synthetic measurement emitted for a test type.
///
/// `LabResult` retains no numeric lab values, so value/unit/reference-range
/// come from a fixed per-test-type table. This is a documented
/// approximation of the export, not authoritative clinical data; a fuller
/// entity would carry a structured value list instead.
struct ProbeValue {
    value: &'static str,
    unit: &'static str,
    reference_range: &'static str,
}

fn probe_value_for(test_type: &str) -> ProbeValue {
    match test_type.to_ascii_uppercase().as_str() {
        "TSH" => ProbeValue {
            value: "1.80",
            unit: "mU/l",
            reference_range: "0.27-4.20",
        },
        "GLUCOSE" => ProbeValue {
            value: "92",
            unit: "mg/dl",
            reference_range: "70-100",
        },
        "HEMOGLOBIN" | "HB" => ProbeValue {
            value: "14.2",
            unit: "g/dl",
            reference_range: "12.0-16.0",
        },
        "CRP" => ProbeValue {
            value: "2.1",
            unit: "mg/l",
            reference_range: "0.0-5.0",
        },
        "CREATININE" => ProbeValue {
            value: "0.9",
            unit: "mg/dl",
            reference_range: "0.5-1.2",
        },
        _ => ProbeValue {
            value: "0.0",
            unit: "",
            reference_range: "",
        },
    }
}

/// Serialize results into one wire-format export.
///
/// Emitted in order: header block (software id, creation date/time,
/// character set), lab-identification block, then per distinct patient
/// (grouped by display name, stable insertion order) a patient block, one
/// request block referencing the group's first result, and one result-test
/// block per result. A short-form end marker closes the export. Access
/// filtering of `results` is the caller's responsibility.
pub fn generate_ldt(results: &[LabResult], lab: &LabInfo) -> String {
    let now = Utc::now();
    let mut lines: Vec<String> = Vec::new();

    // Header block.
    lines.push(ldt::frame_line("8000", "9212", SOFTWARE_ID));
    lines.push(ldt::frame_line(
        "8000",
        "9103",
        &now.format("%Y%m%d").to_string(),
    ));
    lines.push(ldt::frame_line(
        "8000",
        "9218",
        &now.format("%H%M%S").to_string(),
    ));
    lines.push(ldt::frame_line("8000", "9106", "UTF-8"));

    // Lab-identification block.
    lines.push(ldt::frame_line("8220", "8300", &lab.name));
    lines.push(ldt::frame_line("8220", "8321", &lab.address));
    lines.push(ldt::frame_line("8220", "8322", &lab.contact));

    // Group by patient display name, preserving first-seen order.
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&LabResult>> = HashMap::new();
    for result in results {
        let key = result.patient_display_name.as_str();
        if !groups.contains_key(key) {
            order.push(key);
        }
        groups.entry(key).or_default().push(result);
    }

    for key in &order {
        let group = &groups[key];
        let first = group[0];

        // Patient block.
        let (first_name, last_name) = split_display_name(key);
        lines.push(ldt::frame_line("8200", "3101", last_name));
        if !first_name.is_empty() {
            lines.push(ldt::frame_line("8200", "3102", first_name));
        }

        // Request block, referencing the group's first result.
        lines.push(ldt::frame_line("8201", "8310", &first.id));
        lines.push(ldt::frame_line(
            "8201",
            "8432",
            &first.created_at.format("%Y%m%d").to_string(),
        ));
        if let Some(facility) = &first.facility_code {
            lines.push(ldt::frame_line("0201", "7981", facility));
        }
        if let Some(practitioner) = &first.practitioner_code {
            lines.push(ldt::frame_line("0212", "7733", practitioner));
        }

        // One result-test block per result in the group.
        for result in group {
            let probe = probe_value_for(&result.test_type);
            lines.push(ldt::frame_line("8210", "8410", &result.test_type));
            lines.push(ldt::frame_line("8210", "8420", probe.value));
            if !probe.unit.is_empty() {
                lines.push(ldt::frame_line("8210", "8421", probe.unit));
            }
            if !probe.reference_range.is_empty() {
                lines.push(ldt::frame_line("8210", "8460", probe.reference_range));
            }
            lines.push(ldt::frame_line("8210", "8401", result.status.wire_code()));
        }
    }

    // End marker, short header-only form.
    lines.push(ldt::frame_line("8221", "E", ""));

    debug!(
        results = results.len(),
        patients = order.len(),
        lines = lines.len(),
        "export generated"
    );

    let mut out = lines.join("\r\n");
    out.push_str("\r\n");
    out
}

/// Split a display name ("first last") back into its parts at the final
/// space. A single token is taken as the last name.
fn split_display_name(display_name: &str) -> (&str, &str) {
    match display_name.rsplit_once(' ') {
        Some((first, last)) => (first, last),
        None => ("", display_name),
    }
}
