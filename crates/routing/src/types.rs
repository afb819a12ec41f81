//! Domain entities for the routing layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One accepted delivery, stored append-only and never mutated.
///
/// The raw bytes live only here; everywhere else (logs included) the message
/// is referenced by its content hash so the audit trail stays free of
/// duplicated payload data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: String,
    pub received_at: DateTime<Utc>,
    pub raw_bytes: Vec<u8>,
    /// Hex-encoded SHA-256 of `raw_bytes`.
    pub content_hash: String,
}

/// Directory entry eligible to receive routed results. Read-only to this
/// pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub email: String,
    /// 9-digit facility code.
    pub facility_code: String,
    /// 7-digit practitioner code.
    pub practitioner_code: String,
    pub role: RecipientRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientRole {
    Physician,
    LabTechnician,
    Admin,
}

/// Result lifecycle status.
///
/// The ingestion path cannot reliably distinguish preliminary results, so
/// new results default to `Final`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Preliminary,
    #[default]
    Final,
}

impl ResultStatus {
    /// Single-letter wire code used by the export path.
    pub fn wire_code(self) -> &'static str {
        match self {
            ResultStatus::Preliminary => "P",
            ResultStatus::Final => "F",
        }
    }
}

/// A routed lab result, the single record created per accepted message.
///
/// `assigned_recipient_id` is set only at creation time from a successful
/// directory lookup and is never cleared automatically; reassignment is an
/// explicit admin action via the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabResult {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Id of the `RawMessage` this result was built from.
    pub source_message_id: String,
    pub facility_code: Option<String>,
    pub practitioner_code: Option<String>,
    pub patient_display_name: String,
    pub test_type: String,
    pub status: ResultStatus,
    pub assigned_recipient_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_final() {
        assert_eq!(ResultStatus::default(), ResultStatus::Final);
        assert_eq!(ResultStatus::Final.wire_code(), "F");
        assert_eq!(ResultStatus::Preliminary.wire_code(), "P");
    }

    #[test]
    fn recipient_role_serde_round_trip() {
        let json = serde_json::to_string(&RecipientRole::LabTechnician).unwrap();
        assert_eq!(json, "\"lab_technician\"");
    }
}
