//! The result builder: the pipeline's only write.

use crate::directory::RecipientDirectory;
use crate::error::RoutingError;
use crate::repository::ResultRepository;
use crate::types::{LabResult, ResultStatus};
use chrono::Utc;
use extract::{ExtractedIdentifiers, Patient};
use tracing::info;
use uuid::Uuid;

/// Outcome of building one result.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RoutedResult {
    pub result_id: String,
    pub assigned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_recipient_id: Option<String>,
}

/// Assemble and persist the routed result for one accepted message.
///
/// Invokes the recipient directory once, at creation time; a match assigns
/// the result, no match leaves it unassigned for the manual review queue.
/// Failure to recover identifiers is not an error here, by design. Exactly
/// one repository append happens per call.
pub fn build_result(
    identifiers: &ExtractedIdentifiers,
    source_message_id: &str,
    test_type: &str,
    directory: &dyn RecipientDirectory,
    repository: &dyn ResultRepository,
) -> Result<RoutedResult, RoutingError> {
    let recipient = match (&identifiers.facility_code, &identifiers.practitioner_code) {
        (Some(facility), Some(practitioner)) => directory.find_recipient(facility, practitioner),
        _ => None,
    };

    let now = Utc::now();
    let result = LabResult {
        id: Uuid::new_v4().to_string(),
        created_at: now,
        updated_at: now,
        source_message_id: source_message_id.to_string(),
        facility_code: identifiers.facility_code.clone(),
        practitioner_code: identifiers.practitioner_code.clone(),
        patient_display_name: patient_display_name(&identifiers.patient),
        test_type: test_type.to_string(),
        status: ResultStatus::default(),
        assigned_recipient_id: recipient.as_ref().map(|r| r.id.clone()),
    };

    let routed = RoutedResult {
        result_id: result.id.clone(),
        assigned: recipient.is_some(),
        assigned_recipient_id: result.assigned_recipient_id.clone(),
    };

    repository.append(result)?;
    info!(
        result_id = %routed.result_id,
        source_message_id,
        assigned = routed.assigned,
        "result created"
    );
    Ok(routed)
}

/// Display name for a patient: trimmed "first last", or "Unknown Patient"
/// when both parts are missing.
pub fn patient_display_name(patient: &Patient) -> String {
    let name = format!(
        "{} {}",
        patient.first_name.as_deref().unwrap_or(""),
        patient.last_name.as_deref().unwrap_or("")
    );
    let name = name.trim();
    if name.is_empty() {
        "Unknown Patient".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryRecipientDirectory;
    use crate::repository::InMemoryResultRepository;
    use crate::types::{Recipient, RecipientRole};

    fn identifiers(facility: Option<&str>, practitioner: Option<&str>) -> ExtractedIdentifiers {
        ExtractedIdentifiers {
            facility_code: facility.map(str::to_string),
            practitioner_code: practitioner.map(str::to_string),
            patient: Patient::default(),
        }
    }

    fn directory_with(facility: &str, practitioner: &str) -> InMemoryRecipientDirectory {
        let directory = InMemoryRecipientDirectory::new();
        directory.insert(Recipient {
            id: "rcpt-1".into(),
            email: "doctor@example.org".into(),
            facility_code: facility.into(),
            practitioner_code: practitioner.into(),
            role: RecipientRole::Physician,
        });
        directory
    }

    #[test]
    fn matched_codes_assign_the_result() {
        let directory = directory_with("123456789", "7654321");
        let repository = InMemoryResultRepository::new();

        let routed = build_result(
            &identifiers(Some("123456789"), Some("7654321")),
            "m1",
            "TSH",
            &directory,
            &repository,
        )
        .unwrap();

        assert!(routed.assigned);
        assert_eq!(routed.assigned_recipient_id.as_deref(), Some("rcpt-1"));
        let stored = repository.get(&routed.result_id).unwrap();
        assert_eq!(stored.assigned_recipient_id.as_deref(), Some("rcpt-1"));
        assert_eq!(stored.status, ResultStatus::Final);
        assert_eq!(stored.test_type, "TSH");
    }

    #[test]
    fn unmatched_codes_land_in_review_queue() {
        let directory = directory_with("123456789", "7654321");
        let repository = InMemoryResultRepository::new();

        let routed = build_result(
            &identifiers(Some("999999999"), Some("1111111")),
            "m1",
            "TSH",
            &directory,
            &repository,
        )
        .unwrap();

        assert!(!routed.assigned);
        assert!(routed.assigned_recipient_id.is_none());
        let queue = repository.list_unassigned();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, routed.result_id);
    }

    #[test]
    fn missing_codes_skip_the_lookup() {
        let directory = directory_with("123456789", "7654321");
        let repository = InMemoryResultRepository::new();

        let routed = build_result(
            &identifiers(Some("123456789"), None),
            "m1",
            "TSH",
            &directory,
            &repository,
        )
        .unwrap();

        assert!(!routed.assigned);
    }

    #[test]
    fn display_name_fallback() {
        let mut patient = Patient::default();
        assert_eq!(patient_display_name(&patient), "Unknown Patient");

        patient.last_name = Some("Muster".into());
        assert_eq!(patient_display_name(&patient), "Muster");

        patient.first_name = Some("Erika".into());
        assert_eq!(patient_display_name(&patient), "Erika Muster");
    }

    #[test]
    fn one_append_per_message() {
        let directory = InMemoryRecipientDirectory::new();
        let repository = InMemoryResultRepository::new();

        build_result(&identifiers(None, None), "m1", "TSH", &directory, &repository).unwrap();
        let err = build_result(&identifiers(None, None), "m1", "TSH", &directory, &repository)
            .unwrap_err();
        assert_eq!(err, RoutingError::DuplicateSourceMessage("m1".into()));
        assert_eq!(repository.len(), 1);
    }
}
