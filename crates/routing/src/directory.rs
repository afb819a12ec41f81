//! Recipient directory lookup.

use crate::types::Recipient;
use dashmap::DashMap;

/// Exact-pair recipient lookup. Read-only to the pipeline, no side effects.
///
/// Both codes are required; there is no partial or fuzzy matching. A missing
/// pair simply yields no recipient and the result lands in the unassigned
/// review queue.
pub trait RecipientDirectory: Send + Sync {
    fn find_recipient(&self, facility_code: &str, practitioner_code: &str) -> Option<Recipient>;
}

/// In-memory directory keyed by (facility, practitioner) pair.
#[derive(Debug, Default)]
pub struct InMemoryRecipientDirectory {
    by_pair: DashMap<(String, String), Recipient>,
}

impl InMemoryRecipientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a recipient under its code pair. Last registration for a
    /// pair wins.
    pub fn insert(&self, recipient: Recipient) {
        self.by_pair.insert(
            (
                recipient.facility_code.clone(),
                recipient.practitioner_code.clone(),
            ),
            recipient,
        );
    }

    pub fn len(&self) -> usize {
        self.by_pair.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pair.is_empty()
    }
}

impl RecipientDirectory for InMemoryRecipientDirectory {
    fn find_recipient(&self, facility_code: &str, practitioner_code: &str) -> Option<Recipient> {
        self.by_pair
            .get(&(facility_code.to_string(), practitioner_code.to_string()))
            .map(|entry| entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecipientRole;

    fn recipient(facility: &str, practitioner: &str) -> Recipient {
        Recipient {
            id: format!("rcpt-{facility}-{practitioner}"),
            email: "doctor@example.org".into(),
            facility_code: facility.into(),
            practitioner_code: practitioner.into(),
            role: RecipientRole::Physician,
        }
    }

    #[test]
    fn exact_pair_lookup() {
        let directory = InMemoryRecipientDirectory::new();
        directory.insert(recipient("123456789", "7654321"));

        let hit = directory.find_recipient("123456789", "7654321");
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().id, "rcpt-123456789-7654321");
    }

    #[test]
    fn no_partial_matching() {
        let directory = InMemoryRecipientDirectory::new();
        directory.insert(recipient("123456789", "7654321"));

        assert!(directory.find_recipient("123456789", "0000000").is_none());
        assert!(directory.find_recipient("000000000", "7654321").is_none());
    }
}
