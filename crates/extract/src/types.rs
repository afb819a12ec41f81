use serde::{Deserialize, Serialize};

/// Patient demographics recovered from a message. All fields optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    /// Birth date as transmitted; the wire format does not pin one layout.
    pub birth_date: Option<String>,
    pub gender: Option<String>,
}

/// Routing identifiers and demographics recovered from one message.
///
/// Absence of any field is a valid state. The routing layer decides what an
/// incomplete extraction means (an unassigned result, never a rejection).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedIdentifiers {
    /// 9-digit facility code, when recovered.
    pub facility_code: Option<String>,
    /// 7-digit practitioner code, when recovered.
    pub practitioner_code: Option<String>,
    pub patient: Patient,
}

impl ExtractedIdentifiers {
    /// True when both routing codes are present, the precondition for a
    /// recipient-directory lookup.
    pub fn has_routing_pair(&self) -> bool {
        self.facility_code.is_some() && self.practitioner_code.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_pair_requires_both_codes() {
        let mut ids = ExtractedIdentifiers::default();
        assert!(!ids.has_routing_pair());
        ids.facility_code = Some("123456789".into());
        assert!(!ids.has_routing_pair());
        ids.practitioner_code = Some("1234567".into());
        assert!(ids.has_routing_pair());
    }
}
