//! Result repository and raw-message store abstractions.

use crate::error::RoutingError;
use crate::types::{LabResult, RawMessage};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Persistence for routed results. The pipeline performs exactly one
/// `append` per accepted message; everything else on this trait serves the
/// review-queue and export collaborators.
pub trait ResultRepository: Send + Sync {
    /// Append a new result. Fails with
    /// [`RoutingError::DuplicateSourceMessage`] when a result for the same
    /// source message already exists, which makes a retried delivery
    /// idempotent even past the replay cache's TTL.
    fn append(&self, result: LabResult) -> Result<(), RoutingError>;

    fn get(&self, result_id: &str) -> Option<LabResult>;

    fn find_by_source_message(&self, source_message_id: &str) -> Option<LabResult>;

    /// Results with no assigned recipient, in creation order.
    fn list_unassigned(&self) -> Vec<LabResult>;

    /// Explicit admin action: point a result at a recipient. Never invoked
    /// by the ingestion path.
    fn reassign(&self, result_id: &str, recipient_id: &str) -> Result<LabResult, RoutingError>;
}

/// Append-only store for accepted deliveries.
pub trait RawMessageStore: Send + Sync {
    /// Persist the raw bytes of one accepted delivery and return the stored
    /// record (fresh id, receive time, content hash).
    fn persist(&self, raw_bytes: &[u8]) -> RawMessage;
}

/// In-memory result repository. Insertion order is preserved so the review
/// queue is stable.
#[derive(Debug, Default)]
pub struct InMemoryResultRepository {
    results: RwLock<Vec<LabResult>>,
}

impl InMemoryResultRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<LabResult>> {
        self.results
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<LabResult>> {
        self.results
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResultRepository for InMemoryResultRepository {
    fn append(&self, result: LabResult) -> Result<(), RoutingError> {
        let mut results = self.write();
        if results
            .iter()
            .any(|existing| existing.source_message_id == result.source_message_id)
        {
            return Err(RoutingError::DuplicateSourceMessage(
                result.source_message_id,
            ));
        }
        results.push(result);
        Ok(())
    }

    fn get(&self, result_id: &str) -> Option<LabResult> {
        self.read().iter().find(|r| r.id == result_id).cloned()
    }

    fn find_by_source_message(&self, source_message_id: &str) -> Option<LabResult> {
        self.read()
            .iter()
            .find(|r| r.source_message_id == source_message_id)
            .cloned()
    }

    fn list_unassigned(&self) -> Vec<LabResult> {
        self.read()
            .iter()
            .filter(|r| r.assigned_recipient_id.is_none())
            .cloned()
            .collect()
    }

    fn reassign(&self, result_id: &str, recipient_id: &str) -> Result<LabResult, RoutingError> {
        let mut results = self.write();
        let result = results
            .iter_mut()
            .find(|r| r.id == result_id)
            .ok_or_else(|| RoutingError::ResultNotFound(result_id.to_string()))?;
        result.assigned_recipient_id = Some(recipient_id.to_string());
        result.updated_at = Utc::now();
        info!(result_id = %result.id, recipient_id, "result reassigned");
        Ok(result.clone())
    }
}

/// In-memory append-only raw-message store.
#[derive(Debug, Default)]
pub struct InMemoryRawMessageStore {
    messages: RwLock<Vec<RawMessage>>,
}

impl InMemoryRawMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn get(&self, message_id: &str) -> Option<RawMessage> {
        self.messages
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
    }
}

impl RawMessageStore for InMemoryRawMessageStore {
    fn persist(&self, raw_bytes: &[u8]) -> RawMessage {
        let message = RawMessage {
            id: Uuid::new_v4().to_string(),
            received_at: Utc::now(),
            raw_bytes: raw_bytes.to_vec(),
            content_hash: hex::encode(Sha256::digest(raw_bytes)),
        };
        self.messages
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());
        message
    }
}
