use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::gate::{InMemoryReplayCache, ReplayCache};
use dashmap::DashMap;
use routing::{
    InMemoryRawMessageStore, InMemoryRecipientDirectory, InMemoryResultRepository,
    RawMessageStore, RecipientDirectory, ResultRepository,
};
use std::sync::Arc;

/// Shared application state
///
/// The replay cache and rate-limit counters are the only process-wide
/// mutable state on the gate path; both are atomic so two concurrent
/// deliveries of the same message cannot both pass. The store fields are
/// trait objects so production deployments can inject real datastores.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Replay dedup cache (TTL'd, atomic check-and-insert)
    pub replay_cache: Arc<dyn ReplayCache>,

    /// Rate limit tracking: source -> (count, window_start)
    pub rate_limiter: Arc<DashMap<String, (u32, std::time::Instant)>>,

    /// Recipient directory (read-only collaborator)
    pub directory: Arc<dyn RecipientDirectory>,

    /// Result repository (the pipeline's single write target)
    pub repository: Arc<dyn ResultRepository>,

    /// Append-only raw-message store
    pub raw_store: Arc<dyn RawMessageStore>,
}

impl ServerState {
    /// Create new server state backed by in-memory stores
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        Ok(Self::with_stores(
            config,
            Arc::new(InMemoryReplayCache::new()),
            Arc::new(InMemoryRecipientDirectory::new()),
            Arc::new(InMemoryResultRepository::new()),
            Arc::new(InMemoryRawMessageStore::new()),
        ))
    }

    /// Create server state with injected stores
    pub fn with_stores(
        config: ServerConfig,
        replay_cache: Arc<dyn ReplayCache>,
        directory: Arc<dyn RecipientDirectory>,
        repository: Arc<dyn ResultRepository>,
        raw_store: Arc<dyn RawMessageStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            replay_cache,
            rate_limiter: Arc::new(DashMap::new()),
            directory,
            repository,
            raw_store,
        }
    }

    /// Check rate limit for a delivery source
    pub fn check_rate_limit(&self, source: &str) -> bool {
        let now = std::time::Instant::now();
        let window = std::time::Duration::from_secs(60);
        let limit = self.config.rate_limit_per_minute;

        let mut entry = self
            .rate_limiter
            .entry(source.to_string())
            .or_insert((0, now));
        let (count, window_start) = entry.value_mut();

        // Reset if window has passed
        if now.duration_since(*window_start) > window {
            *count = 0;
            *window_start = now;
        }

        // Check limit
        if *count >= limit {
            return false;
        }

        *count += 1;
        true
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_counts_per_source() {
        let config = ServerConfig {
            rate_limit_per_minute: 2,
            ..ServerConfig::default()
        };
        let state = ServerState::new(config).unwrap();

        assert!(state.check_rate_limit("10.0.0.7"));
        assert!(state.check_rate_limit("10.0.0.7"));
        assert!(!state.check_rate_limit("10.0.0.7"));
        // A different source has its own bucket.
        assert!(state.check_rate_limit("10.0.0.8"));
    }
}
