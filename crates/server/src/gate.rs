//! Webhook gate: delivery authentication and deduplication.
//!
//! Everything that decides whether an inbound delivery is allowed to touch
//! the pipeline lives here: media-type screening, HMAC signature
//! verification, timestamp freshness, the replay cache, and the per-source
//! rate-limit key. The gate never looks inside the LDT payload; it works on
//! raw bytes and headers only.

use crate::error::ServerError;
use axum::http::HeaderMap;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Scheme prefix expected on the `X-Signature` header.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Headers consumed by the gate.
pub const HEADER_TIMESTAMP: &str = "x-timestamp";
pub const HEADER_SIGNATURE: &str = "x-signature";
pub const HEADER_IDEMPOTENCY_KEY: &str = "idempotency-key";

/// Replay cache abstraction: atomic check-and-insert with TTL.
///
/// Injected so the gate is testable without wall-clock delay and swappable
/// for a shared cache in multi-instance deployments. Implementations must
/// guarantee that two concurrent calls with the same key cannot both
/// observe "absent".
pub trait ReplayCache: Send + Sync {
    /// Record `key` for `ttl`. Returns `true` when the key was absent (or
    /// expired) and has now been recorded, `false` when it is still live.
    fn insert_if_absent(&self, key: &str, ttl: Duration) -> bool;
}

/// In-memory replay cache. Expired entries are replaced on touch and swept
/// opportunistically once the table grows past a threshold.
#[derive(Debug, Default)]
pub struct InMemoryReplayCache {
    entries: DashMap<String, Instant>,
}

/// Sweep threshold for the opportunistic purge.
const PURGE_WATERMARK: usize = 10_000;

impl InMemoryReplayCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, expires_at| *expires_at > now);
    }
}

impl ReplayCache for InMemoryReplayCache {
    fn insert_if_absent(&self, key: &str, ttl: Duration) -> bool {
        if self.entries.len() > PURGE_WATERMARK {
            self.purge_expired();
        }
        let now = Instant::now();
        // The entry guard holds the shard lock, so check-and-insert is
        // atomic with respect to concurrent deliveries of the same key.
        match self.entries.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if *occupied.get() > now {
                    false
                } else {
                    occupied.insert(now + ttl);
                    true
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(now + ttl);
                true
            }
        }
    }
}

/// True for the media types the gateway is allowed to deliver as-is.
pub fn is_text_media_type(content_type: &str) -> bool {
    let essence = media_essence(content_type);
    essence == "text/plain" || essence.starts_with("text/")
}

/// True for JSON media types, including structured-syntax suffixes.
pub fn is_json_media_type(content_type: &str) -> bool {
    let essence = media_essence(content_type);
    essence == "application/json" || essence.ends_with("+json")
}

fn media_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Verify the delivery signature: HMAC-SHA256 over `"{timestamp}.{body}"`,
/// compared in constant time.
pub fn verify_signature(
    secret: &[u8],
    timestamp: &str,
    body: &[u8],
    provided: &str,
) -> Result<(), ServerError> {
    let hex_signature = provided
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or_else(|| ServerError::Authentication("malformed signature header".to_string()))?;
    let provided_bytes = hex::decode(hex_signature)
        .map_err(|_| ServerError::Authentication("signature is not valid hex".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|_| ServerError::Internal("webhook secret unusable as HMAC key".to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    let expected = mac.finalize().into_bytes();

    // Constant-time comparison; ct_eq on slices of unequal length is a
    // constant-time "no" as well.
    if expected.as_slice().ct_eq(provided_bytes.as_slice()).unwrap_u8() == 0 {
        return Err(ServerError::Authentication("signature mismatch".to_string()));
    }
    Ok(())
}

/// Compute the signature the gateway is expected to send. Shared with tests
/// and useful for signing outbound callbacks.
pub fn sign(secret: &[u8], timestamp: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// Validate the delivery timestamp against the acceptance window and return
/// it as unix millis.
pub fn check_timestamp(
    timestamp: &str,
    now_ms: i64,
    tolerance: Duration,
) -> Result<i64, ServerError> {
    let ts: i64 = timestamp.trim().parse().map_err(|_| {
        ServerError::Authentication("timestamp is not unix milliseconds".to_string())
    })?;
    let skew_ms = now_ms.abs_diff(ts) as u128;
    if skew_ms > tolerance.as_millis() {
        return Err(ServerError::Authentication(
            "timestamp outside acceptance window".to_string(),
        ));
    }
    Ok(ts)
}

/// Hex-encoded SHA-256 of the delivery body; the only payload-derived value
/// that ever appears in logs.
pub fn sha256_hex(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Replay key for a delivery: the caller-supplied idempotency key when
/// present, else timestamp + body hash.
pub fn replay_key(idempotency_key: Option<&str>, timestamp: &str, body_hash: &str) -> String {
    match idempotency_key {
        Some(key) if !key.trim().is_empty() => key.trim().to_string(),
        _ => format!("{timestamp}:{body_hash}"),
    }
}

/// Rate-limit key for a delivery source: the first forwarded-for hop when
/// the gateway fronts multiple senders, else a shared direct bucket.
pub fn source_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "direct".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn signature_round_trip() {
        let body = b"0180201793860200";
        let signature = sign(SECRET, "1700000000000", body);
        assert!(signature.starts_with(SIGNATURE_PREFIX));
        verify_signature(SECRET, "1700000000000", body, &signature).unwrap();
    }

    #[test]
    fn flipped_body_byte_fails_verification() {
        let signature = sign(SECRET, "1700000000000", b"0180201793860200");
        let err = verify_signature(SECRET, "1700000000000", b"0180201793860201", &signature)
            .unwrap_err();
        assert!(matches!(err, ServerError::Authentication(_)));
    }

    #[test]
    fn signature_is_timestamp_bound() {
        let body = b"0180201793860200";
        let signature = sign(SECRET, "1700000000000", body);
        let err = verify_signature(SECRET, "1700000000001", body, &signature).unwrap_err();
        assert!(matches!(err, ServerError::Authentication(_)));
    }

    #[test]
    fn malformed_signature_headers_rejected() {
        assert!(verify_signature(SECRET, "1", b"x", "deadbeef").is_err());
        assert!(verify_signature(SECRET, "1", b"x", "sha256=zznothex").is_err());
        assert!(verify_signature(SECRET, "1", b"x", "sha256=").is_err());
    }

    #[test]
    fn timestamp_window() {
        let now_ms = 1_700_000_000_000;
        let tolerance = Duration::from_secs(300);
        // 4 minutes old: accepted.
        check_timestamp(&(now_ms - 240_000).to_string(), now_ms, tolerance).unwrap();
        // 6 minutes old: rejected.
        assert!(check_timestamp(&(now_ms - 360_000).to_string(), now_ms, tolerance).is_err());
        // 6 minutes in the future: rejected too.
        assert!(check_timestamp(&(now_ms + 360_000).to_string(), now_ms, tolerance).is_err());
        // Garbage: rejected.
        assert!(check_timestamp("not-a-number", now_ms, tolerance).is_err());
    }

    #[test]
    fn replay_cache_check_and_insert() {
        let cache = InMemoryReplayCache::new();
        let ttl = Duration::from_secs(600);
        assert!(cache.insert_if_absent("k1", ttl));
        assert!(!cache.insert_if_absent("k1", ttl));
        assert!(cache.insert_if_absent("k2", ttl));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn replay_cache_expiry_without_sleeping() {
        let cache = InMemoryReplayCache::new();
        assert!(cache.insert_if_absent("k1", Duration::ZERO));
        // TTL of zero is already expired, so the key is free again.
        assert!(cache.insert_if_absent("k1", Duration::from_secs(600)));
        assert!(!cache.insert_if_absent("k1", Duration::from_secs(600)));
    }

    #[test]
    fn purge_drops_expired_entries() {
        let cache = InMemoryReplayCache::new();
        cache.insert_if_absent("dead", Duration::ZERO);
        cache.insert_if_absent("live", Duration::from_secs(600));
        cache.purge_expired();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn replay_key_prefers_idempotency_header() {
        assert_eq!(replay_key(Some("abc"), "1", "hash"), "abc");
        assert_eq!(replay_key(Some("  "), "1", "hash"), "1:hash");
        assert_eq!(replay_key(None, "1", "hash"), "1:hash");
    }

    #[test]
    fn media_type_screening() {
        assert!(is_text_media_type("text/plain"));
        assert!(is_text_media_type("text/plain; charset=utf-8"));
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("application/vnd.gateway+json"));
        assert!(!is_text_media_type("application/octet-stream"));
        assert!(!is_json_media_type("text/plain"));
    }

    #[test]
    fn source_key_from_forwarded_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(source_key(&headers), "direct");
        headers.insert("x-forwarded-for", "10.0.0.7, 10.0.0.1".parse().unwrap());
        assert_eq!(source_key(&headers), "10.0.0.7");
    }
}
