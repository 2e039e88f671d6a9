//! Privacy-preserving audit trail.
//!
//! Every completed analysis produces an [`AuditEvent`] that names the event,
//! the content hash of the media, and a timestamp. Media bytes, filenames and
//! client addresses never appear in the record. Each record carries a SHA3
//! digest over its fields so later edits to an exported log are detectable.
//!
//! Events are emitted through `tracing` under the `audit` target; route that
//! target to a dedicated sink with the subscriber's filter.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use tracing::info;

use crate::media::ContentHash;

pub const IMAGE_ANALYZED: &str = "image_analyzed";
pub const VIDEO_SUBMITTED: &str = "video_submitted";
pub const VIDEO_ANALYZED: &str = "video_analyzed";
pub const VIDEO_FAILED: &str = "video_analysis_failed";

/// One audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event: String,
    pub media_hash: ContentHash,
    /// Unix seconds
    pub timestamp: i64,
    /// Hex SHA3-256 over `event`, `media_hash` and `timestamp`
    pub digest: String,
}

impl AuditEvent {
    fn compute_digest(event: &str, media_hash: &ContentHash, timestamp: i64) -> String {
        let mut hasher = Sha3_256::new();
        hasher.update((event.len() as u64).to_be_bytes());
        hasher.update(event.as_bytes());
        hasher.update(media_hash.as_bytes());
        hasher.update(timestamp.to_be_bytes());
        hex::encode(hasher.finalize())
    }

    /// True when the digest still matches the fields.
    pub fn verify(&self) -> bool {
        Self::compute_digest(&self.event, &self.media_hash, self.timestamp) == self.digest
    }

    /// Write the record to the `audit` tracing target.
    pub fn emit(&self) {
        info!(
            target: "audit",
            event = %self.event,
            media_hash = %self.media_hash,
            timestamp = self.timestamp,
            digest = %self.digest,
            "Audit event"
        );
    }
}

/// Builds audit records.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditRecorder;

impl AuditRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Build a record of `event` for `media_hash` at the current time.
    ///
    /// Nothing is written until the caller calls [`AuditEvent::emit`].
    pub fn record(&self, event: &str, media_hash: ContentHash) -> AuditEvent {
        self.record_at(event, media_hash, Utc::now().timestamp())
    }

    /// Build a record with an explicit timestamp without emitting it.
    pub fn record_at(&self, event: &str, media_hash: ContentHash, timestamp: i64) -> AuditEvent {
        AuditEvent {
            event: event.to_string(),
            digest: AuditEvent::compute_digest(event, &media_hash, timestamp),
            media_hash,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    #[test]
    fn test_record_contains_only_hash_event_and_time() {
        let hash = ContentHash::from_bytes(b"some image bytes");
        let record = AuditRecorder::new().record_at(IMAGE_ANALYZED, hash, 1_700_000_000);

        let json = serde_json::to_value(&record).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["digest", "event", "media_hash", "timestamp"]);
        assert_eq!(json["media_hash"], hash.to_hex());
        assert_eq!(json["event"], "image_analyzed");
    }

    #[test]
    fn test_tampering_is_detected() {
        let hash = ContentHash::from_bytes(b"clip");
        let record = AuditRecorder::new().record_at(VIDEO_ANALYZED, hash, 42);
        assert!(record.verify());

        let mut edited = record.clone();
        edited.timestamp += 1;
        assert!(!edited.verify());

        let mut edited = record.clone();
        edited.event = VIDEO_FAILED.into();
        assert!(!edited.verify());

        let mut edited = record;
        edited.media_hash = ContentHash::from_bytes(b"other clip");
        assert!(!edited.verify());
    }

    #[test]
    fn test_record_uses_current_time() {
        let before = Utc::now().timestamp();
        let record = AuditRecorder::new().record(VIDEO_SUBMITTED, ContentHash::from_bytes(b"x"));
        assert!(record.timestamp >= before);
        assert!(record.verify());
    }

    /// Counts events written to the `audit` target.
    struct AuditCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for AuditCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if event.metadata().target() == "audit" {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_only_emit_writes_to_audit_target() {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(AuditCounter(count.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let record = AuditRecorder::new().record(IMAGE_ANALYZED, ContentHash::from_bytes(b"y"));
            assert_eq!(count.load(Ordering::SeqCst), 0);

            record.emit();
            assert_eq!(count.load(Ordering::SeqCst), 1);
        });
    }
}
