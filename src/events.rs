//! Event-sink schema: the record callers embed assignment results into and
//! submit to their analytics storage. The core does not persist or validate
//! events beyond this type-level structure; it only guarantees that
//! `assignment_id` is stable and parseable back into its experiment and
//! variant parts.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Assignment, Str};

/// Type of a tracked experiment event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Impression,
    Click,
    Signup,
    Purchase,
    Error,
}

/// An analytics event as consumed by the downstream event sink.
///
/// Raw user identifiers never appear in events; only the salted hash
/// (see [`hash_user_id`]) does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// Fresh unique identifier for this event.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp_utc: DateTime<Utc>,
    /// SHA-256 hex of `user_id + salt`.
    pub user_id_hashed: String,
    /// Assignment the event belongs to, `"{experiment_id}|{variant}"`.
    pub assignment_id: String,
    /// The variant the user saw.
    pub variant: Str,
    /// What happened.
    pub event_type: EventType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impression_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_version: Option<String>,
}

impl TrackingEvent {
    /// Create an event for an assignment with a fresh id, the current time,
    /// and no optional fields set. `salt` is the same operational salt the
    /// engine hashes with.
    pub fn new(assignment: &Assignment, salt: &str, event_type: EventType) -> TrackingEvent {
        TrackingEvent {
            event_id: fresh_event_id(),
            timestamp_utc: Utc::now(),
            user_id_hashed: hash_user_id(&assignment.user_id, salt),
            assignment_id: assignment.assignment_id.clone(),
            variant: assignment.variant.clone(),
            event_type,
            impression_id: None,
            ad_id: None,
            campaign_id: None,
            page_url: None,
            device_type: None,
            geo_country: None,
            session_id: None,
            conversion_value: None,
            experiment_version: None,
        }
    }
}

/// SHA-256 hex of `user_id + salt`: the only form of the user identifier
/// that leaves the assignment path.
pub fn hash_user_id(user_id: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(salt.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn fresh_event_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
