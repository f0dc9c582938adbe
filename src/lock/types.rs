/// Lock record and status types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-workflow advisory lock state, one record per workflow id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub workflow_id: String,
    /// Current holder's caller id
    pub holder_id: String,
    /// Heartbeat timestamp; a record without a recent heartbeat is stale
    pub updated_at: DateTime<Utc>,
    /// Caller waiting to take the lock over, if any
    pub requesting_id: Option<String>,
    /// When the takeover request was filed
    pub requesting_at: Option<DateTime<Utc>>,
}

impl LockRecord {
    /// Fresh record held by `holder` as of `now`, no pending request
    pub fn held_by(workflow_id: &str, holder: &str, now: DateTime<Utc>) -> Self {
        Self {
            workflow_id: workflow_id.to_string(),
            holder_id: holder.to_string(),
            updated_at: now,
            requesting_id: None,
            requesting_at: None,
        }
    }

    /// The pending takeover request, when both fields are present
    pub fn pending(&self) -> Option<PendingRequest> {
        match (&self.requesting_id, &self.requesting_at) {
            (Some(id), Some(at)) => Some(PendingRequest {
                requested_by: id.clone(),
                requested_at: *at,
            }),
            _ => None,
        }
    }
}

/// A takeover request filed against a held lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
}

/// Verdict of a lock observation, computed for one reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStatus {
    /// Whether the reader must treat the definition as read-only
    pub read_only: bool,
    /// Current holder, if any is known
    pub holder: Option<String>,
    /// Outstanding takeover request visible to the reader
    pub pending_request: Option<PendingRequest>,
}

impl LockStatus {
    /// The reader holds the lock
    pub fn held(holder: &str, pending: Option<PendingRequest>) -> Self {
        Self {
            read_only: false,
            holder: Some(holder.to_string()),
            pending_request: pending,
        }
    }

    /// Someone else holds the lock
    pub fn read_only(holder: &str, pending: Option<PendingRequest>) -> Self {
        Self {
            read_only: true,
            holder: Some(holder.to_string()),
            pending_request: pending,
        }
    }

    /// No holder is known (unlocked, or the reader's lock vanished)
    pub fn unheld() -> Self {
        Self {
            read_only: true,
            holder: None,
            pending_request: None,
        }
    }
}

/// Result of an explicit lock request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestOutcome {
    /// The lock was free and is now held by the requester
    Acquired,
    /// The lock is held; a takeover request was filed
    Requested,
}

/// Holder's answer to a pending takeover request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResolveAction {
    Accept,
    Deny,
}
