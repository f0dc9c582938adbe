/// Per-workflow lock state machine
///
/// Every operation follows the same discipline: read the current record,
/// decide, write conditionally. No transaction spans the decision, so any
/// write can lose to a concurrent mutator; losing is benign and resolves to
/// the passive-read outcome.

use crate::config::LockConfig;
use crate::lock::store::LockStore;
use crate::lock::types::{LockRecord, LockStatus, RequestOutcome, ResolveAction};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Arbitrates exclusive editing rights, one advisory lock per workflow id
pub struct LockManager {
    store: Arc<dyn LockStore>,
    config: LockConfig,
}

impl LockManager {
    pub fn new(store: Arc<dyn LockStore>, config: LockConfig) -> Self {
        Self { store, config }
    }

    /// Evaluate (and possibly mutate) the lock on a read by `reader`
    ///
    /// Implements the full transition table: acquire when unlocked, reap
    /// when stale, force the swap when a takeover request timed out,
    /// heartbeat for the holder, passively report for everyone else.
    /// `None` identifies an unauthenticated reader, who never acquires.
    pub async fn observe(&self, workflow_id: &str, reader: Option<&str>) -> Result<LockStatus> {
        let Some(reader) = reader else {
            return self.peek(workflow_id).await;
        };
        let now = Utc::now();

        let Some(current) = self.store.get(workflow_id).await? else {
            return self.acquire(workflow_id, reader, now).await;
        };

        if self.is_stale(&current, now) {
            // Reap and treat as unlocked. A false return means a concurrent
            // reaper got there first, which is the same outcome.
            self.store
                .delete(workflow_id, Some(&current.holder_id))
                .await?;
            tracing::debug!(
                "Reaped stale lock on workflow {} held by {}",
                workflow_id,
                current.holder_id
            );
            return self.acquire(workflow_id, reader, now).await;
        }

        if let Some(pending) = current.pending() {
            if now - pending.requested_at > self.request_timeout() {
                // Holder never answered: the next read, whoever makes it,
                // transfers the lock to the requester
                let swapped = LockRecord::held_by(workflow_id, &pending.requested_by, now);
                if self
                    .store
                    .compare_and_update(&current.holder_id, &swapped)
                    .await?
                {
                    tracing::info!(
                        "Lock on workflow {} force-swapped from {} to {}",
                        workflow_id,
                        current.holder_id,
                        pending.requested_by
                    );
                    return Ok(if pending.requested_by == reader {
                        LockStatus::held(reader, None)
                    } else {
                        LockStatus::read_only(&pending.requested_by, None)
                    });
                }
                return self.report_committed(workflow_id, reader).await;
            }
        }

        if current.holder_id == reader {
            // Heartbeat: refresh updated_at, everything else untouched
            let mut refreshed = current;
            refreshed.updated_at = now;
            if self.store.compare_and_update(reader, &refreshed).await? {
                Ok(LockStatus::held(reader, refreshed.pending()))
            } else {
                // The record vanished or changed hands between our read and
                // write: the lock is lost
                Ok(LockStatus::unheld())
            }
        } else {
            // Passive read: report, never mutate
            Ok(LockStatus::read_only(&current.holder_id, current.pending()))
        }
    }

    /// Explicitly ask for the lock
    ///
    /// Acquires immediately when unlocked; otherwise files a takeover
    /// request against the holder. A request filed over an existing one
    /// overwrites it (last writer wins, the earlier requester is not told).
    pub async fn request_lock(&self, workflow_id: &str, requester: &str) -> Result<RequestOutcome> {
        let now = Utc::now();
        match self.store.get(workflow_id).await? {
            None => {
                if self
                    .store
                    .try_insert(&LockRecord::held_by(workflow_id, requester, now))
                    .await?
                {
                    Ok(RequestOutcome::Acquired)
                } else {
                    self.file_request(workflow_id, requester, now).await
                }
            }
            Some(current) if current.holder_id == requester => Ok(RequestOutcome::Acquired),
            Some(current) => {
                let mut updated = current.clone();
                updated.requesting_id = Some(requester.to_string());
                updated.requesting_at = Some(now);
                self.store
                    .compare_and_update(&current.holder_id, &updated)
                    .await?;
                Ok(RequestOutcome::Requested)
            }
        }
    }

    /// Holder answers a pending takeover request
    ///
    /// ACCEPT deletes the record: the requester acquires on their next
    /// read. DENY clears only the pending fields. Returns whether a pending
    /// request was actually resolved.
    pub async fn resolve_request(
        &self,
        workflow_id: &str,
        holder: &str,
        action: ResolveAction,
    ) -> Result<bool> {
        match self.store.get(workflow_id).await? {
            Some(current) if current.holder_id == holder && current.pending().is_some() => {
                match action {
                    ResolveAction::Accept => {
                        self.store.delete(workflow_id, Some(holder)).await?;
                    }
                    ResolveAction::Deny => {
                        let mut cleared = current;
                        cleared.requesting_id = None;
                        cleared.requesting_at = None;
                        self.store.compare_and_update(holder, &cleared).await?;
                    }
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Give the lock up; only the current holder's delete takes effect
    pub async fn release_lock(&self, workflow_id: &str, holder: &str) -> Result<bool> {
        self.store.delete(workflow_id, Some(holder)).await
    }

    /// Holder-side read: refreshes the heartbeat and surfaces any pending
    /// takeover request
    pub async fn heartbeat(
        &self,
        workflow_id: &str,
        caller: &str,
    ) -> Result<LockStatus> {
        self.observe(workflow_id, Some(caller)).await
    }

    async fn acquire(&self, workflow_id: &str, reader: &str, now: DateTime<Utc>) -> Result<LockStatus> {
        let record = LockRecord::held_by(workflow_id, reader, now);
        if self.store.try_insert(&record).await? {
            tracing::debug!("Lock on workflow {} acquired by {}", workflow_id, reader);
            return Ok(LockStatus::held(reader, None));
        }
        // Lost the first-reader race: whoever committed holds the lock
        self.report_committed(workflow_id, reader).await
    }

    async fn file_request(
        &self,
        workflow_id: &str,
        requester: &str,
        now: DateTime<Utc>,
    ) -> Result<RequestOutcome> {
        match self.store.get(workflow_id).await? {
            Some(current) => {
                let mut updated = current.clone();
                updated.requesting_id = Some(requester.to_string());
                updated.requesting_at = Some(now);
                self.store
                    .compare_and_update(&current.holder_id, &updated)
                    .await?;
                Ok(RequestOutcome::Requested)
            }
            None => {
                if self
                    .store
                    .try_insert(&LockRecord::held_by(workflow_id, requester, now))
                    .await?
                {
                    Ok(RequestOutcome::Acquired)
                } else {
                    Ok(RequestOutcome::Requested)
                }
            }
        }
    }

    /// Report the committed record from `reader`'s perspective without
    /// mutating anything
    async fn report_committed(&self, workflow_id: &str, reader: &str) -> Result<LockStatus> {
        Ok(match self.store.get(workflow_id).await? {
            Some(rec) if rec.holder_id == reader => LockStatus::held(reader, rec.pending()),
            Some(rec) => LockStatus::read_only(&rec.holder_id, rec.pending()),
            None => LockStatus::unheld(),
        })
    }

    async fn peek(&self, workflow_id: &str) -> Result<LockStatus> {
        Ok(match self.store.get(workflow_id).await? {
            Some(rec) => LockStatus::read_only(&rec.holder_id, rec.pending()),
            None => LockStatus::unheld(),
        })
    }

    fn is_stale(&self, record: &LockRecord, now: DateTime<Utc>) -> bool {
        now - record.updated_at > self.lock_timeout()
    }

    fn lock_timeout(&self) -> Duration {
        Duration::from_std(self.config.lock_timeout).unwrap_or_else(|_| Duration::seconds(120))
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_std(self.config.request_timeout).unwrap_or_else(|_| Duration::seconds(60))
    }
}
