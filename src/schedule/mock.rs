/// Call-recording scheduler double
///
/// Implements [`SchedulerClient`] by recording every call and tracking
/// schedule existence in memory. A failure switch makes every operation
/// error, for exercising the swallow-and-log paths.

use crate::schedule::client::{ScheduleMemo, SchedulerClient};
use crate::schedule::spec::ScheduleSpec;
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// One recorded scheduler invocation
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerCall {
    Create {
        id: String,
        workflow_type: String,
        task_queue: String,
        spec: ScheduleSpec,
    },
    Update {
        id: String,
        spec: ScheduleSpec,
    },
    Pause {
        id: String,
    },
    Resume {
        id: String,
    },
    Delete {
        id: String,
    },
}

/// In-memory recording implementation of the scheduler collaborator
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    calls: Mutex<Vec<SchedulerCall>>,
    existing: Mutex<HashSet<String>>,
    fail: AtomicBool,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every mutation attempted so far, in order
    pub async fn calls(&self) -> Vec<SchedulerCall> {
        self.calls.lock().await.clone()
    }

    /// Pretend a schedule already exists for the workflow id
    pub async fn seed_schedule(&self, id: &str) {
        self.existing.lock().await.insert(id.to_string());
    }

    /// Make every subsequent operation fail (or recover)
    pub fn fail_everything(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    async fn record(&self, call: SchedulerCall) -> Result<()> {
        self.calls.lock().await.push(call);
        if self.fail.load(Ordering::SeqCst) {
            bail!("scheduler engine unreachable");
        }
        Ok(())
    }
}

#[async_trait]
impl SchedulerClient for RecordingScheduler {
    async fn create_schedule(
        &self,
        id: &str,
        workflow_type: &str,
        task_queue: &str,
        spec: &ScheduleSpec,
        _args: Vec<Value>,
        _memo: ScheduleMemo,
    ) -> Result<()> {
        self.record(SchedulerCall::Create {
            id: id.to_string(),
            workflow_type: workflow_type.to_string(),
            task_queue: task_queue.to_string(),
            spec: spec.clone(),
        })
        .await?;
        self.existing.lock().await.insert(id.to_string());
        Ok(())
    }

    async fn update_schedule(&self, id: &str, spec: &ScheduleSpec) -> Result<()> {
        self.record(SchedulerCall::Update {
            id: id.to_string(),
            spec: spec.clone(),
        })
        .await
    }

    async fn pause_schedule(&self, id: &str) -> Result<()> {
        self.record(SchedulerCall::Pause { id: id.to_string() }).await
    }

    async fn resume_schedule(&self, id: &str) -> Result<()> {
        self.record(SchedulerCall::Resume { id: id.to_string() }).await
    }

    async fn delete_schedule(&self, id: &str) -> Result<()> {
        self.record(SchedulerCall::Delete { id: id.to_string() }).await?;
        self.existing.lock().await.remove(id);
        Ok(())
    }

    async fn schedule_exists(&self, id: &str) -> Result<bool> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("scheduler engine unreachable");
        }
        Ok(self.existing.lock().await.contains(id))
    }
}
