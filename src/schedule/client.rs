/// Scheduler engine collaborator interface
///
/// The control plane never talks to the execution engine directly; it
/// drives recurring schedules through this narrow contract. Schedules are
/// keyed by workflow id.

use crate::schedule::spec::ScheduleSpec;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Searchable metadata attached to a created schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleMemo {
    pub workflow_id: String,
    pub workflow_name: String,
}

/// External scheduler engine operations
#[async_trait]
pub trait SchedulerClient: Send + Sync {
    /// Create a schedule keyed by workflow id, carrying the generated
    /// workflow-type and task-queue names, start arguments and memo
    async fn create_schedule(
        &self,
        id: &str,
        workflow_type: &str,
        task_queue: &str,
        spec: &ScheduleSpec,
        args: Vec<Value>,
        memo: ScheduleMemo,
    ) -> Result<()>;

    /// Replace the spec of an existing schedule in place
    async fn update_schedule(&self, id: &str, spec: &ScheduleSpec) -> Result<()>;

    /// Stop firing without forgetting the schedule
    async fn pause_schedule(&self, id: &str) -> Result<()>;

    /// Resume a paused schedule
    async fn resume_schedule(&self, id: &str) -> Result<()>;

    /// Remove a schedule; removing a missing schedule is not an error
    async fn delete_schedule(&self, id: &str) -> Result<()>;

    /// Whether a schedule exists for the workflow id
    async fn schedule_exists(&self, id: &str) -> Result<bool>;
}
