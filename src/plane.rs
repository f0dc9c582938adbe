/// Control plane facade
///
/// Wires the definition store, lock manager, compiler and schedule
/// synchronizer together behind the operations the request layer consumes.
/// Lock evaluation is synchronous with the read; schedule reconciliation is
/// fire-and-forget and never blocks or fails the triggering save.

use crate::compiler::{self, CompileError};
use crate::config::Config;
use crate::lock::{
    LockManager, LockStatus, LockStore, PendingRequest, RequestOutcome, ResolveAction,
};
use crate::schedule::{ScheduleSynchronizer, SchedulerClient};
use crate::workflow::store::DefinitionStore;
use crate::workflow::types::{ExecutionPlan, TriggerKinds, WorkflowDefinition};
use anyhow::{anyhow, Result};
use std::sync::Arc;

/// A definition read together with the reader's lock verdict
#[derive(Debug, Clone)]
pub struct WorkflowRead {
    pub definition: WorkflowDefinition,
    /// Whether the caller must treat the definition as read-only
    pub read_only: bool,
    /// Current lock holder, when one exists
    pub holder: Option<String>,
    /// Outstanding takeover request, when one exists
    pub pending_request: Option<PendingRequest>,
}

/// The workflow control plane
pub struct ControlPlane {
    definitions: Arc<dyn DefinitionStore>,
    locks: LockManager,
    triggers: TriggerKinds,
    synchronizer: ScheduleSynchronizer,
}

impl ControlPlane {
    /// Assemble the control plane and spawn its reconciliation worker
    pub fn new(
        definitions: Arc<dyn DefinitionStore>,
        lock_store: Arc<dyn LockStore>,
        scheduler: Arc<dyn SchedulerClient>,
        config: Config,
    ) -> Self {
        Self {
            definitions,
            locks: LockManager::new(lock_store, config.lock),
            triggers: TriggerKinds::builtin(),
            synchronizer: ScheduleSynchronizer::spawn(scheduler),
        }
    }

    /// Replace the built-in trigger classification table
    pub fn with_trigger_kinds(mut self, triggers: TriggerKinds) -> Self {
        self.triggers = triggers;
        self
    }

    /// Fetch a definition and evaluate the caller's editing rights
    ///
    /// The lock mutation (acquire, heartbeat, reap, forced swap) happens
    /// before the response is produced; an unidentified caller gets a
    /// passive read-only view.
    pub async fn read_with_lock(
        &self,
        workflow_id: &str,
        caller: Option<&str>,
    ) -> Result<WorkflowRead> {
        let definition = self
            .definitions
            .get(workflow_id)
            .await?
            .ok_or_else(|| anyhow!("Workflow not found: {workflow_id}"))?;
        let status = self.locks.observe(workflow_id, caller).await?;
        Ok(WorkflowRead {
            definition,
            read_only: status.read_only,
            holder: status.holder,
            pending_request: status.pending_request,
        })
    }

    /// Ask for the editing lock
    pub async fn request_lock(&self, workflow_id: &str, caller: &str) -> Result<RequestOutcome> {
        self.locks.request_lock(workflow_id, caller).await
    }

    /// Answer a pending takeover request as the holder
    pub async fn resolve_request(
        &self,
        workflow_id: &str,
        caller: &str,
        action: ResolveAction,
    ) -> Result<bool> {
        self.locks.resolve_request(workflow_id, caller, action).await
    }

    /// Release the editing lock
    pub async fn release_lock(&self, workflow_id: &str, caller: &str) -> Result<bool> {
        self.locks.release_lock(workflow_id, caller).await
    }

    /// Holder heartbeat; surfaces any pending takeover request
    pub async fn heartbeat(&self, workflow_id: &str, caller: &str) -> Result<LockStatus> {
        self.locks.heartbeat(workflow_id, caller).await
    }

    /// Compile a definition into an execution plan
    pub fn compile(&self, definition: &WorkflowDefinition) -> Result<ExecutionPlan, CompileError> {
        compiler::compile(definition, &self.triggers)
    }

    /// Reconcile scheduler state after a successful create or update
    ///
    /// `previous` distinguishes the create path from the update path;
    /// `active` carries a changed activation flag, if any. Returns
    /// immediately; the outcome is observable only in the logs.
    pub fn reconcile_schedule(
        &self,
        previous: Option<&WorkflowDefinition>,
        current: &WorkflowDefinition,
        active: Option<bool>,
    ) {
        match previous {
            None => self.synchronizer.definition_created(current),
            Some(_) => self.synchronizer.definition_updated(current, active),
        }
    }

    /// Reconcile scheduler state after a successful delete
    pub fn reconcile_deleted(&self, workflow_id: &str) {
        self.synchronizer.definition_deleted(workflow_id);
    }

    /// The reconciliation handle, mainly for tests that need to drain it
    pub fn synchronizer(&self) -> &ScheduleSynchronizer {
        &self.synchronizer
    }
}
