/// Fire-and-forget schedule reconciliation
///
/// Definition saves enqueue a reconciliation job and return immediately; a
/// spawned worker replays the jobs against the scheduler collaborator.
/// Scheduler state is eventually consistent with stored definitions: every
/// failure here is logged with the workflow id and swallowed, and a later
/// save re-converges from current state. There is no retry.

use crate::compiler::naming::{class_case, identifier_name};
use crate::schedule::client::{ScheduleMemo, SchedulerClient};
use crate::schedule::spec::{extract_schedule_spec, ScheduleSpec};
use crate::workflow::types::WorkflowDefinition;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// A queued reconciliation unit of work, keyed by workflow id
#[derive(Debug)]
pub enum ReconcileJob {
    /// Definition was created with a schedule-bearing trigger; names were
    /// computed synchronously at enqueue time
    Created {
        workflow_id: String,
        workflow_name: String,
        workflow_type: String,
        task_queue: String,
        spec: ScheduleSpec,
    },
    /// Definition was updated; the worker decides between update, create,
    /// delete or nothing, then applies any active-flag change
    Updated {
        workflow_id: String,
        workflow_name: String,
        workflow_type: String,
        task_queue: String,
        spec: Option<ScheduleSpec>,
        active: Option<bool>,
    },
    /// Definition was deleted; best-effort schedule removal
    Deleted { workflow_id: String },
    /// Barrier: acknowledged once every prior job has been processed
    Drain(oneshot::Sender<()>),
}

/// Handle to the reconciliation worker
///
/// Cheap to clone; dropping every handle shuts the worker down once its
/// queue empties.
#[derive(Debug, Clone)]
pub struct ScheduleSynchronizer {
    tx: mpsc::UnboundedSender<ReconcileJob>,
}

impl ScheduleSynchronizer {
    /// Spawn the background worker and return its handle
    pub fn spawn(client: Arc<dyn SchedulerClient>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(client, rx));
        Self { tx }
    }

    /// Reconcile after a definition create
    ///
    /// No interval trigger means nothing to do; otherwise the generated
    /// task-queue and workflow-type names are fixed here, synchronously,
    /// so the job is self-contained.
    pub fn definition_created(&self, definition: &WorkflowDefinition) {
        let Some(spec) = extract_schedule_spec(&definition.steps) else {
            return;
        };
        self.enqueue(ReconcileJob::Created {
            workflow_id: definition.id.clone(),
            workflow_name: definition.name.clone(),
            workflow_type: class_case(&definition.name),
            task_queue: identifier_name(&definition.name),
            spec,
        });
    }

    /// Reconcile after a definition update
    ///
    /// `active` carries the new activation state when the update changed
    /// it; pause/resume is applied independently of the spec branches.
    pub fn definition_updated(&self, definition: &WorkflowDefinition, active: Option<bool>) {
        self.enqueue(ReconcileJob::Updated {
            workflow_id: definition.id.clone(),
            workflow_name: definition.name.clone(),
            workflow_type: class_case(&definition.name),
            task_queue: identifier_name(&definition.name),
            spec: extract_schedule_spec(&definition.steps),
            active,
        });
    }

    /// Reconcile after a definition delete
    pub fn definition_deleted(&self, workflow_id: &str) {
        self.enqueue(ReconcileJob::Deleted {
            workflow_id: workflow_id.to_string(),
        });
    }

    /// Wait until every job enqueued so far has been processed
    pub async fn drain(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(ReconcileJob::Drain(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    fn enqueue(&self, job: ReconcileJob) {
        if self.tx.send(job).is_err() {
            tracing::warn!("Schedule reconciliation worker is gone, dropping job");
        }
    }
}

async fn run_worker(
    client: Arc<dyn SchedulerClient>,
    mut rx: mpsc::UnboundedReceiver<ReconcileJob>,
) {
    tracing::debug!("Schedule reconciliation worker started");
    while let Some(job) = rx.recv().await {
        match job {
            ReconcileJob::Drain(ack) => {
                let _ = ack.send(());
            }
            job => process(client.as_ref(), job).await,
        }
    }
    tracing::debug!("Schedule reconciliation worker stopped");
}

async fn process(client: &dyn SchedulerClient, job: ReconcileJob) {
    match job {
        ReconcileJob::Created {
            workflow_id,
            workflow_name,
            workflow_type,
            task_queue,
            spec,
        } => {
            let memo = ScheduleMemo {
                workflow_id: workflow_id.clone(),
                workflow_name,
            };
            if let Err(e) = client
                .create_schedule(&workflow_id, &workflow_type, &task_queue, &spec, Vec::new(), memo)
                .await
            {
                tracing::warn!("Failed to create schedule for workflow {}: {:#}", workflow_id, e);
            } else {
                tracing::info!("Created schedule for workflow {}", workflow_id);
            }
        }
        ReconcileJob::Updated {
            workflow_id,
            workflow_name,
            workflow_type,
            task_queue,
            spec,
            active,
        } => {
            match client.schedule_exists(&workflow_id).await {
                Ok(exists) => match (spec, exists) {
                    (Some(spec), true) => {
                        if let Err(e) = client.update_schedule(&workflow_id, &spec).await {
                            tracing::warn!(
                                "Failed to update schedule for workflow {}: {:#}",
                                workflow_id,
                                e
                            );
                        }
                    }
                    (Some(spec), false) => {
                        let memo = ScheduleMemo {
                            workflow_id: workflow_id.clone(),
                            workflow_name,
                        };
                        if let Err(e) = client
                            .create_schedule(
                                &workflow_id,
                                &workflow_type,
                                &task_queue,
                                &spec,
                                Vec::new(),
                                memo,
                            )
                            .await
                        {
                            tracing::warn!(
                                "Failed to create schedule for workflow {}: {:#}",
                                workflow_id,
                                e
                            );
                        }
                    }
                    (None, true) => {
                        // The interval trigger was removed from the definition
                        if let Err(e) = client.delete_schedule(&workflow_id).await {
                            tracing::warn!(
                                "Failed to delete schedule for workflow {}: {:#}",
                                workflow_id,
                                e
                            );
                        }
                    }
                    (None, false) => {}
                },
                Err(e) => {
                    tracing::warn!(
                        "Failed to check schedule existence for workflow {}: {:#}",
                        workflow_id,
                        e
                    );
                }
            }

            // Activation changes apply regardless of the branch outcome above
            if let Some(active) = active {
                let result = if active {
                    client.resume_schedule(&workflow_id).await
                } else {
                    client.pause_schedule(&workflow_id).await
                };
                if let Err(e) = result {
                    tracing::warn!(
                        "Failed to {} schedule for workflow {}: {:#}",
                        if active { "resume" } else { "pause" },
                        workflow_id,
                        e
                    );
                }
            }
        }
        ReconcileJob::Deleted { workflow_id } => {
            // Best effort: a missing schedule is not an error
            if let Err(e) = client.delete_schedule(&workflow_id).await {
                tracing::warn!(
                    "Failed to delete schedule for removed workflow {}: {:#}",
                    workflow_id,
                    e
                );
            }
        }
        ReconcileJob::Drain(_) => unreachable!("drain is handled by the worker loop"),
    }
}
