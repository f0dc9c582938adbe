/// tokio-cron-scheduler backed scheduler engine
///
/// A local implementation of the [`SchedulerClient`] contract: one
/// tokio-cron-scheduler job per workflow id, tracked in a uuid map so jobs
/// can be replaced or removed on reconciliation. Fired schedules emit a
/// [`ScheduleFired`] event on an mpsc channel; actually running the
/// workflow is the execution layer's business.

use crate::schedule::client::{ScheduleMemo, SchedulerClient};
use crate::schedule::spec::ScheduleSpec;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

/// Emitted whenever a schedule fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleFired {
    pub workflow_id: String,
}

/// Tracked state for one workflow's schedule
#[derive(Debug, Clone)]
struct ScheduleEntry {
    spec: ScheduleSpec,
    /// Present while a job is registered with the scheduler; paused
    /// schedules keep their entry but drop the job
    job_id: Option<Uuid>,
    paused: bool,
}

/// Local scheduler engine over tokio-cron-scheduler
pub struct CronSchedulerService {
    scheduler: Arc<RwLock<JobScheduler>>,
    entries: Arc<RwLock<HashMap<String, ScheduleEntry>>>,
    fired_tx: mpsc::UnboundedSender<ScheduleFired>,
}

impl CronSchedulerService {
    /// Create the service; schedules fire onto `fired_tx`
    pub async fn new(fired_tx: mpsc::UnboundedSender<ScheduleFired>) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            entries: Arc::new(RwLock::new(HashMap::new())),
            fired_tx,
        })
    }

    /// Start firing registered schedules
    pub async fn start(&self) -> Result<()> {
        tracing::info!("Starting cron scheduler service");
        self.scheduler.read().await.start().await?;
        Ok(())
    }

    /// Stop the scheduler and forget every schedule
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Stopping cron scheduler service");
        self.entries.write().await.clear();
        let mut scheduler = self.scheduler.write().await;
        scheduler.shutdown().await?;
        Ok(())
    }

    /// Build the job for a spec; firing sends a [`ScheduleFired`] event
    fn make_job(&self, workflow_id: &str, spec: &ScheduleSpec) -> Result<Job> {
        let fired_tx = self.fired_tx.clone();
        let workflow_id = workflow_id.to_string();
        let run = move |_uuid: Uuid,
                        _scheduler: JobScheduler|
              -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
            let fired_tx = fired_tx.clone();
            let workflow_id = workflow_id.clone();
            Box::pin(async move {
                tracing::debug!("Schedule fired for workflow {}", workflow_id);
                if fired_tx
                    .send(ScheduleFired {
                        workflow_id: workflow_id.clone(),
                    })
                    .is_err()
                {
                    tracing::warn!(
                        "No consumer for fired schedule of workflow {}",
                        workflow_id
                    );
                }
            })
        };

        let job = match spec {
            ScheduleSpec::Cron(expr) => Job::new_async(expr.as_str(), run)?,
            ScheduleSpec::IntervalSeconds(seconds) => {
                Job::new_repeated_async(Duration::from_secs(*seconds), run)?
            }
        };
        Ok(job)
    }

    async fn install(&self, workflow_id: &str, spec: &ScheduleSpec) -> Result<Uuid> {
        let job = self.make_job(workflow_id, spec)?;
        let scheduler = self.scheduler.write().await;
        let uuid = scheduler.add(job).await?;
        Ok(uuid)
    }

    async fn uninstall(&self, workflow_id: &str, job_id: &Uuid) {
        let scheduler = self.scheduler.read().await;
        if let Err(e) = scheduler.remove(job_id).await {
            tracing::warn!(
                "Failed to remove scheduler job for workflow {}: {}",
                workflow_id,
                e
            );
        }
    }
}

#[async_trait]
impl SchedulerClient for CronSchedulerService {
    async fn create_schedule(
        &self,
        id: &str,
        workflow_type: &str,
        _task_queue: &str,
        spec: &ScheduleSpec,
        _args: Vec<Value>,
        _memo: ScheduleMemo,
    ) -> Result<()> {
        // Creating over an existing schedule replaces its job
        if let Some(entry) = self.entries.write().await.remove(id) {
            if let Some(job_id) = entry.job_id {
                self.uninstall(id, &job_id).await;
            }
        }

        let job_id = self.install(id, spec).await?;
        self.entries.write().await.insert(
            id.to_string(),
            ScheduleEntry {
                spec: spec.clone(),
                job_id: Some(job_id),
                paused: false,
            },
        );
        tracing::info!("Registered schedule for workflow {} ({})", id, workflow_type);
        Ok(())
    }

    async fn update_schedule(&self, id: &str, spec: &ScheduleSpec) -> Result<()> {
        let entry = self
            .entries
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("No schedule registered for workflow {id}"))?;

        let job_id = if entry.paused {
            // Paused schedules pick the new spec up on resume
            None
        } else {
            if let Some(old) = entry.job_id {
                self.uninstall(id, &old).await;
            }
            Some(self.install(id, spec).await?)
        };

        self.entries.write().await.insert(
            id.to_string(),
            ScheduleEntry {
                spec: spec.clone(),
                job_id,
                paused: entry.paused,
            },
        );
        Ok(())
    }

    async fn pause_schedule(&self, id: &str) -> Result<()> {
        let job_id = {
            let mut entries = self.entries.write().await;
            let entry = entries
                .get_mut(id)
                .ok_or_else(|| anyhow!("No schedule registered for workflow {id}"))?;
            entry.paused = true;
            entry.job_id.take()
        };
        if let Some(job_id) = job_id {
            self.uninstall(id, &job_id).await;
        }
        tracing::info!("Paused schedule for workflow {}", id);
        Ok(())
    }

    async fn resume_schedule(&self, id: &str) -> Result<()> {
        let entry = self
            .entries
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("No schedule registered for workflow {id}"))?;
        if !entry.paused {
            return Ok(());
        }

        let job_id = self.install(id, &entry.spec).await?;
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(id) {
            entry.job_id = Some(job_id);
            entry.paused = false;
        }
        tracing::info!("Resumed schedule for workflow {}", id);
        Ok(())
    }

    async fn delete_schedule(&self, id: &str) -> Result<()> {
        // Absence is not an error: delete is best effort by contract
        if let Some(entry) = self.entries.write().await.remove(id) {
            if let Some(job_id) = entry.job_id {
                self.uninstall(id, &job_id).await;
            }
            tracing::info!("Deleted schedule for workflow {}", id);
        }
        Ok(())
    }

    async fn schedule_exists(&self, id: &str) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memo(id: &str) -> ScheduleMemo {
        ScheduleMemo {
            workflow_id: id.to_string(),
            workflow_name: "Flow".to_string(),
        }
    }

    #[tokio::test]
    async fn create_then_exists_then_delete() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let service = CronSchedulerService::new(tx).await.unwrap();

        assert!(!service.schedule_exists("wf-1").await.unwrap());
        service
            .create_schedule(
                "wf-1",
                "FlowWorkflow",
                "flow",
                &ScheduleSpec::IntervalSeconds(60),
                Vec::new(),
                memo("wf-1"),
            )
            .await
            .unwrap();
        assert!(service.schedule_exists("wf-1").await.unwrap());

        service.delete_schedule("wf-1").await.unwrap();
        assert!(!service.schedule_exists("wf-1").await.unwrap());
        // Deleting again stays silent
        service.delete_schedule("wf-1").await.unwrap();
    }

    #[tokio::test]
    async fn pause_keeps_entry_and_resume_reinstalls() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let service = CronSchedulerService::new(tx).await.unwrap();

        service
            .create_schedule(
                "wf-1",
                "FlowWorkflow",
                "flow",
                &ScheduleSpec::Cron("0 * * * * *".into()),
                Vec::new(),
                memo("wf-1"),
            )
            .await
            .unwrap();

        service.pause_schedule("wf-1").await.unwrap();
        assert!(service.schedule_exists("wf-1").await.unwrap());
        assert!(service.entries.read().await.get("wf-1").unwrap().paused);

        service.resume_schedule("wf-1").await.unwrap();
        let entry = service.entries.read().await.get("wf-1").unwrap().clone();
        assert!(!entry.paused);
        assert!(entry.job_id.is_some());
    }

    #[tokio::test]
    async fn update_on_missing_schedule_errors() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let service = CronSchedulerService::new(tx).await.unwrap();
        assert!(service
            .update_schedule("ghost", &ScheduleSpec::IntervalSeconds(60))
            .await
            .is_err());
    }
}
