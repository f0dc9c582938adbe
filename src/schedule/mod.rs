/// Schedule Synchronizer
///
/// Derives a recurring-schedule spec from a workflow definition and keeps an
/// external scheduler engine eventually consistent with it. Reconciliation
/// is fire-and-forget: a background worker processes queued jobs and logs
/// failures instead of surfacing them to the triggering save.

// ScheduleSpec derivation from definition steps
pub mod spec;

// Scheduler engine collaborator interface
pub mod client;

// Fire-and-forget reconciliation worker
pub mod sync;

// tokio-cron-scheduler backed SchedulerClient implementation
pub mod cron;

// Call-recording SchedulerClient test double
pub mod mock;

// Re-export main types
pub use client::{ScheduleMemo, SchedulerClient};
pub use cron::{CronSchedulerService, ScheduleFired};
pub use spec::{extract_schedule_spec, ScheduleSpec};
pub use sync::ScheduleSynchronizer;
