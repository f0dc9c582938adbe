/// Loomway: workflow control plane
///
/// Compiles declarative workflow graphs into dependency-ordered execution
/// plans, reconciles recurring-schedule state against an external scheduler
/// engine, and arbitrates exclusive editing rights with an advisory
/// timeout-based lock.

// Timeout and runtime configuration
pub mod config;

// Shared workflow data model - definitions, steps, connections, plans
pub mod workflow;

// Graph compiler - pure compilation of (steps, connections) into an ExecutionPlan
pub mod compiler;

// Schedule synchronizer - derives ScheduleSpecs and reconciles scheduler state
pub mod schedule;

// Lock manager - advisory per-workflow editing locks over CAS storage
pub mod lock;

// Control plane facade consumed by the request layer
pub mod plane;

// Re-export commonly used types for external consumers
pub use compiler::{compile, CompileError};
pub use lock::{LockManager, LockRecord, LockStatus};
pub use plane::{ControlPlane, WorkflowRead};
pub use schedule::{ScheduleSpec, ScheduleSynchronizer, SchedulerClient};
pub use workflow::{Connection, ExecutionPlan, PlanStep, Step, TriggerKinds, WorkflowDefinition};
