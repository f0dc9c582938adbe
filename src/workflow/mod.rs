/// Workflow Data Model
///
/// Shared types for the control plane:
/// - Definitions as edited by clients (WorkflowDefinition, Step, Connection)
/// - The injected trigger-kind capability table
/// - Compiled execution plans handed to the execution engine
/// - The definition-store collaborator interface

// Core workflow type definitions
pub mod types;

// Definition store collaborator trait and in-memory implementation
pub mod store;

// Re-export commonly used types
pub use store::{DefinitionStore, MemoryDefinitionStore};
pub use types::{
    Connection, ExecutionPlan, PlanStep, Step, TriggerKinds, WorkflowDefinition, INTERVAL_TRIGGER,
};
