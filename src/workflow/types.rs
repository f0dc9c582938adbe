/// Core workflow type definitions
///
/// Defines the structures the control plane operates on. Definitions are
/// serialized/deserialized as JSON by the (out-of-scope) persistence layer,
/// so every type here derives serde traits.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Type tag of the trigger kind that drives recurring schedules.
pub const INTERVAL_TRIGGER: &str = "interval";

/// A complete workflow definition: steps plus the connections between them
///
/// Step ids are unique within a definition and connections reference
/// existing step ids; the editor enforces this before a save reaches us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Unique workflow identifier
    pub id: String,
    /// Human-readable workflow name, also the seed for generated names
    pub name: String,
    /// Steps in declaration order
    pub steps: Vec<Step>,
    /// Directed connections between steps
    pub connections: Vec<Connection>,
}

/// A single step in a workflow definition
///
/// A step is either a trigger (starts execution) or an activity (performs
/// work); the distinction is made by the `TriggerKinds` table, not by the
/// step itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Unique step identifier within the workflow
    pub id: String,
    /// Free-form type tag (e.g. "manual", "interval", "http_request")
    pub step_type: String,
    /// Display name
    pub name: String,
    /// Step-specific configuration parameters as flexible JSON
    #[serde(default)]
    pub params: Value,
}

/// A directed connection from one step to another
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Source step id
    pub source: String,
    /// Target step id
    pub target: String,
    /// Optional guard expression; recorded on the target step at compile time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// Capability table mapping step type tags to trigger classification
///
/// Replaces a hidden module-level constant set: callers inject the table
/// into the compiler and synchronizer, preserving the closed set of trigger
/// kinds without global state.
#[derive(Debug, Clone)]
pub struct TriggerKinds(HashSet<String>);

impl TriggerKinds {
    /// Build a table from an explicit set of trigger type tags
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(kinds.into_iter().map(Into::into).collect())
    }

    /// The built-in closed set: manual, webhook and interval triggers
    pub fn builtin() -> Self {
        Self::new(["manual", "webhook", INTERVAL_TRIGGER])
    }

    /// Whether the given step type tag starts execution rather than
    /// performing work
    pub fn is_trigger(&self, step_type: &str) -> bool {
        self.0.contains(step_type)
    }
}

impl Default for TriggerKinds {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Compiled, dependency-ordered, acyclic list of activity steps
///
/// Plan order is a topological order: every `depends_on` entry of a step
/// precedes that step. Trigger steps never appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub steps: Vec<PlanStep>,
}

/// One activity step in an execution plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Id of the activity step this plan entry executes
    pub activity_id: String,
    /// Activity ids that must complete before this step runs
    pub depends_on: Vec<String>,
    /// Guard expression carried by an incoming connection, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}
