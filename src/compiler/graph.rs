/// Dependency-graph compilation
///
/// Builds a petgraph DAG over the activity steps of a definition and emits
/// a deterministic topological plan. Edges originating from trigger steps
/// are dropped: triggers start execution, they are not prerequisites.

use crate::workflow::types::{
    Connection, ExecutionPlan, PlanStep, Step, TriggerKinds, WorkflowDefinition,
};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use thiserror::Error;

/// Compilation failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    /// A cycle is reachable from an activity step; `step_id` is the step at
    /// which the back-edge closes the cycle
    #[error("workflow graph has a cycle through step '{step_id}'")]
    Cycle { step_id: String },
}

/// Compile a definition into an execution plan
///
/// Fails with [`CompileError::Cycle`] instead of ever producing a cyclic
/// plan. The result order is deterministic for a given definition but is
/// not levelized; callers needing parallel batches derive them from
/// `depends_on`.
pub fn compile(
    definition: &WorkflowDefinition,
    triggers: &TriggerKinds,
) -> Result<ExecutionPlan, CompileError> {
    compile_steps(&definition.steps, &definition.connections, triggers)
}

/// Compile from raw steps and connections
pub fn compile_steps(
    steps: &[Step],
    connections: &[Connection],
    triggers: &TriggerKinds,
) -> Result<ExecutionPlan, CompileError> {
    // Activity steps become graph nodes in declaration order; node indices
    // therefore follow declaration order, which drives DFS root order below.
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut index_of: HashMap<&str, NodeIndex> = HashMap::new();
    for step in steps.iter().filter(|s| !triggers.is_trigger(&s.step_type)) {
        let idx = graph.add_node(step.id.clone());
        index_of.insert(step.id.as_str(), idx);
    }

    // Guard expressions land on the target step; when several incoming
    // connections carry one, the last connection wins (known edge case).
    let mut conditions: HashMap<NodeIndex, String> = HashMap::new();
    for conn in connections {
        let Some(&target) = index_of.get(conn.target.as_str()) else {
            continue;
        };
        if let Some(cond) = &conn.condition {
            conditions.insert(target, cond.clone());
        }
        // Connections from trigger steps (or unknown ids) are not dependencies
        let Some(&source) = index_of.get(conn.source.as_str()) else {
            continue;
        };
        if !graph.contains_edge(source, target) {
            graph.add_edge(source, target, ());
        }
    }

    // Depth-first topological emission: dependencies before dependents,
    // roots in declaration order.
    let mut marks = vec![Mark::Unvisited; graph.node_count()];
    let mut plan = Vec::with_capacity(graph.node_count());
    for root in graph.node_indices() {
        visit(&graph, root, &mut marks, &conditions, &mut plan)?;
    }

    Ok(ExecutionPlan { steps: plan })
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

fn visit(
    graph: &DiGraph<String, ()>,
    idx: NodeIndex,
    marks: &mut [Mark],
    conditions: &HashMap<NodeIndex, String>,
    plan: &mut Vec<PlanStep>,
) -> Result<(), CompileError> {
    match marks[idx.index()] {
        Mark::Done => return Ok(()),
        Mark::InProgress => {
            return Err(CompileError::Cycle {
                step_id: graph[idx].clone(),
            })
        }
        Mark::Unvisited => {}
    }
    marks[idx.index()] = Mark::InProgress;

    // petgraph walks incoming edges most-recent first; reverse to recover
    // connection declaration order.
    let mut deps: Vec<NodeIndex> = graph.neighbors_directed(idx, Direction::Incoming).collect();
    deps.reverse();
    for &dep in &deps {
        visit(graph, dep, marks, conditions, plan)?;
    }

    marks[idx.index()] = Mark::Done;
    plan.push(PlanStep {
        activity_id: graph[idx].clone(),
        depends_on: deps.iter().map(|&d| graph[d].clone()).collect(),
        condition: conditions.get(&idx).cloned(),
    });
    Ok(())
}
