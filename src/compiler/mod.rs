/// Graph Compiler
///
/// Pure compilation of a workflow definition into a dependency-ordered,
/// acyclic execution plan, plus the deterministic naming transforms shared
/// with downstream code generation.

// Dependency graph construction and topological plan emission
pub mod graph;

// Deterministic naming transforms (slugs, identifiers, class names, durations)
pub mod naming;

// Activity option derivation from step parameter bags
pub mod options;

// Re-export main entry points
pub use graph::{compile, compile_steps, CompileError};
pub use naming::{class_case, identifier_name, parse_duration, slugify};
pub use options::{ActivityOptions, RetryPolicy};
