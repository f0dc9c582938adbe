/// Definition store collaborator
///
/// The control plane reads and writes workflow definitions through this
/// narrow interface; the real persistence layer lives outside the crate.
/// An in-memory implementation is provided for composition and tests.

use crate::workflow::types::WorkflowDefinition;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Narrow persistence interface for workflow definitions
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Fetch a definition by workflow id
    async fn get(&self, id: &str) -> Result<Option<WorkflowDefinition>>;

    /// Create or replace a definition
    async fn put(&self, definition: WorkflowDefinition) -> Result<()>;

    /// Remove a definition; removing a missing definition is not an error
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory definition store
#[derive(Debug, Default)]
pub struct MemoryDefinitionStore {
    definitions: RwLock<HashMap<String, WorkflowDefinition>>,
}

impl MemoryDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DefinitionStore for MemoryDefinitionStore {
    async fn get(&self, id: &str) -> Result<Option<WorkflowDefinition>> {
        Ok(self.definitions.read().await.get(id).cloned())
    }

    async fn put(&self, definition: WorkflowDefinition) -> Result<()> {
        self.definitions
            .write()
            .await
            .insert(definition.id.clone(), definition);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.definitions.write().await.remove(id);
        Ok(())
    }
}
