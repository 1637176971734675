//! Wiring of store, engine and directory

use crate::identity::Directory;
use crate::models::{Configuration, EngineSettings};
use crate::store::{JsonFileStore, StoreError, WorkflowStore};
use crate::workflow::ApprovalEngine;
use std::sync::Arc;

/// Engine and directory sharing one store
#[derive(Clone)]
pub struct Checkflow {
    pub store: Arc<dyn WorkflowStore>,
    pub engine: Arc<ApprovalEngine>,
    pub directory: Arc<Directory>,
}

impl Checkflow {
    pub fn new(store: Arc<dyn WorkflowStore>, settings: EngineSettings) -> Self {
        let directory = Arc::new(Directory::new(
            store.clone(),
            settings.max_hierarchy_depth,
        ));
        let engine = Arc::new(ApprovalEngine::new(store.clone(), settings));
        Self {
            store,
            engine,
            directory,
        }
    }

    /// Open the JSON store named by the configuration
    pub fn open(config: &Configuration) -> Result<Self, StoreError> {
        let store = JsonFileStore::new(&config.store_path)?;
        Ok(Self::new(Arc::new(store), config.engine.clone()))
    }

    pub fn in_memory(settings: EngineSettings) -> Self {
        Self::new(Arc::new(JsonFileStore::in_memory()), settings)
    }
}
