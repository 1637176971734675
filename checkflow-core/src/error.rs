//! Error taxonomy shared by the engine and the directory

use crate::hierarchy::HierarchyError;
use crate::models::{RequestId, RequestStatus};
use crate::store::StoreError;
use thiserror::Error;

/// Errors returned by workflow and administration operations.
///
/// Every variant is terminal for the call; nothing is retried internally.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Malformed or missing input, safe to show verbatim
    #[error("{0}")]
    Validation(String),

    /// The actor may not perform this action. The reason is kept for logs
    /// only and never rendered.
    #[error("action not permitted")]
    Authorization(String),

    /// Transition attempted on a request that is no longer pending
    #[error("request {id} is already {status}")]
    InvalidState {
        id: RequestId,
        status: RequestStatus,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Store failure, propagated unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<HierarchyError> for WorkflowError {
    fn from(err: HierarchyError) -> Self {
        match err {
            HierarchyError::UnknownUnit(id) => WorkflowError::not_found("unit", id),
            other => WorkflowError::Validation(other.to_string()),
        }
    }
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation(message.into())
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        WorkflowError::Authorization(reason.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        WorkflowError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Short machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "validation_error",
            WorkflowError::Authorization(_) => "authorization_error",
            WorkflowError::InvalidState { .. } => "invalid_state",
            WorkflowError::NotFound { .. } => "not_found",
            WorkflowError::Store(_) => "store_error",
        }
    }
}
