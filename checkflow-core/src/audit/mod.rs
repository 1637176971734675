//! Append-only audit log
//!
//! Entries are only ever added through the store. Nothing here updates or
//! deletes an entry.

use crate::error::WorkflowError;
use crate::models::{AuditAction, AuditEvent, AuditLogEntry, RequestId};
use crate::store::WorkflowStore;
use std::sync::Arc;
use thiserror::Error;

/// Shape violations found by [`verify_trail`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrailViolation {
    #[error("trail is empty")]
    Empty,

    #[error("trail starts with {0} instead of CREATE")]
    FirstNotCreate(AuditAction),

    #[error("trail contains more than one CREATE")]
    DuplicateCreate,

    #[error("trail contains more than one ASSIGN")]
    DuplicateAssign,

    #[error("trail contains more than one terminal entry")]
    MultipleTerminal,

    #[error("{0} recorded after the terminal entry")]
    AfterTerminal(AuditAction),
}

/// Check that a trail reads as one coherent request history: a single
/// CREATE first, at most one ASSIGN, at most one APPROVE/REJECT, and only
/// VIEW or RESUBMIT after it.
pub fn verify_trail(entries: &[AuditLogEntry]) -> Result<(), TrailViolation> {
    let first = entries.first().ok_or(TrailViolation::Empty)?;
    if first.action != AuditAction::Create {
        return Err(TrailViolation::FirstNotCreate(first.action));
    }

    let mut assigned = false;
    let mut terminal = false;
    for entry in &entries[1..] {
        match entry.action {
            AuditAction::Create => return Err(TrailViolation::DuplicateCreate),
            AuditAction::Approve | AuditAction::Reject if terminal => {
                return Err(TrailViolation::MultipleTerminal)
            }
            AuditAction::Approve | AuditAction::Reject => terminal = true,
            AuditAction::Assign if terminal => {
                return Err(TrailViolation::AfterTerminal(entry.action))
            }
            AuditAction::Assign if assigned => return Err(TrailViolation::DuplicateAssign),
            AuditAction::Assign => assigned = true,
            AuditAction::View | AuditAction::Resubmit => {}
        }
    }

    Ok(())
}

/// Store-backed audit log
pub struct AuditLog {
    store: Arc<dyn WorkflowStore>,
}

impl AuditLog {
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        Self { store }
    }

    /// Append a standalone event (VIEW, RESUBMIT). Entries tied to a state
    /// change are committed together with the request instead.
    pub fn record(&self, event: AuditEvent) -> Result<AuditLogEntry, WorkflowError> {
        let entry = self.store.append_audit(event)?;
        tracing::debug!(
            request = %entry.request_id,
            action = %entry.action,
            sequence = entry.sequence,
            "Audit entry recorded"
        );
        Ok(entry)
    }

    /// Entries of a request, oldest first
    pub fn trail(&self, request_id: RequestId) -> Result<Vec<AuditLogEntry>, WorkflowError> {
        Ok(self.store.audit_trail(request_id)?)
    }
}
