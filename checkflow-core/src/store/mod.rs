//! Durable store abstraction
//!
//! The engine only talks to [`WorkflowStore`]. Every mutating method is a
//! single commit: a request update and the audit events it triggers land
//! together or not at all.

pub mod persistence;

pub use persistence::*;

use crate::models::{
    ApprovalRequest, AuditEvent, AuditLogEntry, NewApprovalRequest, NewUnit, NewUser, RequestId,
    Unit, UnitId, User, UserId,
};
use thiserror::Error;

/// Errors raised by store implementations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    #[error("{entity} {id} does not exist")]
    Missing { entity: &'static str, id: u64 },

    #[error("conflicting update: {0}")]
    Conflict(String),
}

/// Abstract durable store backing the workflow engine
pub trait WorkflowStore: Send + Sync {
    /// Insert a user; the store allocates the id and timestamps.
    /// `credential` is the already-derived digest.
    fn insert_user(&self, user: NewUser, credential: Option<String>) -> Result<User, StoreError>;

    fn update_user(&self, user: &User) -> Result<(), StoreError>;

    fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Case-insensitive lookup on the login identifier
    fn find_user_by_employee_id(&self, employee_id: &str) -> Result<Option<User>, StoreError>;

    fn list_users(&self) -> Result<Vec<User>, StoreError>;

    fn insert_unit(&self, unit: NewUnit) -> Result<Unit, StoreError>;

    fn update_unit(&self, unit: &Unit) -> Result<(), StoreError>;

    fn get_unit(&self, id: UnitId) -> Result<Option<Unit>, StoreError>;

    fn list_units(&self) -> Result<Vec<Unit>, StoreError>;

    /// Insert a request with its initial audit events. The store allocates
    /// the next monotonic id and re-targets the events to it.
    fn insert_request(
        &self,
        request: NewApprovalRequest,
        events: Vec<AuditEvent>,
    ) -> Result<ApprovalRequest, StoreError>;

    /// Insert the follow-up to a rejected request in one commit: the new
    /// request with its initial events, plus a RESUBMIT entry on the
    /// original naming the allocated id. `request.resubmission_of` names the
    /// original, which must still be REJECTED.
    fn insert_resubmission(
        &self,
        request: NewApprovalRequest,
        events: Vec<AuditEvent>,
    ) -> Result<ApprovalRequest, StoreError>;

    /// Replace a request and append its audit events in one commit
    fn update_request(
        &self,
        request: &ApprovalRequest,
        events: Vec<AuditEvent>,
    ) -> Result<(), StoreError>;

    fn get_request(&self, id: RequestId) -> Result<Option<ApprovalRequest>, StoreError>;

    fn list_requests(&self) -> Result<Vec<ApprovalRequest>, StoreError>;

    fn append_audit(&self, event: AuditEvent) -> Result<AuditLogEntry, StoreError>;

    /// Entries of one request ordered by timestamp, then sequence
    fn audit_trail(&self, request_id: RequestId) -> Result<Vec<AuditLogEntry>, StoreError>;
}
