//! Audit trail data models

use crate::models::ids::{RequestId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Action recorded in a request's audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Assign,
    Approve,
    Reject,
    Resubmit,
    View,
}

impl AuditAction {
    /// Approve and reject close a request
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuditAction::Approve | AuditAction::Reject)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Assign => "ASSIGN",
            AuditAction::Approve => "APPROVE",
            AuditAction::Reject => "REJECT",
            AuditAction::Resubmit => "RESUBMIT",
            AuditAction::View => "VIEW",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit event before the store sequences it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub request_id: RequestId,
    pub action: AuditAction,
    /// None for system-generated entries
    pub actor: Option<UserId>,
    pub timestamp: DateTime<Utc>,
    pub remarks: Option<String>,
}

impl AuditEvent {
    fn new(
        request_id: RequestId,
        action: AuditAction,
        actor: Option<UserId>,
        remarks: Option<String>,
    ) -> Self {
        Self {
            request_id,
            action,
            actor,
            timestamp: Utc::now(),
            remarks,
        }
    }

    pub fn create(request_id: RequestId, maker: UserId) -> Self {
        Self::new(request_id, AuditAction::Create, Some(maker), None)
    }

    /// Routing assignment, written by the system
    pub fn assign(request_id: RequestId, checker: UserId) -> Self {
        Self::new(
            request_id,
            AuditAction::Assign,
            None,
            Some(format!("assigned to checker {}", checker)),
        )
    }

    pub fn approve(request_id: RequestId, checker: UserId, remarks: &str) -> Self {
        Self::new(
            request_id,
            AuditAction::Approve,
            Some(checker),
            Some(remarks.to_string()),
        )
    }

    pub fn reject(request_id: RequestId, checker: UserId, remarks: &str) -> Self {
        Self::new(
            request_id,
            AuditAction::Reject,
            Some(checker),
            Some(remarks.to_string()),
        )
    }

    pub fn resubmit(request_id: RequestId, maker: UserId, follow_up: RequestId) -> Self {
        Self::new(
            request_id,
            AuditAction::Resubmit,
            Some(maker),
            Some(format!("resubmitted as request {}", follow_up)),
        )
    }

    pub fn view(request_id: RequestId, viewer: UserId) -> Self {
        Self::new(request_id, AuditAction::View, Some(viewer), None)
    }

    /// Override the timestamp (imports and tests)
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Immutable, store-sequenced audit trail entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Global append sequence, breaks timestamp ties
    pub sequence: u64,
    pub request_id: RequestId,
    pub action: AuditAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<UserId>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl AuditLogEntry {
    pub fn from_event(sequence: u64, event: AuditEvent) -> Self {
        Self {
            sequence,
            request_id: event.request_id,
            action: event.action,
            actor: event.actor,
            timestamp: event.timestamp,
            remarks: event.remarks,
        }
    }
}
