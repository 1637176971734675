//! Approval request data models

use crate::models::ids::{RequestId, UnitId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of change a maker asks to have approved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    CreateUser,
    UpdateUser,
    DeleteUser,
    AssignRole,
    ChangeUnit,
    DeactivateUser,
}

impl RequestType {
    pub const ALL: [RequestType; 6] = [
        RequestType::CreateUser,
        RequestType::UpdateUser,
        RequestType::DeleteUser,
        RequestType::AssignRole,
        RequestType::ChangeUnit,
        RequestType::DeactivateUser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::CreateUser => "CREATE_USER",
            RequestType::UpdateUser => "UPDATE_USER",
            RequestType::DeleteUser => "DELETE_USER",
            RequestType::AssignRole => "ASSIGN_ROLE",
            RequestType::ChangeUnit => "CHANGE_UNIT",
            RequestType::DeactivateUser => "DEACTIVATE_USER",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        RequestType::ALL
            .iter()
            .find(|t| t.as_str() == normalized)
            .copied()
            .ok_or_else(|| format!("unknown request type: {}", s.trim()))
    }
}

/// Request lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    /// Waiting for a checker
    Pending,
    /// Approved by a checker (terminal)
    Approved,
    /// Rejected by a checker (terminal)
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(RequestStatus::Pending),
            "APPROVED" => Ok(RequestStatus::Approved),
            "REJECTED" => Ok(RequestStatus::Rejected),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// Maker-checker change request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: RequestId,
    pub request_type: RequestType,
    pub title: String,
    pub description: String,
    /// Opaque to the engine, interpreted by the downstream executor
    pub payload: serde_json::Value,
    pub status: RequestStatus,
    pub creator: UserId,
    /// Creator's unit at creation time, never updated
    pub maker_unit: UnitId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_checker: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checker_unit: Option<UnitId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// Rejected request this one follows up on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resubmission_of: Option<RequestId>,
    pub created_at: DateTime<Utc>,
}

impl ApprovalRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Fields of a request before the store assigns its identifier
#[derive(Debug, Clone)]
pub struct NewApprovalRequest {
    pub request_type: RequestType,
    pub title: String,
    pub description: String,
    pub payload: serde_json::Value,
    pub creator: UserId,
    pub maker_unit: UnitId,
    pub assigned_checker: Option<UserId>,
    pub checker_unit: Option<UnitId>,
    pub resubmission_of: Option<RequestId>,
    pub created_at: DateTime<Utc>,
}

impl NewApprovalRequest {
    pub fn into_request(self, id: RequestId) -> ApprovalRequest {
        ApprovalRequest {
            id,
            request_type: self.request_type,
            title: self.title,
            description: self.description,
            payload: self.payload,
            status: RequestStatus::Pending,
            creator: self.creator,
            maker_unit: self.maker_unit,
            assigned_checker: self.assigned_checker,
            checker_unit: self.checker_unit,
            reviewer: None,
            reviewed_at: None,
            remarks: None,
            resubmission_of: self.resubmission_of,
            created_at: self.created_at,
        }
    }
}

/// Optional filters for the all-requests listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RequestFilter {
    #[serde(default)]
    pub status: Option<RequestStatus>,
    #[serde(default, rename = "type")]
    pub request_type: Option<RequestType>,
}

impl RequestFilter {
    pub fn matches(&self, request: &ApprovalRequest) -> bool {
        self.status.is_none_or(|s| s == request.status)
            && self.request_type.is_none_or(|t| t == request.request_type)
    }
}
