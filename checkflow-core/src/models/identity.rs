//! Identity and role data models

use crate::models::ids::{UnitId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Closed set of roles a user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Originates change requests
    Maker,
    /// Reviews requests within its unit scope
    Checker,
    /// Creates and reviews anywhere, sees everything
    Admin,
    /// Administers users, roles and units
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Maker, Role::Checker, Role::Admin, Role::SuperAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Maker => "MAKER",
            Role::Checker => "CHECKER",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Maker => "Creates change requests for review",
            Role::Checker => "Approves or rejects requests raised within its unit hierarchy",
            Role::Admin => "Creates and reviews requests across all units, views statistics",
            Role::SuperAdmin => "Administers users, roles and units; reviews any request",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "MAKER" => Ok(Role::Maker),
            "CHECKER" => Ok(Role::Checker),
            "ADMIN" => Ok(Role::Admin),
            "SUPER_ADMIN" | "SUPERADMIN" => Ok(Role::SuperAdmin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Role description as exposed by the roles listing
#[derive(Debug, Clone, Serialize)]
pub struct RoleInfo {
    pub name: Role,
    pub description: &'static str,
}

/// Individual capability granted by one or more roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    CreateRequest,
    ReviewRequest,
    ViewAllRequests,
    ViewStatistics,
    RoutingBypass,
    Administer,
}

/// Additive capability set of an actor.
///
/// Capabilities are the union over every held role; no role "wins" over
/// another, so a MAKER+CHECKER user can both create and review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities(BTreeSet<Capability>);

impl Capabilities {
    pub fn from_roles<'a, I>(roles: I) -> Self
    where
        I: IntoIterator<Item = &'a Role>,
    {
        let mut set = BTreeSet::new();
        for role in roles {
            let granted: &[Capability] = match role {
                Role::Maker => &[Capability::CreateRequest],
                Role::Checker => &[Capability::ReviewRequest],
                Role::Admin => &[
                    Capability::CreateRequest,
                    Capability::ReviewRequest,
                    Capability::ViewAllRequests,
                    Capability::ViewStatistics,
                    Capability::RoutingBypass,
                ],
                Role::SuperAdmin => &[
                    Capability::ReviewRequest,
                    Capability::ViewAllRequests,
                    Capability::ViewStatistics,
                    Capability::RoutingBypass,
                    Capability::Administer,
                ],
            };
            set.extend(granted.iter().copied());
        }
        Self(set)
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.0.iter()
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    /// Unique, used as the login identifier
    pub employee_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub designation: String,
    pub roles: BTreeSet<Role>,
    /// Owning unit; only super admin accounts may have none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitId>,
    /// Soft deactivation flag, accounts are never deleted
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::from_roles(&self.roles)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Inactive accounts and accounts without roles cannot act
    pub fn is_operable(&self) -> bool {
        self.active && !self.roles.is_empty()
    }

    /// Public projection without the credential digest
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            display_name: self.display_name.clone(),
            employee_id: self.employee_id.clone(),
            designation: self.designation.clone(),
            roles: self.roles.clone(),
            unit: self.unit,
            active: self.active,
        }
    }
}

/// User as shown to API consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub display_name: String,
    pub employee_id: String,
    #[serde(default)]
    pub designation: String,
    pub roles: BTreeSet<Role>,
    #[serde(default)]
    pub unit: Option<UnitId>,
    pub active: bool,
}

/// Input for a new account
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub display_name: String,
    pub employee_id: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub roles: BTreeSet<Role>,
    #[serde(default)]
    pub unit: Option<UnitId>,
    #[serde(default)]
    pub credential: Option<String>,
}
