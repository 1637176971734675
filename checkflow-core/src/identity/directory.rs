//! User, role and unit administration

use crate::error::WorkflowError;
use crate::hierarchy::{HierarchyError, UnitHierarchy};
use crate::identity::credential::{derive_credential, verify_credential};
use crate::identity::{require_capability, resolve_actor, ActorContext};
use crate::models::{
    Capability, NewUnit, NewUser, Role, RoleInfo, Unit, UnitId, User, UserId, UserSummary,
};
use crate::services::{log_admin_action, log_security_event};
use crate::store::{StoreError, WorkflowStore};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;

const MAX_EMPLOYEE_ID_LENGTH: usize = 20;
const MAX_UNIT_CODE_LENGTH: usize = 20;
const MAX_NAME_LENGTH: usize = 255;

/// Filters for the user listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    #[serde(default)]
    pub unit: Option<UnitId>,
    #[serde(default)]
    pub active: Option<bool>,
    /// Case-insensitive match on display name or employee id
    #[serde(default)]
    pub search: Option<String>,
}

impl UserFilter {
    fn matches(&self, user: &User) -> bool {
        if self.unit.is_some() && user.unit != self.unit {
            return false;
        }
        if self.active.is_some_and(|active| user.active != active) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                user.display_name.to_lowercase().contains(&term)
                    || user.employee_id.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}

/// Profile fields an administrator may change
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
}

fn validate_employee_id(employee_id: &str) -> Result<String, WorkflowError> {
    let employee_id = employee_id.trim();
    if employee_id.is_empty() {
        return Err(WorkflowError::validation("employee id is required"));
    }
    if employee_id.chars().count() > MAX_EMPLOYEE_ID_LENGTH {
        return Err(WorkflowError::validation(format!(
            "employee id must be at most {} characters",
            MAX_EMPLOYEE_ID_LENGTH
        )));
    }
    if !employee_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(WorkflowError::validation(
            "employee id may only contain letters, digits, '-' and '_'",
        ));
    }
    Ok(employee_id.to_string())
}

fn validate_name(field: &str, value: &str) -> Result<String, WorkflowError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(WorkflowError::validation(format!("{} is required", field)));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(WorkflowError::validation(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_LENGTH
        )));
    }
    Ok(value.to_string())
}

fn validate_secret(secret: &str) -> Result<&str, WorkflowError> {
    if secret.trim().is_empty() {
        return Err(WorkflowError::validation("credential must not be empty"));
    }
    Ok(secret)
}

/// Unique-key violations are input errors from the caller's point of view
fn duplicate_as_validation(err: StoreError) -> WorkflowError {
    match err {
        StoreError::Duplicate { entity, key } => {
            WorkflowError::validation(format!("{} {} is already in use", entity, key))
        }
        other => WorkflowError::Store(other),
    }
}

/// Administrative surface over users, roles and units.
///
/// Every operation except [`Directory::bootstrap`] and
/// [`Directory::authenticate`] requires the `Administer` capability.
pub struct Directory {
    store: Arc<dyn WorkflowStore>,
    max_depth: usize,
}

impl Directory {
    pub fn new(store: Arc<dyn WorkflowStore>, max_depth: usize) -> Self {
        Self { store, max_depth }
    }

    fn require_admin(&self, actor: &ActorContext) -> Result<User, WorkflowError> {
        require_capability(self.store.as_ref(), actor, Capability::Administer)
    }

    fn load_user(&self, id: UserId) -> Result<User, WorkflowError> {
        self.store
            .get_user(id)?
            .ok_or_else(|| WorkflowError::not_found("user", id))
    }

    fn load_unit(&self, id: UnitId) -> Result<Unit, WorkflowError> {
        self.store
            .get_unit(id)?
            .ok_or_else(|| WorkflowError::not_found("unit", id))
    }

    fn active_super_admins(&self) -> Result<usize, WorkflowError> {
        Ok(self
            .store
            .list_users()?
            .iter()
            .filter(|u| u.active && u.has_role(Role::SuperAdmin))
            .count())
    }

    /// Whether removing super admin rights from `user` leaves nobody able
    /// to administer the directory
    fn is_last_super_admin(&self, user: &User) -> Result<bool, WorkflowError> {
        Ok(user.active && user.has_role(Role::SuperAdmin) && self.active_super_admins()? <= 1)
    }

    pub fn hierarchy(&self) -> Result<UnitHierarchy, WorkflowError> {
        Ok(UnitHierarchy::load(self.store.as_ref(), self.max_depth)?)
    }

    /// Create the first super admin of an empty directory
    pub fn bootstrap(
        &self,
        employee_id: &str,
        display_name: &str,
        secret: &str,
    ) -> Result<UserSummary, WorkflowError> {
        if !self.store.list_users()?.is_empty() {
            log_security_event("bootstrap_refused", None, "directory already has users");
            return Err(WorkflowError::denied("directory already initialized"));
        }

        let new_user = NewUser {
            display_name: validate_name("display name", display_name)?,
            employee_id: validate_employee_id(employee_id)?,
            designation: String::new(),
            roles: BTreeSet::from([Role::SuperAdmin]),
            unit: None,
            credential: None,
        };
        let credential = derive_credential(validate_secret(secret)?);
        let user = self
            .store
            .insert_user(new_user, Some(credential))
            .map_err(duplicate_as_validation)?;

        tracing::info!(user = %user.id, employee_id = %user.employee_id, "Directory bootstrapped");
        Ok(user.summary())
    }

    /// Exchange an employee id and secret for an actor context.
    ///
    /// Every failure is reported as the same authorization error.
    pub fn authenticate(
        &self,
        employee_id: &str,
        secret: &str,
    ) -> Result<ActorContext, WorkflowError> {
        let user = self.store.find_user_by_employee_id(employee_id)?;
        let outcome = match &user {
            None => Err("unknown employee id"),
            Some(user) => match user.credential.as_deref() {
                None => Err("account has no credential"),
                Some(stored) if !verify_credential(stored, secret) => Err("wrong credential"),
                Some(_) if !user.is_operable() => Err("account is inactive"),
                Some(_) => Ok(ActorContext::new(user.id)),
            },
        };

        outcome.map_err(|reason| {
            log_security_event("login_failed", user.as_ref().map(|u| u.id), reason);
            WorkflowError::denied(reason)
        })
    }

    /// The actor's own account; open to every operable user
    pub fn profile(&self, actor: &ActorContext) -> Result<UserSummary, WorkflowError> {
        Ok(resolve_actor(self.store.as_ref(), actor)?.summary())
    }

    pub fn create_user(
        &self,
        actor: &ActorContext,
        new_user: NewUser,
    ) -> Result<UserSummary, WorkflowError> {
        let admin = self.require_admin(actor)?;

        let employee_id = validate_employee_id(&new_user.employee_id)?;
        let display_name = validate_name("display name", &new_user.display_name)?;
        let designation = new_user.designation.trim().to_string();
        if designation.chars().count() > MAX_NAME_LENGTH {
            return Err(WorkflowError::validation(format!(
                "designation must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }
        match new_user.unit {
            Some(unit) => {
                self.load_unit(unit)?;
            }
            None if !new_user.roles.contains(&Role::SuperAdmin) => {
                return Err(WorkflowError::validation(
                    "a unit is required unless the user is a super admin",
                ));
            }
            None => {}
        }
        let credential = match new_user.credential.as_deref() {
            Some(secret) => Some(derive_credential(validate_secret(secret)?)),
            None => None,
        };

        let user = self
            .store
            .insert_user(
                NewUser {
                    display_name,
                    employee_id,
                    designation,
                    credential: None,
                    ..new_user
                },
                credential,
            )
            .map_err(duplicate_as_validation)?;

        log_admin_action("create_user", admin.id, &format!("user {}", user.id));
        Ok(user.summary())
    }

    pub fn update_user(
        &self,
        actor: &ActorContext,
        id: UserId,
        update: UserUpdate,
    ) -> Result<UserSummary, WorkflowError> {
        let admin = self.require_admin(actor)?;
        let mut user = self.load_user(id)?;

        if let Some(display_name) = update.display_name.as_deref() {
            user.display_name = validate_name("display name", display_name)?;
        }
        if let Some(designation) = update.designation.as_deref() {
            let designation = designation.trim();
            if designation.chars().count() > MAX_NAME_LENGTH {
                return Err(WorkflowError::validation(format!(
                    "designation must be at most {} characters",
                    MAX_NAME_LENGTH
                )));
            }
            user.designation = designation.to_string();
        }

        self.store.update_user(&user)?;
        log_admin_action("update_user", admin.id, &format!("user {}", user.id));
        Ok(user.summary())
    }

    /// Replace the complete role set of a user
    pub fn assign_roles(
        &self,
        actor: &ActorContext,
        id: UserId,
        roles: BTreeSet<Role>,
    ) -> Result<UserSummary, WorkflowError> {
        let admin = self.require_admin(actor)?;
        let mut user = self.load_user(id)?;

        let drops_super_admin = !roles.contains(&Role::SuperAdmin);
        if drops_super_admin && user.unit.is_none() {
            return Err(WorkflowError::validation(
                "assign a unit before removing the super admin role",
            ));
        }
        if drops_super_admin && self.is_last_super_admin(&user)? {
            return Err(WorkflowError::validation(
                "at least one active super admin must remain",
            ));
        }

        user.roles = roles;
        self.store.update_user(&user)?;
        log_admin_action(
            "assign_roles",
            admin.id,
            &format!(
                "user {} roles [{}]",
                user.id,
                user.roles
                    .iter()
                    .map(Role::as_str)
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        );
        Ok(user.summary())
    }

    /// Move a user to another unit, or detach a super admin from all units
    pub fn assign_unit(
        &self,
        actor: &ActorContext,
        id: UserId,
        unit: Option<UnitId>,
    ) -> Result<UserSummary, WorkflowError> {
        let admin = self.require_admin(actor)?;
        let mut user = self.load_user(id)?;

        match unit {
            Some(unit) => {
                self.load_unit(unit)?;
            }
            None if !user.has_role(Role::SuperAdmin) => {
                return Err(WorkflowError::validation(
                    "only super admins may be left without a unit",
                ));
            }
            None => {}
        }

        user.unit = unit;
        self.store.update_user(&user)?;
        log_admin_action("assign_unit", admin.id, &format!("user {}", user.id));
        Ok(user.summary())
    }

    pub fn deactivate_user(
        &self,
        actor: &ActorContext,
        id: UserId,
    ) -> Result<UserSummary, WorkflowError> {
        let admin = self.require_admin(actor)?;
        if admin.id == id {
            return Err(WorkflowError::validation(
                "you cannot deactivate your own account",
            ));
        }
        let mut user = self.load_user(id)?;
        if self.is_last_super_admin(&user)? {
            return Err(WorkflowError::validation(
                "at least one active super admin must remain",
            ));
        }

        user.active = false;
        self.store.update_user(&user)?;
        log_admin_action("deactivate_user", admin.id, &format!("user {}", user.id));
        Ok(user.summary())
    }

    pub fn reactivate_user(
        &self,
        actor: &ActorContext,
        id: UserId,
    ) -> Result<UserSummary, WorkflowError> {
        let admin = self.require_admin(actor)?;
        let mut user = self.load_user(id)?;

        user.active = true;
        self.store.update_user(&user)?;
        log_admin_action("reactivate_user", admin.id, &format!("user {}", user.id));
        Ok(user.summary())
    }

    pub fn reset_credential(
        &self,
        actor: &ActorContext,
        id: UserId,
        secret: &str,
    ) -> Result<(), WorkflowError> {
        let admin = self.require_admin(actor)?;
        let mut user = self.load_user(id)?;

        user.credential = Some(derive_credential(validate_secret(secret)?));
        self.store.update_user(&user)?;
        log_admin_action("reset_credential", admin.id, &format!("user {}", user.id));
        Ok(())
    }

    pub fn list_users(
        &self,
        actor: &ActorContext,
        filter: &UserFilter,
    ) -> Result<Vec<UserSummary>, WorkflowError> {
        self.require_admin(actor)?;
        let mut users: Vec<_> = self
            .store
            .list_users()?
            .iter()
            .filter(|u| filter.matches(u))
            .map(User::summary)
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    pub fn get_user(&self, actor: &ActorContext, id: UserId) -> Result<UserSummary, WorkflowError> {
        self.require_admin(actor)?;
        Ok(self.load_user(id)?.summary())
    }

    pub fn list_roles(&self, actor: &ActorContext) -> Result<Vec<RoleInfo>, WorkflowError> {
        self.require_admin(actor)?;
        Ok(Role::ALL
            .iter()
            .map(|role| RoleInfo {
                name: *role,
                description: role.description(),
            })
            .collect())
    }

    /// All units ordered by code
    pub fn list_units(&self, actor: &ActorContext) -> Result<Vec<Unit>, WorkflowError> {
        self.require_admin(actor)?;
        let mut units = self.store.list_units()?;
        units.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(units)
    }

    pub fn create_unit(&self, actor: &ActorContext, unit: NewUnit) -> Result<Unit, WorkflowError> {
        let admin = self.require_admin(actor)?;

        let code = unit.code.trim().to_string();
        if code.is_empty() {
            return Err(WorkflowError::validation("unit code is required"));
        }
        if code.chars().count() > MAX_UNIT_CODE_LENGTH {
            return Err(WorkflowError::validation(format!(
                "unit code must be at most {} characters",
                MAX_UNIT_CODE_LENGTH
            )));
        }
        let name = validate_name("unit name", &unit.name)?;
        if let Some(parent) = unit.parent {
            let hierarchy = self.hierarchy()?;
            if !hierarchy.contains(parent) {
                return Err(WorkflowError::not_found("unit", parent));
            }
            // The new unit sits one level below its parent
            if hierarchy.ancestors(parent)?.len() >= self.max_depth {
                return Err(WorkflowError::validation(format!(
                    "unit hierarchy may not be deeper than {} levels",
                    self.max_depth
                )));
            }
        }

        let created = self
            .store
            .insert_unit(NewUnit { code, name, ..unit })
            .map_err(duplicate_as_validation)?;
        log_admin_action("create_unit", admin.id, &format!("unit {}", created.code));
        Ok(created)
    }

    pub fn rename_unit(
        &self,
        actor: &ActorContext,
        id: UnitId,
        name: &str,
    ) -> Result<Unit, WorkflowError> {
        let admin = self.require_admin(actor)?;
        let mut unit = self.load_unit(id)?;

        unit.name = validate_name("unit name", name)?;
        self.store.update_unit(&unit)?;
        log_admin_action("rename_unit", admin.id, &format!("unit {}", unit.code));
        Ok(unit)
    }

    /// Re-parent a unit. Only allowed while no user or request refers to
    /// it or to any unit below it, so routing decisions already taken never
    /// change meaning.
    pub fn move_unit(
        &self,
        actor: &ActorContext,
        id: UnitId,
        parent: Option<UnitId>,
    ) -> Result<Unit, WorkflowError> {
        let admin = self.require_admin(actor)?;
        let mut unit = self.load_unit(id)?;

        let hierarchy = self.hierarchy()?;
        let mut affected: Vec<UnitId> = hierarchy.descendants(id)?.iter().map(|u| u.id).collect();
        affected.push(id);

        let referenced_by_user = self
            .store
            .list_users()?
            .iter()
            .any(|u| u.unit.is_some_and(|held| affected.contains(&held)));
        let referenced_by_request = self.store.list_requests()?.iter().any(|r| {
            affected.contains(&r.maker_unit)
                || r.checker_unit.is_some_and(|checker| affected.contains(&checker))
        });
        if referenced_by_user || referenced_by_request {
            return Err(WorkflowError::validation(format!(
                "unit {} or a unit below it is in use and cannot be moved",
                unit.code
            )));
        }

        if let Some(parent) = parent {
            if !hierarchy.contains(parent) {
                return Err(WorkflowError::not_found("unit", parent));
            }
            if hierarchy.would_create_cycle(id, parent)? {
                return Err(WorkflowError::validation(format!(
                    "moving unit {} under unit {} would create a cycle",
                    id, parent
                )));
            }
        }

        unit.parent = parent;
        let mut moved: Vec<Unit> = hierarchy
            .descendants(id)?
            .into_iter()
            .cloned()
            .collect();
        let subtree: Vec<UnitId> = moved.iter().map(|u| u.id).chain([id]).collect();
        moved.extend(
            self.store
                .list_units()?
                .into_iter()
                .filter(|u| !subtree.contains(&u.id)),
        );
        moved.push(unit.clone());
        let reshaped = UnitHierarchy::new(moved, self.max_depth);
        for member in subtree {
            match reshaped.ancestors(member) {
                Ok(_) => {}
                Err(HierarchyError::TooDeep(depth)) => {
                    return Err(WorkflowError::validation(format!(
                        "unit hierarchy may not be deeper than {} levels",
                        depth
                    )));
                }
                Err(other) => return Err(other.into()),
            }
        }

        self.store.update_unit(&unit)?;
        log_admin_action("move_unit", admin.id, &format!("unit {}", unit.code));
        Ok(unit)
    }
}
