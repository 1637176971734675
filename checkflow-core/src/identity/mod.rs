//! Actors, credentials and the user/unit directory

pub mod credential;
pub mod directory;

pub use credential::{derive_credential, verify_credential};
pub use directory::{Directory, UserFilter, UserUpdate};

use crate::error::WorkflowError;
use crate::models::{Capability, User, UserId};
use crate::services::log_security_event;
use crate::store::WorkflowStore;
use serde::{Deserialize, Serialize};

/// Identity of the caller of an operation.
///
/// Only the user id is carried; roles, unit and the active flag are looked
/// up again on every call so that revocations apply immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: UserId,
}

impl ActorContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

/// Load the current state of the actor, refusing unknown, inactive and
/// role-less accounts
pub fn resolve_actor(
    store: &dyn WorkflowStore,
    actor: &ActorContext,
) -> Result<User, WorkflowError> {
    let Some(user) = store.get_user(actor.user_id)? else {
        log_security_event("unknown_actor", Some(actor.user_id), "actor does not exist");
        return Err(WorkflowError::denied("unknown actor"));
    };
    if !user.is_operable() {
        log_security_event(
            "inactive_actor",
            Some(user.id),
            "account is inactive or holds no roles",
        );
        return Err(WorkflowError::denied("inactive actor"));
    }
    Ok(user)
}

/// Resolve the actor and require `capability`
pub fn require_capability(
    store: &dyn WorkflowStore,
    actor: &ActorContext,
    capability: Capability,
) -> Result<User, WorkflowError> {
    let user = resolve_actor(store, actor)?;
    if !user.capabilities().has(capability) {
        log_security_event(
            "capability_denied",
            Some(user.id),
            &format!("missing capability {:?}", capability),
        );
        return Err(WorkflowError::denied(format!(
            "missing capability {:?}",
            capability
        )));
    }
    Ok(user)
}
