//! Bearer token sessions for the HTTP binding

use crate::identity::ActorContext;
use dashmap::DashMap;
use uuid::Uuid;

/// Maps opaque bearer tokens to authenticated actors.
///
/// Sessions live in memory only; a restart logs everyone out.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, ActorContext>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for `actor` and return its token
    pub fn issue(&self, actor: ActorContext) -> Uuid {
        let token = Uuid::new_v4();
        self.sessions.insert(token, actor);
        tracing::debug!(actor = %actor.user_id, "Session issued");
        token
    }

    pub fn resolve(&self, token: &Uuid) -> Option<ActorContext> {
        self.sessions.get(token).map(|entry| *entry.value())
    }

    /// Close a session; returns whether it existed
    pub fn revoke(&self, token: &Uuid) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Extract the token from an `Authorization: Bearer <uuid>` header value
pub fn parse_bearer(header: &str) -> Option<Uuid> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Uuid::parse_str(token.trim()).ok()
}
