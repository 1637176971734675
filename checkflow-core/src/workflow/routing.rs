//! Routing resolution: who may act on a request
//!
//! A reviewer is eligible when their unit is the maker's unit snapshot or
//! one of its ancestors, or when they hold the routing bypass. Hierarchy
//! faults (cycles, depth, unknown units) make a reviewer ineligible.

use crate::hierarchy::UnitHierarchy;
use crate::models::{ApprovalRequest, Capability, UnitId, User, UserId};

/// Eligibility rules evaluated against one hierarchy snapshot
pub struct Routing<'a> {
    hierarchy: &'a UnitHierarchy,
    allow_self_review: bool,
}

impl<'a> Routing<'a> {
    pub fn new(hierarchy: &'a UnitHierarchy, allow_self_review: bool) -> Self {
        Self {
            hierarchy,
            allow_self_review,
        }
    }

    /// Whether `reviewer` falls in scope of a request raised by `creator`
    /// from `maker_unit`, ignoring any assignment
    pub fn in_scope(&self, reviewer: &User, creator: UserId, maker_unit: UnitId) -> bool {
        if !reviewer.is_operable() {
            return false;
        }
        let capabilities = reviewer.capabilities();
        if !capabilities.has(Capability::ReviewRequest) {
            return false;
        }
        if !self.allow_self_review && reviewer.id == creator {
            return false;
        }
        if capabilities.has(Capability::RoutingBypass) {
            return true;
        }

        let Some(reviewer_unit) = reviewer.unit else {
            return false;
        };
        match self.hierarchy.is_ancestor_or_self(reviewer_unit, maker_unit) {
            Ok(eligible) => eligible,
            Err(err) => {
                tracing::warn!(
                    reviewer = %reviewer.id,
                    maker_unit = %maker_unit,
                    error = %err,
                    "Hierarchy walk failed, treating reviewer as ineligible"
                );
                false
            }
        }
    }

    /// Whether `reviewer` may approve or reject `request` right now.
    ///
    /// Once a request is assigned only the assigned checker (while still in
    /// scope) and routing bypass holders may act on it.
    pub fn may_act(&self, reviewer: &User, request: &ApprovalRequest) -> bool {
        if !request.is_pending() || !self.in_scope(reviewer, request.creator, request.maker_unit) {
            return false;
        }
        match request.assigned_checker {
            None => true,
            Some(assigned) if assigned == reviewer.id => true,
            Some(_) => reviewer.capabilities().has(Capability::RoutingBypass),
        }
    }

    /// Everyone in scope of a request raised by `creator` from `maker_unit`
    pub fn candidates<'u>(
        &self,
        users: &'u [User],
        creator: UserId,
        maker_unit: UnitId,
    ) -> Vec<&'u User> {
        users
            .iter()
            .filter(|u| self.in_scope(u, creator, maker_unit))
            .collect()
    }

    /// The checker to assign at creation time: the single reviewer whose
    /// unit covers the maker's unit. Bypass holders never take part, they
    /// may act on every request regardless.
    pub fn immediate_assignment<'u>(
        &self,
        users: &'u [User],
        creator: UserId,
        maker_unit: UnitId,
    ) -> Option<&'u User> {
        let scoped: Vec<_> = self
            .candidates(users, creator, maker_unit)
            .into_iter()
            .filter(|u| !u.capabilities().has(Capability::RoutingBypass))
            .collect();
        match scoped.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}
