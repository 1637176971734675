//! Approval workflow engine

use crate::audit::AuditLog;
use crate::error::WorkflowError;
use crate::hierarchy::UnitHierarchy;
use crate::identity::{require_capability, resolve_actor, ActorContext};
use crate::models::{
    ActorStatistics, ApprovalRequest, AuditEvent, AuditLogEntry, Capability, EngineSettings,
    NewApprovalRequest, RequestFilter, RequestId, RequestStatus, RequestType, Statistics, User,
    UserSummary,
};
use crate::services::{log_security_event, log_transition};
use crate::store::WorkflowStore;
use crate::workflow::locks::RequestLocks;
use crate::workflow::routing::Routing;
use crate::workflow::{statistics, validation};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Content of a new request
#[derive(Debug, Clone, Deserialize)]
pub struct RequestDraft {
    #[serde(alias = "type")]
    pub request_type: RequestType,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub payload: Value,
}

/// Content of a follow-up to a rejected request; the type is inherited
#[derive(Debug, Clone, Deserialize)]
pub struct ResubmitDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub payload: Value,
}

/// A request together with its audit history
#[derive(Debug, Clone, Serialize)]
pub struct RequestDetail {
    pub request: ApprovalRequest,
    pub trail: Vec<AuditLogEntry>,
}

/// Terminal review decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn status(self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject => RequestStatus::Rejected,
        }
    }
}

/// Maker-checker request engine.
///
/// All operations are synchronous and take the calling actor explicitly.
/// The actor's roles, unit and active flag are re-read from the store on
/// every call.
pub struct ApprovalEngine {
    store: Arc<dyn WorkflowStore>,
    audit: AuditLog,
    settings: EngineSettings,
    locks: RequestLocks,
}

impl ApprovalEngine {
    pub fn new(store: Arc<dyn WorkflowStore>, settings: EngineSettings) -> Self {
        Self {
            audit: AuditLog::new(store.clone()),
            store,
            settings,
            locks: RequestLocks::new(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn hierarchy(&self) -> Result<UnitHierarchy, WorkflowError> {
        Ok(UnitHierarchy::load(
            self.store.as_ref(),
            self.settings.max_hierarchy_depth,
        )?)
    }

    fn load_request(&self, id: RequestId) -> Result<ApprovalRequest, WorkflowError> {
        self.store
            .get_request(id)?
            .ok_or_else(|| WorkflowError::not_found("request", id))
    }

    fn denied(actor: &User, reason: String) -> WorkflowError {
        log_security_event("authorization_denied", Some(actor.id), &reason);
        WorkflowError::denied(reason)
    }

    /// Validate and commit a new PENDING request with its CREATE entry and,
    /// when exactly one reviewer is in scope, its ASSIGN entry. Follow-ups
    /// also append RESUBMIT to the original in the same commit.
    fn open_request(
        &self,
        maker: &User,
        request_type: RequestType,
        title: &str,
        description: &str,
        payload: Value,
        resubmission_of: Option<RequestId>,
    ) -> Result<ApprovalRequest, WorkflowError> {
        let title = validation::required_text("title", title, self.settings.max_title_length)?;
        let description = validation::required_text(
            "description",
            description,
            self.settings.max_description_length,
        )?;
        let payload = validation::payload(payload)?;
        let Some(maker_unit) = maker.unit else {
            return Err(WorkflowError::validation(
                "a unit assignment is required to create requests",
            ));
        };

        let hierarchy = self.hierarchy()?;
        if !hierarchy.contains(maker_unit) {
            return Err(WorkflowError::not_found("unit", maker_unit));
        }
        let users = self.store.list_users()?;
        let routing = Routing::new(&hierarchy, self.settings.allow_self_review);
        let assigned = routing.immediate_assignment(&users, maker.id, maker_unit);

        // The store re-targets these to the allocated id
        let placeholder = RequestId(0);
        let mut events = vec![AuditEvent::create(placeholder, maker.id)];
        if let Some(checker) = assigned {
            events.push(AuditEvent::assign(placeholder, checker.id));
        }

        let new_request = NewApprovalRequest {
            request_type,
            title,
            description,
            payload,
            creator: maker.id,
            maker_unit,
            assigned_checker: assigned.map(|c| c.id),
            checker_unit: assigned.and_then(|c| c.unit),
            resubmission_of,
            created_at: Utc::now(),
        };
        // A follow-up and the RESUBMIT entry on its original share one commit
        let request = match resubmission_of {
            Some(_) => self.store.insert_resubmission(new_request, events)?,
            None => self.store.insert_request(new_request, events)?,
        };

        tracing::info!(
            request = %request.id,
            request_type = %request.request_type,
            maker = %maker.id,
            assigned = ?request.assigned_checker,
            "Request created"
        );
        Ok(request)
    }

    /// Submit a new request for review
    pub fn create(
        &self,
        actor: &ActorContext,
        draft: RequestDraft,
    ) -> Result<ApprovalRequest, WorkflowError> {
        let maker = require_capability(self.store.as_ref(), actor, Capability::CreateRequest)?;
        self.open_request(
            &maker,
            draft.request_type,
            &draft.title,
            &draft.description,
            draft.payload,
            None,
        )
    }

    pub fn approve(
        &self,
        actor: &ActorContext,
        id: RequestId,
        remarks: &str,
    ) -> Result<ApprovalRequest, WorkflowError> {
        self.decide(actor, id, remarks, Decision::Approve)
    }

    pub fn reject(
        &self,
        actor: &ActorContext,
        id: RequestId,
        remarks: &str,
    ) -> Result<ApprovalRequest, WorkflowError> {
        self.decide(actor, id, remarks, Decision::Reject)
    }

    /// Terminal transition. Existence and PENDING status are checked first,
    /// then eligibility, then remarks; the whole read-check-write runs under
    /// the request lock.
    fn decide(
        &self,
        actor: &ActorContext,
        id: RequestId,
        remarks: &str,
        decision: Decision,
    ) -> Result<ApprovalRequest, WorkflowError> {
        self.locks.with_lock(id, || -> Result<_, WorkflowError> {
            let mut request = self.load_request(id)?;
            if !request.is_pending() {
                return Err(WorkflowError::InvalidState {
                    id,
                    status: request.status,
                });
            }

            let reviewer = resolve_actor(self.store.as_ref(), actor)?;
            let hierarchy = self.hierarchy()?;
            let routing = Routing::new(&hierarchy, self.settings.allow_self_review);
            if !routing.may_act(&reviewer, &request) {
                return Err(Self::denied(
                    &reviewer,
                    format!("not eligible to review request {}", id),
                ));
            }

            let remarks =
                validation::required_text("remarks", remarks, self.settings.max_remarks_length)?;

            let now = Utc::now();
            if request.assigned_checker.is_none() {
                request.assigned_checker = Some(reviewer.id);
                request.checker_unit = reviewer.unit;
            }
            request.status = decision.status();
            request.reviewer = Some(reviewer.id);
            request.reviewed_at = Some(now);
            request.remarks = Some(remarks.clone());

            let event = match decision {
                Decision::Approve => AuditEvent::approve(id, reviewer.id, &remarks),
                Decision::Reject => AuditEvent::reject(id, reviewer.id, &remarks),
            }
            .at(now);
            if let Err(err) = self.store.update_request(&request, vec![event]) {
                // Another process sharing the store may have decided first
                return Err(match self.store.get_request(id)? {
                    Some(current) if !current.is_pending() => WorkflowError::InvalidState {
                        id,
                        status: current.status,
                    },
                    _ => err.into(),
                });
            }

            log_transition(id, reviewer.id, RequestStatus::Pending, request.status);
            Ok(request)
        })
    }

    /// Raise a follow-up to one of the actor's rejected requests
    pub fn resubmit(
        &self,
        actor: &ActorContext,
        original_id: RequestId,
        draft: ResubmitDraft,
    ) -> Result<ApprovalRequest, WorkflowError> {
        let original = self.load_request(original_id)?;
        let maker = require_capability(self.store.as_ref(), actor, Capability::CreateRequest)?;
        if original.creator != maker.id {
            return Err(Self::denied(
                &maker,
                format!("request {} belongs to another maker", original_id),
            ));
        }
        if original.status != RequestStatus::Rejected {
            return Err(WorkflowError::InvalidState {
                id: original_id,
                status: original.status,
            });
        }

        let follow_up = self.open_request(
            &maker,
            original.request_type,
            &draft.title,
            &draft.description,
            draft.payload,
            Some(original_id),
        )?;

        tracing::info!(
            original = %original_id,
            follow_up = %follow_up.id,
            maker = %maker.id,
            "Request resubmitted"
        );
        Ok(follow_up)
    }

    /// Full detail with audit trail. Reviewers and administrators leave a
    /// VIEW entry behind.
    pub fn get_request(
        &self,
        actor: &ActorContext,
        id: RequestId,
    ) -> Result<RequestDetail, WorkflowError> {
        let request = self.load_request(id)?;
        let viewer = resolve_actor(self.store.as_ref(), actor)?;
        let capabilities = viewer.capabilities();

        let hierarchy = self.hierarchy()?;
        let routing = Routing::new(&hierarchy, self.settings.allow_self_review);
        let allowed = request.creator == viewer.id
            || capabilities.has(Capability::ViewAllRequests)
            || request.reviewer == Some(viewer.id)
            || request.assigned_checker == Some(viewer.id)
            || routing.in_scope(&viewer, request.creator, request.maker_unit);
        if !allowed {
            return Err(Self::denied(
                &viewer,
                format!("not permitted to view request {}", id),
            ));
        }

        if capabilities.has(Capability::ReviewRequest)
            || capabilities.has(Capability::ViewAllRequests)
        {
            self.audit.record(AuditEvent::view(id, viewer.id))?;
        }

        let trail = self.audit.trail(id)?;
        Ok(RequestDetail { request, trail })
    }

    /// Requests created by the actor, newest first
    pub fn my_requests(&self, actor: &ActorContext) -> Result<Vec<ApprovalRequest>, WorkflowError> {
        let user = resolve_actor(self.store.as_ref(), actor)?;
        let mut requests: Vec<_> = self
            .store
            .list_requests()?
            .into_iter()
            .filter(|r| r.creator == user.id)
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    fn queue_for(&self, reviewer: &User) -> Result<Vec<ApprovalRequest>, WorkflowError> {
        let hierarchy = self.hierarchy()?;
        let routing = Routing::new(&hierarchy, self.settings.allow_self_review);
        let mut queue: Vec<_> = self
            .store
            .list_requests()?
            .into_iter()
            .filter(|r| routing.may_act(reviewer, r))
            .collect();
        queue.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(queue)
    }

    /// PENDING requests the actor may act on, oldest first
    pub fn pending_queue(
        &self,
        actor: &ActorContext,
    ) -> Result<Vec<ApprovalRequest>, WorkflowError> {
        let reviewer = require_capability(self.store.as_ref(), actor, Capability::ReviewRequest)?;
        self.queue_for(&reviewer)
    }

    /// Every request, newest first, optionally filtered
    pub fn all_requests(
        &self,
        actor: &ActorContext,
        filter: &RequestFilter,
    ) -> Result<Vec<ApprovalRequest>, WorkflowError> {
        require_capability(self.store.as_ref(), actor, Capability::ViewAllRequests)?;
        let mut requests: Vec<_> = self
            .store
            .list_requests()?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    pub fn statistics(&self, actor: &ActorContext) -> Result<Statistics, WorkflowError> {
        require_capability(self.store.as_ref(), actor, Capability::ViewStatistics)?;
        Ok(statistics::aggregate(&self.store.list_requests()?))
    }

    pub fn actor_statistics(&self, actor: &ActorContext) -> Result<ActorStatistics, WorkflowError> {
        let user = resolve_actor(self.store.as_ref(), actor)?;
        let pending_for_me = if user.capabilities().has(Capability::ReviewRequest) {
            self.queue_for(&user)?.len()
        } else {
            0
        };
        Ok(statistics::aggregate_for(
            &self.store.list_requests()?,
            user.id,
            pending_for_me,
        ))
    }

    /// Reviewers who could act on a request right now
    pub fn eligible_checkers(
        &self,
        actor: &ActorContext,
        id: RequestId,
    ) -> Result<Vec<UserSummary>, WorkflowError> {
        require_capability(self.store.as_ref(), actor, Capability::ViewAllRequests)?;
        let request = self.load_request(id)?;
        let hierarchy = self.hierarchy()?;
        let routing = Routing::new(&hierarchy, self.settings.allow_self_review);
        Ok(self
            .store
            .list_users()?
            .iter()
            .filter(|u| routing.may_act(u, &request))
            .map(User::summary)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUnit, NewUser, Role, UnitId, UnitType};
    use crate::store::JsonFileStore;
    use std::collections::BTreeSet;

    struct Fixture {
        engine: ApprovalEngine,
        store: Arc<dyn WorkflowStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let store: Arc<dyn WorkflowStore> = Arc::new(JsonFileStore::in_memory());
            let engine = ApprovalEngine::new(store.clone(), EngineSettings::default());
            let ho = store
                .insert_unit(NewUnit {
                    code: "HO".to_string(),
                    name: "HO".to_string(),
                    unit_type: UnitType::HeadOffice,
                    parent: None,
                })
                .unwrap();
            store
                .insert_unit(NewUnit {
                    code: "BR1".to_string(),
                    name: "Branch-1".to_string(),
                    unit_type: UnitType::Branch,
                    parent: Some(ho.id),
                })
                .unwrap();
            Self { engine, store }
        }

        fn user(&self, employee_id: &str, roles: &[Role], unit: Option<u64>) -> ActorContext {
            let user = self
                .store
                .insert_user(
                    NewUser {
                        display_name: employee_id.to_string(),
                        employee_id: employee_id.to_string(),
                        designation: String::new(),
                        roles: roles.iter().copied().collect::<BTreeSet<_>>(),
                        unit: unit.map(UnitId),
                        credential: None,
                    },
                    None,
                )
                .unwrap();
            ActorContext::new(user.id)
        }
    }

    fn draft(title: &str) -> RequestDraft {
        RequestDraft {
            request_type: RequestType::CreateUser,
            title: title.to_string(),
            description: "details".to_string(),
            payload: Value::Null,
        }
    }

    #[test]
    fn test_create_requires_create_capability() {
        let fx = Fixture::new();
        let checker = fx.user("C-1", &[Role::Checker], Some(1));
        let err = fx.engine.create(&checker, draft("x")).unwrap_err();
        assert!(matches!(err, WorkflowError::Authorization(_)));
    }

    #[test]
    fn test_create_validates_fields() {
        let fx = Fixture::new();
        let maker = fx.user("M-1", &[Role::Maker], Some(2));
        let err = fx.engine.create(&maker, draft("   ")).unwrap_err();
        assert_eq!(err.to_string(), "title is required");

        let mut bad_payload = draft("ok");
        bad_payload.payload = serde_json::json!([1]);
        assert!(matches!(
            fx.engine.create(&maker, bad_payload),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn test_single_candidate_is_assigned_immediately() {
        let fx = Fixture::new();
        let maker = fx.user("M-1", &[Role::Maker], Some(2));
        let checker = fx.user("C-1", &[Role::Checker], Some(1));

        let request = fx.engine.create(&maker, draft("Onboard")).unwrap();
        assert_eq!(request.assigned_checker, Some(checker.user_id));
        assert_eq!(request.checker_unit, Some(UnitId(1)));
        assert_eq!(request.payload, serde_json::json!({}));

        let trail = fx.store.audit_trail(request.id).unwrap();
        let actions: Vec<_> = trail.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![crate::models::AuditAction::Create, crate::models::AuditAction::Assign]
        );
        assert!(trail[1].actor.is_none());
    }

    #[test]
    fn test_late_binding_on_decision() {
        let fx = Fixture::new();
        let maker = fx.user("M-1", &[Role::Maker], Some(2));
        let first = fx.user("C-1", &[Role::Checker], Some(1));
        fx.user("C-2", &[Role::Checker], Some(2));

        let request = fx.engine.create(&maker, draft("Onboard")).unwrap();
        assert!(request.assigned_checker.is_none());

        let done = fx.engine.reject(&first, request.id, "incomplete").unwrap();
        assert_eq!(done.assigned_checker, Some(first.user_id));
        assert_eq!(done.reviewer, Some(first.user_id));
        assert_eq!(done.status, RequestStatus::Rejected);
    }

    #[test]
    fn test_terminal_check_precedes_authorization() {
        let fx = Fixture::new();
        let maker = fx.user("M-1", &[Role::Maker], Some(2));
        let checker = fx.user("C-1", &[Role::Checker], Some(1));
        let request = fx.engine.create(&maker, draft("Onboard")).unwrap();
        fx.engine.approve(&checker, request.id, "fine").unwrap();

        // Even a maker without review rights sees the state error
        let err = fx.engine.reject(&maker, request.id, "late").unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState { .. }));
    }

    #[test]
    fn test_unknown_request() {
        let fx = Fixture::new();
        let checker = fx.user("C-1", &[Role::Checker], Some(1));
        let err = fx.engine.approve(&checker, RequestId(404), "ok").unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound { .. }));
        assert!(fx.engine.locks.is_empty());
    }

    #[test]
    fn test_refused_decisions_leave_no_lock_entries() {
        let fx = Fixture::new();
        let maker = fx.user("M-1", &[Role::Maker], Some(2));
        let checker = fx.user("C-1", &[Role::Checker], Some(1));
        let request = fx.engine.create(&maker, draft("Onboard")).unwrap();

        for id in 1000..1050 {
            let _ = fx.engine.approve(&checker, RequestId(id), "ok");
        }
        assert!(fx.engine.approve(&maker, request.id, "mine").is_err());
        assert!(fx.engine.reject(&checker, request.id, "  ").is_err());
        assert!(fx.engine.locks.is_empty());

        fx.engine.approve(&checker, request.id, "fine").unwrap();
        assert!(fx.engine.locks.is_empty());
    }

    #[test]
    fn test_resubmission_is_a_single_commit() {
        let fx = Fixture::new();
        let maker = fx.user("M-1", &[Role::Maker], Some(2));
        let checker = fx.user("C-1", &[Role::Checker], Some(1));
        let original = fx.engine.create(&maker, draft("Onboard")).unwrap();

        let follow_up = ResubmitDraft {
            title: "Onboard again".to_string(),
            description: "fixed".to_string(),
            payload: Value::Null,
        };
        // Still pending: nothing may be stored
        let err = fx
            .engine
            .resubmit(&maker, original.id, follow_up.clone())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState { .. }));
        assert_eq!(fx.store.list_requests().unwrap().len(), 1);

        fx.engine.reject(&checker, original.id, "typo").unwrap();
        let next = fx.engine.resubmit(&maker, original.id, follow_up).unwrap();
        assert_eq!(next.resubmission_of, Some(original.id));

        let trail = fx.store.audit_trail(original.id).unwrap();
        let resubmits: Vec<_> = trail
            .iter()
            .filter(|e| e.action == crate::models::AuditAction::Resubmit)
            .collect();
        assert_eq!(resubmits.len(), 1);
        assert!(resubmits[0]
            .remarks
            .as_deref()
            .unwrap_or_default()
            .contains(&next.id.to_string()));
    }

    #[test]
    fn test_maker_view_leaves_no_view_entry() {
        let fx = Fixture::new();
        let maker = fx.user("M-1", &[Role::Maker], Some(2));
        let request = fx.engine.create(&maker, draft("Onboard")).unwrap();

        let detail = fx.engine.get_request(&maker, request.id).unwrap();
        assert_eq!(detail.trail.len(), 1);
    }
}
