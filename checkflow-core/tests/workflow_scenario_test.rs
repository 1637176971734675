//! Request lifecycle scenarios across the unit hierarchy

mod common;

use checkflow_core::audit::verify_trail;
use checkflow_core::models::{AuditAction, RequestFilter, RequestId, RequestStatus, Role};
use checkflow_core::workflow::ResubmitDraft;
use checkflow_core::WorkflowError;
use common::{draft, Bank};
use serde_json::json;

#[test]
fn test_regional_checker_approves_branch_request() {
    let bank = Bank::new();
    let engine = &bank.app.engine;

    let request = engine.create(&bank.maker, draft("Onboard teller")).unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.maker_unit, bank.branch_12);

    let queue = engine.pending_queue(&bank.checker_3).unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, request.id);
    assert!(engine.pending_queue(&bank.checker_9).unwrap().is_empty());

    let approved = engine
        .approve(&bank.checker_3, request.id, "verified identity")
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.reviewer, Some(bank.checker_3.user_id));
    assert_eq!(approved.remarks.as_deref(), Some("verified identity"));
    assert!(approved.reviewed_at.is_some());
    assert_eq!(approved.assigned_checker, Some(bank.checker_3.user_id));
    assert_eq!(approved.checker_unit, Some(bank.region_3));

    assert!(engine.pending_queue(&bank.checker_3).unwrap().is_empty());
}

#[test]
fn test_out_of_scope_checker_is_refused() {
    let bank = Bank::new();
    let engine = &bank.app.engine;
    let request = engine.create(&bank.maker, draft("Onboard teller")).unwrap();

    let err = engine
        .approve(&bank.checker_9, request.id, "looks fine")
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Authorization(_)));

    let err = engine
        .reject(&bank.maker, request.id, "changed my mind")
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Authorization(_)));

    let detail = engine.get_request(&bank.root, request.id).unwrap();
    assert_eq!(detail.request.status, RequestStatus::Pending);
}

#[test]
fn test_blank_remarks_leave_request_pending() {
    let bank = Bank::new();
    let engine = &bank.app.engine;
    let request = engine.create(&bank.maker, draft("Onboard teller")).unwrap();

    let err = engine.approve(&bank.checker_3, request.id, "   ").unwrap_err();
    assert!(matches!(err, WorkflowError::Validation(_)));
    assert_eq!(err.to_string(), "remarks is required");

    let detail = engine.get_request(&bank.checker_3, request.id).unwrap();
    assert_eq!(detail.request.status, RequestStatus::Pending);
    assert!(detail
        .trail
        .iter()
        .all(|e| e.action != AuditAction::Approve));
}

#[test]
fn test_terminal_requests_are_frozen() {
    let bank = Bank::new();
    let engine = &bank.app.engine;
    let request = engine.create(&bank.maker, draft("Onboard teller")).unwrap();
    engine
        .approve(&bank.checker_3, request.id, "verified identity")
        .unwrap();

    let err = engine
        .reject(&bank.checker_3, request.id, "second thoughts")
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidState {
            status: RequestStatus::Approved,
            ..
        }
    ));

    // State is reported before eligibility
    let err = engine
        .approve(&bank.checker_9, request.id, "me too")
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidState { .. }));
}

#[test]
fn test_unknown_request_is_not_found() {
    let bank = Bank::new();
    let err = bank
        .app
        .engine
        .approve(&bank.checker_3, RequestId(999), "anything")
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NotFound { entity: "request", .. }));
}

#[test]
fn test_concurrent_decisions_commit_once() {
    let bank = Bank::new();
    let engine = bank.app.engine.clone();
    // Two unit checkers in scope keep the request unassigned
    let head_checker = bank.user("C-HO", &[Role::Checker], bank.head_office);
    let request = engine.create(&bank.maker, draft("Onboard teller")).unwrap();
    assert_eq!(request.assigned_checker, None);

    let barrier = std::sync::Barrier::new(2);
    let (first, second) = std::thread::scope(|scope| {
        let a = scope.spawn(|| {
            barrier.wait();
            engine.approve(&bank.checker_3, request.id, "verified identity")
        });
        let b = scope.spawn(|| {
            barrier.wait();
            engine.reject(&head_checker, request.id, "missing documents")
        });
        (a.join().unwrap(), b.join().unwrap())
    });

    let successes = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(successes, 1);
    let failure = first.err().or(second.err()).unwrap();
    assert!(matches!(failure, WorkflowError::InvalidState { .. }));

    let detail = engine.get_request(&bank.root, request.id).unwrap();
    let terminal = detail
        .trail
        .iter()
        .filter(|e| e.action.is_terminal())
        .count();
    assert_eq!(terminal, 1);
    verify_trail(&detail.trail).unwrap();
}

#[test]
fn test_queue_only_contains_actionable_requests() {
    let bank = Bank::new();
    let engine = &bank.app.engine;
    let region_9_maker = bank.user("M-9", &[Role::Maker], bank.region_9);

    let ids: Vec<_> = (0..3)
        .map(|i| {
            engine
                .create(&bank.maker, draft(&format!("Branch change {}", i)))
                .unwrap()
                .id
        })
        .collect();
    let remote = engine
        .create(&region_9_maker, draft("Regional change"))
        .unwrap();
    engine
        .reject(&bank.checker_3, ids[1], "missing documents")
        .unwrap();

    let queue = engine.pending_queue(&bank.checker_3).unwrap();
    let queued: Vec<_> = queue.iter().map(|r| r.id).collect();
    assert_eq!(queued, vec![ids[0], ids[2]]);
    for request in &queue {
        assert_eq!(request.status, RequestStatus::Pending);
    }

    let queue_9: Vec<_> = engine
        .pending_queue(&bank.checker_9)
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(queue_9, vec![remote.id]);

    // Bypass holders see everything that is pending, oldest first
    let root_queue: Vec<_> = engine
        .pending_queue(&bank.root)
        .unwrap()
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(root_queue, vec![ids[0], ids[2], remote.id]);

    assert!(matches!(
        engine.pending_queue(&bank.maker).unwrap_err(),
        WorkflowError::Authorization(_)
    ));
}

#[test]
fn test_statistics_add_up() {
    let bank = Bank::new();
    let engine = &bank.app.engine;

    let ids: Vec<_> = (0..5)
        .map(|i| {
            engine
                .create(&bank.maker, draft(&format!("Change {}", i)))
                .unwrap()
                .id
        })
        .collect();
    engine.approve(&bank.checker_3, ids[0], "ok").unwrap();
    engine.approve(&bank.checker_3, ids[1], "ok").unwrap();
    engine.reject(&bank.checker_3, ids[2], "no").unwrap();

    let stats = engine.statistics(&bank.root).unwrap();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.approved, 2);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.pending + stats.approved + stats.rejected, stats.total);
    assert_eq!(stats.approval_rate(), 40);
    assert_eq!(stats.rejection_rate(), 20);

    let mine = engine.actor_statistics(&bank.checker_3).unwrap();
    assert_eq!(mine.approved_by_me, 2);
    assert_eq!(mine.rejected_by_me, 1);
    assert_eq!(mine.pending_for_me, 2);

    let maker_stats = engine.actor_statistics(&bank.maker).unwrap();
    assert_eq!(maker_stats.created, 5);
    assert_eq!(maker_stats.pending_for_me, 0);

    assert!(matches!(
        engine.statistics(&bank.checker_3).unwrap_err(),
        WorkflowError::Authorization(_)
    ));
}

#[test]
fn test_resubmission_links_follow_up() {
    let bank = Bank::new();
    let engine = &bank.app.engine;
    let original = engine.create(&bank.maker, draft("Onboard teller")).unwrap();

    let redo = ResubmitDraft {
        title: "Onboard teller (corrected)".to_string(),
        description: "Attached ID copy".to_string(),
        payload: json!({"employee_id": "T-77"}),
    };

    // Still pending: nothing to follow up on
    let err = engine
        .resubmit(&bank.maker, original.id, redo.clone())
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidState { .. }));

    engine
        .reject(&bank.checker_3, original.id, "missing ID copy")
        .unwrap();

    let other_maker = bank.user("M-2", &[Role::Maker], bank.branch_12);
    let err = engine
        .resubmit(&other_maker, original.id, redo.clone())
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Authorization(_)));

    let follow_up = engine.resubmit(&bank.maker, original.id, redo).unwrap();
    assert_eq!(follow_up.resubmission_of, Some(original.id));
    assert_eq!(follow_up.request_type, original.request_type);
    assert_eq!(follow_up.status, RequestStatus::Pending);
    assert!(follow_up.id > original.id);

    let original_detail = engine.get_request(&bank.root, original.id).unwrap();
    verify_trail(&original_detail.trail).unwrap();
    let resubmit = original_detail
        .trail
        .iter()
        .find(|e| e.action == AuditAction::Resubmit)
        .unwrap();
    assert_eq!(resubmit.actor, Some(bank.maker.user_id));

    let follow_up_detail = engine.get_request(&bank.root, follow_up.id).unwrap();
    assert_eq!(follow_up_detail.trail[0].action, AuditAction::Create);
    verify_trail(&follow_up_detail.trail).unwrap();
}

#[test]
fn test_views_are_audited_for_reviewers_only() {
    let bank = Bank::new();
    let engine = &bank.app.engine;
    let request = engine.create(&bank.maker, draft("Onboard teller")).unwrap();

    let as_maker = engine.get_request(&bank.maker, request.id).unwrap();
    assert!(as_maker.trail.iter().all(|e| e.action != AuditAction::View));

    let as_checker = engine.get_request(&bank.checker_3, request.id).unwrap();
    let last = as_checker.trail.last().unwrap();
    assert_eq!(last.action, AuditAction::View);
    assert_eq!(last.actor, Some(bank.checker_3.user_id));

    let err = engine
        .get_request(&bank.checker_9, request.id)
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Authorization(_)));
}

#[test]
fn test_single_scoped_checker_is_assigned_at_creation() {
    let bank = Bank::new();
    let engine = &bank.app.engine;

    let request = engine.create(&bank.maker, draft("Onboard teller")).unwrap();
    assert_eq!(request.assigned_checker, Some(bank.checker_3.user_id));
    assert_eq!(request.checker_unit, Some(bank.region_3));

    let detail = engine.get_request(&bank.root, request.id).unwrap();
    assert_eq!(detail.trail[0].action, AuditAction::Create);
    assert_eq!(detail.trail[1].action, AuditAction::Assign);
    assert_eq!(detail.trail[1].actor, None);

    // A head office checker joining later is in scope but not assigned
    let head_checker = bank.user("C-HO", &[Role::Checker], bank.head_office);
    let err = engine
        .approve(&head_checker, request.id, "verified")
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Authorization(_)));
    assert!(engine.pending_queue(&head_checker).unwrap().is_empty());

    // Bypass holders may still act; the assignment itself never changes
    let approved = engine
        .approve(&bank.root, request.id, "approved centrally")
        .unwrap();
    assert_eq!(approved.assigned_checker, Some(bank.checker_3.user_id));
    assert_eq!(approved.reviewer, Some(bank.root.user_id));
}

#[test]
fn test_several_scoped_checkers_bind_on_decision() {
    let bank = Bank::new();
    let engine = &bank.app.engine;
    let head_checker = bank.user("C-HO", &[Role::Checker], bank.head_office);

    let request = engine.create(&bank.maker, draft("Onboard teller")).unwrap();
    assert_eq!(request.assigned_checker, None);
    assert_eq!(engine.pending_queue(&head_checker).unwrap().len(), 1);
    assert_eq!(engine.pending_queue(&bank.checker_3).unwrap().len(), 1);

    let decided = engine
        .reject(&head_checker, request.id, "missing documents")
        .unwrap();
    assert_eq!(decided.assigned_checker, Some(head_checker.user_id));
    assert_eq!(decided.checker_unit, Some(bank.head_office));

    let detail = engine.get_request(&bank.root, request.id).unwrap();
    assert!(detail.trail.iter().all(|e| e.action != AuditAction::Assign));
    verify_trail(&detail.trail).unwrap();
}

#[test]
fn test_all_requests_filters_and_requires_view_all() {
    let bank = Bank::new();
    let engine = &bank.app.engine;
    let first = engine.create(&bank.maker, draft("First")).unwrap();
    let second = engine.create(&bank.maker, draft("Second")).unwrap();
    engine.approve(&bank.checker_3, first.id, "ok").unwrap();

    let pending = engine
        .all_requests(
            &bank.root,
            &RequestFilter {
                status: Some(RequestStatus::Pending),
                request_type: None,
            },
        )
        .unwrap();
    assert_eq!(pending.iter().map(|r| r.id).collect::<Vec<_>>(), vec![second.id]);

    let everything = engine
        .all_requests(&bank.root, &RequestFilter::default())
        .unwrap();
    assert_eq!(
        everything.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );

    assert!(matches!(
        engine.all_requests(&bank.checker_3, &RequestFilter::default()),
        Err(WorkflowError::Authorization(_))
    ));
}

#[test]
fn test_eligible_checkers_lists_current_reviewers() {
    let bank = Bank::new();
    let engine = &bank.app.engine;
    let request = engine.create(&bank.maker, draft("Onboard teller")).unwrap();

    let mut checkers: Vec<_> = engine
        .eligible_checkers(&bank.root, request.id)
        .unwrap()
        .into_iter()
        .map(|u| u.employee_id)
        .collect();
    checkers.sort();
    assert_eq!(checkers, vec!["C-3".to_string(), "ROOT".to_string()]);
}
