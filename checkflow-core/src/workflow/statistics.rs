//! Statistics aggregation, always recomputed from the full request set

use crate::models::{ActorStatistics, ApprovalRequest, RequestStatus, Statistics, UserId};

pub fn aggregate(requests: &[ApprovalRequest]) -> Statistics {
    requests
        .iter()
        .fold(Statistics::default(), |mut stats, request| {
            stats.total += 1;
            match request.status {
                RequestStatus::Pending => stats.pending += 1,
                RequestStatus::Approved => stats.approved += 1,
                RequestStatus::Rejected => stats.rejected += 1,
            }
            stats
        })
}

/// Per-actor counters; `pending_for_me` is supplied by the caller because
/// it depends on routing
pub fn aggregate_for(
    requests: &[ApprovalRequest],
    actor: UserId,
    pending_for_me: usize,
) -> ActorStatistics {
    let reviewed_by_me = |status: RequestStatus| {
        requests
            .iter()
            .filter(|r| r.reviewer == Some(actor) && r.status == status)
            .count()
    };

    ActorStatistics {
        created: requests.iter().filter(|r| r.creator == actor).count(),
        pending_for_me,
        approved_by_me: reviewed_by_me(RequestStatus::Approved),
        rejected_by_me: reviewed_by_me(RequestStatus::Rejected),
    }
}
