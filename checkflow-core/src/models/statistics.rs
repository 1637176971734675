//! Aggregate counters over the request set

use serde::Serialize;

/// Rounded percentage of `part` in `whole`, 0 when `whole` is 0
pub fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

/// Organization-wide request counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl Statistics {
    pub fn pending_rate(&self) -> u32 {
        percentage(self.pending, self.total)
    }

    pub fn approval_rate(&self) -> u32 {
        percentage(self.approved, self.total)
    }

    pub fn rejection_rate(&self) -> u32 {
        percentage(self.rejected, self.total)
    }
}

/// Counters scoped to one actor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActorStatistics {
    /// Requests the actor created
    pub created: usize,
    /// Pending requests the actor may act on
    pub pending_for_me: usize,
    pub approved_by_me: usize,
    pub rejected_by_me: usize,
}
