use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{MatchStatus, VisitStatus};

/// Rejection of a lifecycle action on a match that already left `active`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Match is {} and can no longer be modified", .0.as_str())]
    NotActive(MatchStatus),
}

/// Explicit patch over the mutable match columns.
///
/// Every lifecycle write goes through one of the constructors below; there is
/// no path that merges arbitrary caller fields into a match row. `None`
/// leaves the column untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchPatch {
    pub match_status: Option<MatchStatus>,
    pub visit_scheduled: Option<bool>,
    pub visit_date: Option<DateTime<Utc>>,
    pub visit_status: Option<VisitStatus>,
    pub deal_closed: Option<bool>,
    pub deal_closed_at: Option<DateTime<Utc>>,
    pub deal_amount: Option<f64>,
    pub unmatched_at: Option<DateTime<Utc>>,
}

impl MatchPatch {
    /// Schedule (or reschedule) a property visit.
    pub fn schedule_visit(visit_date: DateTime<Utc>) -> Self {
        Self {
            visit_scheduled: Some(true),
            visit_date: Some(visit_date),
            visit_status: Some(VisitStatus::Scheduled),
            ..Self::default()
        }
    }

    /// Close the deal, moving the match to its terminal `deal_closed` state.
    pub fn close_deal(deal_amount: Option<f64>, now: DateTime<Utc>) -> Self {
        Self {
            match_status: Some(MatchStatus::DealClosed),
            deal_closed: Some(true),
            deal_closed_at: Some(now),
            deal_amount,
            ..Self::default()
        }
    }

    /// Unmatch, moving the match to its terminal `unmatched` state.
    pub fn unmatch(now: DateTime<Utc>) -> Self {
        Self {
            match_status: Some(MatchStatus::Unmatched),
            unmatched_at: Some(now),
            ..Self::default()
        }
    }
}

/// Guard shared by all lifecycle actions: they are permitted only while the
/// match is `active`. The store applies the same predicate in SQL so the
/// check-and-set stays atomic; this form exists for pre-checks and for
/// translating a no-op update into the right error.
pub fn ensure_active(status: MatchStatus) -> Result<(), LifecycleError> {
    if status.is_terminal() {
        Err(LifecycleError::NotActive(status))
    } else {
        Ok(())
    }
}
