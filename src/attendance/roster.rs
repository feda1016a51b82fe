use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceSession, AttendanceStatus};

/// Newest check-in first. Ties fall back to the higher id so repeated reads
/// of the same snapshot come back in the same order.
pub fn order_by_check_in_desc(sessions: &mut [AttendanceSession]) {
    sessions.sort_by(|a, b| {
        b.check_in_time
            .cmp(&a.check_in_time)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Head counts for one day's roster.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RosterSummary {
    #[schema(example = 12)]
    pub total: usize,
    #[schema(example = 10)]
    pub present: usize,
    #[schema(example = 2)]
    pub late: usize,
    #[schema(example = 4)]
    pub checked_out: usize,
    /// Checked in and not yet checked out.
    #[schema(example = 8)]
    pub on_site: usize,
}

pub fn summarize(sessions: &[AttendanceSession]) -> RosterSummary {
    sessions
        .iter()
        .fold(RosterSummary::default(), |mut summary, session| {
            summary.total += 1;
            match session.status {
                AttendanceStatus::Present => summary.present += 1,
                AttendanceStatus::Late => summary.late += 1,
            }
            if session.is_checked_out() {
                summary.checked_out += 1;
            } else {
                summary.on_site += 1;
            }
            summary
        })
}
