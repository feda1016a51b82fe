use chrono::{DateTime, FixedOffset, NaiveDate, SubsecRound, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    clock::Clock,
    error::AttendanceError,
    geo::{self, GeoPoint},
    policy::{GeoFencePolicy, RadiusPolicy},
    roster::{self, RosterSummary},
};
use crate::model::attendance::{AttendanceSession, NewSession};
use crate::store::{AttendanceStore, BranchRegistry, InsertOutcome};

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Check-in / check-out lifecycle for one employee per calendar day:
/// `NoSession -> CheckedIn -> CheckedOut`, with no way back.
pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
    branches: Arc<dyn BranchRegistry>,
    policy: Arc<dyn GeoFencePolicy>,
    clock: Arc<dyn Clock>,
    /// Offset in which "today" is evaluated.
    day_offset: FixedOffset,
}

impl AttendanceService {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        branches: Arc<dyn BranchRegistry>,
        clock: Arc<dyn Clock>,
        day_offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            branches,
            policy: Arc::new(RadiusPolicy),
            clock,
            day_offset,
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn GeoFencePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Calendar day an instant falls on in the configured offset.
    pub fn calendar_day(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.day_offset).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.calendar_day(self.now())
    }

    #[instrument(skip(self, reported_location))]
    pub async fn check_in(
        &self,
        employee_id: u64,
        branch_id: u64,
        reported_location: GeoPoint,
        now: DateTime<Utc>,
    ) -> Result<AttendanceSession, AttendanceError> {
        // stored with millisecond precision
        let now = now.trunc_subsecs(3);

        let branch = self
            .branches
            .get_branch(branch_id)
            .await?
            .ok_or(AttendanceError::UnknownBranch(branch_id))?;

        let distance_meters = geo::distance_meters(reported_location, branch.coordinates());
        let status = self
            .policy
            .classify(distance_meters, branch.geo_fence_radius);
        let date = self.calendar_day(now);

        let new = NewSession {
            employee_id,
            branch_id,
            date,
            check_in_time: now,
            reported_location,
            distance_meters,
            status,
        };

        match self.store.insert_if_absent(new).await? {
            InsertOutcome::Inserted(session) => {
                info!(
                    session_id = session.id,
                    %date,
                    distance_meters,
                    radius = branch.geo_fence_radius,
                    status = %status,
                    "Checked in"
                );
                Ok(session)
            }
            InsertOutcome::AlreadyExists => {
                warn!(%date, "Duplicate check-in rejected");
                Err(AttendanceError::DuplicateCheckIn { employee_id, date })
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn check_out(
        &self,
        session_id: u64,
        now: DateTime<Utc>,
    ) -> Result<AttendanceSession, AttendanceError> {
        let now = now.trunc_subsecs(3);

        let mut session = self
            .store
            .find(session_id)
            .await?
            .ok_or(AttendanceError::NoActiveSession(session_id))?;

        if session.is_checked_out() {
            return Err(AttendanceError::AlreadyCheckedOut(session_id));
        }

        if now <= session.check_in_time {
            warn!(check_in = %session.check_in_time, "Check-out is not after check-in");
            return Err(AttendanceError::InvalidTimestamp {
                check_in: session.check_in_time,
                check_out: now,
            });
        }

        let hours = worked_hours(session.check_in_time, now);

        // a concurrent check-out may have closed it since the read above
        if !self.store.close(session_id, now, hours).await? {
            return Err(AttendanceError::AlreadyCheckedOut(session_id));
        }

        session.check_out_time = Some(now);
        session.worked_hours = Some(hours);

        info!(employee_id = session.employee_id, worked_hours = hours, "Checked out");
        Ok(session)
    }

    pub async fn session(&self, id: u64) -> Result<Option<AttendanceSession>, AttendanceError> {
        Ok(self.store.find(id).await?)
    }

    /// Point-in-time roster for a day, newest check-in first.
    pub async fn list_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceSession>, AttendanceError> {
        let mut sessions = self.store.list_for_date(date).await?;
        roster::order_by_check_in_desc(&mut sessions);
        Ok(sessions)
    }

    pub async fn summary_for_date(&self, date: NaiveDate) -> Result<RosterSummary, AttendanceError> {
        let sessions = self.store.list_for_date(date).await?;
        Ok(roster::summarize(&sessions))
    }
}

/// Hours between two instants, rounded half-up to two decimals.
/// `check_out` must be after `check_in`.
pub fn worked_hours(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> f64 {
    let millis = (check_out - check_in).num_milliseconds().max(0);
    let hundredths = (millis * 100 + MILLIS_PER_HOUR / 2) / MILLIS_PER_HOUR;
    hundredths as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::clock::FixedClock;
    use crate::model::{attendance::AttendanceStatus, branch::Branch};
    use crate::store::memory::{MemoryAttendanceStore, MemoryBranchRegistry};
    use chrono::{Duration, TimeZone};

    const EMPLOYEE: u64 = 1001;

    fn branch(id: u64, latitude: f64, longitude: f64, radius: f64) -> Branch {
        Branch {
            id,
            name: format!("Branch {id}"),
            location: String::new(),
            latitude,
            longitude,
            geo_fence_radius: radius,
        }
    }

    fn morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    struct Harness {
        service: AttendanceService,
        store: Arc<MemoryAttendanceStore>,
    }

    fn harness_with_offset(offset: FixedOffset) -> Harness {
        let store = Arc::new(MemoryAttendanceStore::new());
        let branches = Arc::new(MemoryBranchRegistry::with_branches([
            branch(1, 0.0, 0.0, 100.0),
            branch(2, 13.0827, 80.2707, 50.0),
        ]));
        let clock = Arc::new(FixedClock::new(morning()));
        let service = AttendanceService::new(store.clone(), branches, clock, offset);
        Harness { service, store }
    }

    fn harness() -> Harness {
        harness_with_offset(FixedOffset::east_opt(0).unwrap())
    }

    fn at(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint::new(latitude, longitude).unwrap()
    }

    #[actix_web::test]
    async fn check_in_at_branch_is_present() {
        let h = harness();

        let session = h
            .service
            .check_in(EMPLOYEE, 1, at(0.0, 0.0), morning())
            .await
            .unwrap();

        assert_eq!(session.distance_meters, 0.0);
        assert_eq!(session.status, AttendanceStatus::Present);
        assert_eq!(session.check_in_time, morning());
        assert_eq!(session.date, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert!(session.check_out_time.is_none());
        assert!(session.worked_hours.is_none());
    }

    #[actix_web::test]
    async fn check_in_a_kilometre_away_is_late() {
        let h = harness();

        let session = h
            .service
            .check_in(EMPLOYEE, 2, at(13.0927, 80.2707), morning())
            .await
            .unwrap();

        assert_eq!(session.status, AttendanceStatus::Late);
        assert_eq!(session.distance_meters, 1112.0);
    }

    #[actix_web::test]
    async fn unknown_branch_is_rejected_without_writing() {
        let h = harness();

        let err = h
            .service
            .check_in(EMPLOYEE, 99, at(0.0, 0.0), morning())
            .await
            .unwrap_err();

        assert!(matches!(err, AttendanceError::UnknownBranch(99)));
        assert!(h.store.is_empty());
    }

    #[actix_web::test]
    async fn second_check_in_same_day_is_duplicate() {
        let h = harness();
        h.service
            .check_in(EMPLOYEE, 1, at(0.0, 0.0), morning())
            .await
            .unwrap();

        let err = h
            .service
            .check_in(EMPLOYEE, 2, at(13.0827, 80.2707), morning() + Duration::hours(2))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AttendanceError::DuplicateCheckIn { employee_id: EMPLOYEE, .. }
        ));
        assert_eq!(h.store.len(), 1);
    }

    #[test]
    fn concurrent_check_ins_only_one_wins() {
        const THREADS: usize = 16;
        let h = harness();
        let barrier = std::sync::Barrier::new(THREADS);
        let (service, barrier) = (&h.service, &barrier);

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(move || {
                        barrier.wait();
                        futures::executor::block_on(service.check_in(
                            EMPLOYEE,
                            1,
                            at(0.0, 0.0),
                            morning(),
                        ))
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        let wins = results.iter().filter(|r| r.is_ok()).count();
        let duplicates = results
            .iter()
            .filter(|r| matches!(r, Err(AttendanceError::DuplicateCheckIn { .. })))
            .count();

        assert_eq!(wins, 1);
        assert_eq!(duplicates, THREADS - 1);
        assert_eq!(h.store.len(), 1);
    }

    #[actix_web::test]
    async fn timestamps_keep_millisecond_precision() {
        let h = harness();
        let check_in = morning() + Duration::nanoseconds(1_500_900);

        let session = h
            .service
            .check_in(EMPLOYEE, 1, at(0.0, 0.0), check_in)
            .await
            .unwrap();
        assert_eq!(session.check_in_time, morning() + Duration::milliseconds(1));

        // lands inside the same stored millisecond
        let err = h
            .service
            .check_out(session.id, check_in + Duration::microseconds(300))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::InvalidTimestamp { .. }));

        let closed = h
            .service
            .check_out(session.id, morning() + Duration::nanoseconds(3_600_002_999_999))
            .await
            .unwrap();
        assert_eq!(
            closed.check_out_time,
            Some(morning() + Duration::milliseconds(3_600_002))
        );
        assert_eq!(closed.worked_hours, Some(1.0));
    }

    #[actix_web::test]
    async fn check_out_records_worked_hours_once() {
        let h = harness();
        let session = h
            .service
            .check_in(EMPLOYEE, 1, at(0.0, 0.0), morning())
            .await
            .unwrap();

        let out = morning() + Duration::minutes(8 * 60 + 30);
        let closed = h.service.check_out(session.id, out).await.unwrap();
        assert_eq!(closed.check_out_time, Some(out));
        assert_eq!(closed.worked_hours, Some(8.5));

        let err = h
            .service
            .check_out(session.id, out + Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyCheckedOut(id) if id == session.id));

        let stored = h.service.session(session.id).await.unwrap().unwrap();
        assert_eq!(stored.worked_hours, Some(8.5));
        assert_eq!(stored.check_out_time, Some(out));
        assert_eq!(stored.status, AttendanceStatus::Present);
    }

    #[actix_web::test]
    async fn check_out_before_check_in_is_invalid() {
        let h = harness();
        let session = h
            .service
            .check_in(EMPLOYEE, 1, at(0.0, 0.0), morning())
            .await
            .unwrap();

        for now in [morning() - Duration::minutes(5), morning()] {
            let err = h.service.check_out(session.id, now).await.unwrap_err();
            assert!(matches!(err, AttendanceError::InvalidTimestamp { .. }));
        }

        let stored = h.service.session(session.id).await.unwrap().unwrap();
        assert!(stored.check_out_time.is_none());
        assert!(stored.worked_hours.is_none());
    }

    #[actix_web::test]
    async fn check_out_of_missing_session() {
        let h = harness();
        let err = h.service.check_out(77, morning()).await.unwrap_err();
        assert!(matches!(err, AttendanceError::NoActiveSession(77)));
    }

    #[actix_web::test]
    async fn roster_reflects_check_in_exactly_once() {
        let h = harness();
        let first = h
            .service
            .check_in(1, 1, at(0.0, 0.0), morning())
            .await
            .unwrap();
        let second = h
            .service
            .check_in(2, 2, at(13.0927, 80.2707), morning() + Duration::minutes(10))
            .await
            .unwrap();

        let roster = h.service.list_for_date(first.date).await.unwrap();

        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0], second);
        assert_eq!(roster[1], first);
        assert_eq!(roster.iter().filter(|s| s.id == first.id).count(), 1);

        // reads don't mutate
        assert_eq!(h.service.list_for_date(first.date).await.unwrap(), roster);
    }

    #[actix_web::test]
    async fn summary_counts_the_day() {
        let h = harness();
        let a = h
            .service
            .check_in(1, 1, at(0.0, 0.0), morning())
            .await
            .unwrap();
        h.service
            .check_in(2, 2, at(13.0927, 80.2707), morning())
            .await
            .unwrap();
        h.service
            .check_out(a.id, morning() + Duration::hours(4))
            .await
            .unwrap();

        let summary = h.service.summary_for_date(a.date).await.unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.present, 1);
        assert_eq!(summary.late, 1);
        assert_eq!(summary.checked_out, 1);
        assert_eq!(summary.on_site, 1);
    }

    #[actix_web::test]
    async fn calendar_day_follows_configured_offset() {
        // 20:00 UTC on the 19th is already the 20th at UTC+05:30
        let h = harness_with_offset(FixedOffset::east_opt(5 * 3600 + 1800).unwrap());
        let late_evening = Utc.with_ymd_and_hms(2026, 10, 19, 20, 0, 0).unwrap();

        let session = h
            .service
            .check_in(EMPLOYEE, 1, at(0.0, 0.0), late_evening)
            .await
            .unwrap();

        assert_eq!(session.date, NaiveDate::from_ymd_opt(2026, 10, 20).unwrap());
        assert_eq!(h.service.today(), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    }

    #[actix_web::test]
    async fn policy_is_swappable() {
        struct AlwaysLate;
        impl GeoFencePolicy for AlwaysLate {
            fn classify(&self, _: f64, _: f64) -> AttendanceStatus {
                AttendanceStatus::Late
            }
        }

        let h = harness();
        let service = h.service.with_policy(Arc::new(AlwaysLate));
        let session = service
            .check_in(EMPLOYEE, 1, at(0.0, 0.0), morning())
            .await
            .unwrap();

        assert_eq!(session.status, AttendanceStatus::Late);
    }

    #[test]
    fn worked_hours_rounds_half_up_to_hundredths() {
        let start = morning();
        assert_eq!(worked_hours(start, start + Duration::hours(8)), 8.0);
        // 18 s = 0.005 h
        assert_eq!(worked_hours(start, start + Duration::seconds(18)), 0.01);
        assert_eq!(worked_hours(start, start + Duration::seconds(17)), 0.0);
        assert_eq!(worked_hours(start, start + Duration::minutes(20)), 0.33);
        assert_eq!(worked_hours(start, start + Duration::minutes(40)), 0.67);
    }
}
