use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use super::{AttendanceStore, BranchRegistry, InsertOutcome, StoreError};
use crate::model::{
    attendance::{AttendanceSession, NewSession},
    branch::Branch,
};

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

#[derive(Default)]
struct Sessions {
    next_id: u64,
    by_id: BTreeMap<u64, AttendanceSession>,
    by_employee_day: HashMap<(u64, NaiveDate), u64>,
}

/// Process-local attendance store. The write lock makes insert-if-absent
/// atomic the same way the `UNIQUE (employee_id, date)` key does in MySQL.
#[derive(Default)]
pub struct MemoryAttendanceStore {
    sessions: RwLock<Sessions>,
}

impl MemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.by_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn insert_if_absent(&self, new: NewSession) -> Result<InsertOutcome, StoreError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;

        let key = (new.employee_id, new.date);
        if sessions.by_employee_day.contains_key(&key) {
            return Ok(InsertOutcome::AlreadyExists);
        }

        sessions.next_id += 1;
        let id = sessions.next_id;
        let session = new.into_session(id);

        sessions.by_employee_day.insert(key, id);
        sessions.by_id.insert(id, session.clone());

        Ok(InsertOutcome::Inserted(session))
    }

    async fn find(&self, id: u64) -> Result<Option<AttendanceSession>, StoreError> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.by_id.get(&id).cloned())
    }

    async fn close(
        &self,
        id: u64,
        check_out_time: DateTime<Utc>,
        worked_hours: f64,
    ) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;

        match sessions.by_id.get_mut(&id) {
            Some(session) if session.check_out_time.is_none() => {
                session.check_out_time = Some(check_out_time);
                session.worked_hours = Some(worked_hours);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<AttendanceSession>, StoreError> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions
            .by_id
            .values()
            .filter(|s| s.date == date)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryBranchRegistry {
    branches: RwLock<HashMap<u64, Branch>>,
}

impl MemoryBranchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_branches(branches: impl IntoIterator<Item = Branch>) -> Self {
        let map = branches.into_iter().map(|b| (b.id, b)).collect();
        Self {
            branches: RwLock::new(map),
        }
    }

    pub fn upsert(&self, branch: Branch) -> Result<(), StoreError> {
        self.branches
            .write()
            .map_err(poisoned)?
            .insert(branch.id, branch);
        Ok(())
    }
}

#[async_trait]
impl BranchRegistry for MemoryBranchRegistry {
    async fn get_branch(&self, id: u64) -> Result<Option<Branch>, StoreError> {
        Ok(self.branches.read().map_err(poisoned)?.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::geo::GeoPoint;
    use crate::model::attendance::AttendanceStatus;
    use chrono::TimeZone;

    fn new_session(employee_id: u64, day: u32, hour: u32) -> NewSession {
        NewSession {
            employee_id,
            branch_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            check_in_time: Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).unwrap(),
            reported_location: GeoPoint {
                latitude: 0.0,
                longitude: 0.0,
            },
            distance_meters: 0.0,
            status: AttendanceStatus::Present,
        }
    }

    #[actix_web::test]
    async fn second_insert_for_same_day_is_rejected() {
        let store = MemoryAttendanceStore::new();

        let first = store.insert_if_absent(new_session(7, 19, 9)).await.unwrap();
        let second = store.insert_if_absent(new_session(7, 19, 10)).await.unwrap();

        assert!(matches!(first, InsertOutcome::Inserted(ref s) if s.id == 1));
        assert_eq!(second, InsertOutcome::AlreadyExists);
        assert_eq!(store.len(), 1);
    }

    #[actix_web::test]
    async fn same_employee_can_check_in_on_another_day() {
        let store = MemoryAttendanceStore::new();

        store.insert_if_absent(new_session(7, 19, 9)).await.unwrap();
        let next_day = store.insert_if_absent(new_session(7, 20, 9)).await.unwrap();

        assert!(matches!(next_day, InsertOutcome::Inserted(_)));
        assert_eq!(store.len(), 2);
    }

    #[actix_web::test]
    async fn close_only_applies_once() {
        let store = MemoryAttendanceStore::new();
        store.insert_if_absent(new_session(7, 19, 9)).await.unwrap();

        let out = Utc.with_ymd_and_hms(2026, 10, 19, 17, 0, 0).unwrap();
        assert!(store.close(1, out, 8.0).await.unwrap());
        assert!(!store.close(1, out, 99.0).await.unwrap());
        assert!(!store.close(404, out, 1.0).await.unwrap());

        let session = store.find(1).await.unwrap().unwrap();
        assert_eq!(session.worked_hours, Some(8.0));
    }

    #[actix_web::test]
    async fn list_filters_by_date() {
        let store = MemoryAttendanceStore::new();
        store.insert_if_absent(new_session(1, 19, 9)).await.unwrap();
        store.insert_if_absent(new_session(2, 19, 8)).await.unwrap();
        store.insert_if_absent(new_session(3, 20, 9)).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let listed = store.list_for_date(day).await.unwrap();

        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|s| s.date == day));
    }
}
