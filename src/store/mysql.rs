use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::{debug, warn};

use super::{AttendanceStore, BranchRegistry, InsertOutcome, StoreError};
use crate::attendance::geo::GeoPoint;
use crate::model::{
    attendance::{AttendanceRow, AttendanceSession, AttendanceStatus, NewSession},
    branch::Branch,
};

const SESSION_COLUMNS: &str = r#"
    id, employee_id, branch_id, date, check_in_time, check_out_time,
    latitude, longitude, distance_from_branch, status, worked_hours
"#;

impl TryFrom<AttendanceRow> for AttendanceSession {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = AttendanceStatus::from_str(&row.status).map_err(|_| StoreError::Corrupt {
            id: row.id,
            reason: format!("unknown status '{}'", row.status),
        })?;

        Ok(AttendanceSession {
            id: row.id,
            employee_id: row.employee_id,
            branch_id: row.branch_id,
            date: row.date,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            reported_location: GeoPoint {
                latitude: row.latitude,
                longitude: row.longitude,
            },
            distance_meters: row.distance_from_branch,
            status,
            worked_hours: row.worked_hours,
        })
    }
}

/// Attendance sessions in the `attendance` table. Uniqueness per employee and
/// day comes from the `uq_attendance_employee_date` key.
#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn insert_if_absent(&self, new: NewSession) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_id, branch_id, date, check_in_time, latitude, longitude,
                 distance_from_branch, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.branch_id)
        .bind(new.date)
        .bind(new.check_in_time)
        .bind(new.reported_location.latitude)
        .bind(new.reported_location.longitude)
        .bind(new.distance_meters)
        .bind(new.status.as_ref())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = done.last_insert_id();
                debug!(id, employee_id = new.employee_id, "Attendance row inserted");
                Ok(InsertOutcome::Inserted(new.into_session(id)))
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                warn!(
                    employee_id = new.employee_id,
                    date = %new.date,
                    "Duplicate attendance row rejected by unique key"
                );
                Ok(InsertOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find(&self, id: u64) -> Result<Option<AttendanceSession>, StoreError> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM attendance WHERE id = ?");

        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceSession::try_from)
            .transpose()
    }

    async fn close(
        &self,
        id: u64,
        check_out_time: DateTime<Utc>,
        worked_hours: f64,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out_time = ?, worked_hours = ?
            WHERE id = ?
            AND check_out_time IS NULL
            "#,
        )
        .bind(check_out_time)
        .bind(worked_hours)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<AttendanceSession>, StoreError> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM attendance WHERE date = ? ORDER BY check_in_time DESC, id DESC"
        );

        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(AttendanceSession::try_from)
            .collect()
    }
}

#[derive(Clone)]
pub struct MySqlBranchRegistry {
    pool: MySqlPool,
}

impl MySqlBranchRegistry {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BranchRegistry for MySqlBranchRegistry {
    async fn get_branch(&self, id: u64) -> Result<Option<Branch>, StoreError> {
        let branch = sqlx::query_as::<_, Branch>(
            r#"
            SELECT id, name, location, latitude, longitude, geo_fence_radius
            FROM branches
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(branch)
    }
}
