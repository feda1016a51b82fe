use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::attendance::geo::GeoPoint;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    /// Checked in within the branch geo-fence.
    Present,
    /// Checked in outside the geo-fence.
    Late,
}

/// One employee's attendance for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "id": 42,
    "employee_id": 1001,
    "branch_id": 3,
    "date": "2026-10-19",
    "check_in_time": "2026-10-19T03:30:00Z",
    "check_out_time": "2026-10-19T12:00:00Z",
    "reported_location": { "latitude": 13.0827, "longitude": 80.2707 },
    "distance_meters": 12.0,
    "status": "present",
    "worked_hours": 8.5
}))]
pub struct AttendanceSession {
    pub id: u64,
    pub employee_id: u64,
    pub branch_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub check_in_time: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = "date-time", nullable = true)]
    pub check_out_time: Option<DateTime<Utc>>,
    pub reported_location: GeoPoint,
    pub distance_meters: f64,
    pub status: AttendanceStatus,
    #[schema(nullable = true)]
    pub worked_hours: Option<f64>,
}

impl AttendanceSession {
    pub fn is_checked_out(&self) -> bool {
        self.check_out_time.is_some()
    }
}

/// Everything a store needs to persist a fresh check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub employee_id: u64,
    pub branch_id: u64,
    pub date: NaiveDate,
    pub check_in_time: DateTime<Utc>,
    pub reported_location: GeoPoint,
    pub distance_meters: f64,
    pub status: AttendanceStatus,
}

impl NewSession {
    pub fn into_session(self, id: u64) -> AttendanceSession {
        AttendanceSession {
            id,
            employee_id: self.employee_id,
            branch_id: self.branch_id,
            date: self.date,
            check_in_time: self.check_in_time,
            check_out_time: None,
            reported_location: self.reported_location,
            distance_meters: self.distance_meters,
            status: self.status,
            worked_hours: None,
        }
    }
}

/// Raw `attendance` row as stored in MySQL.
#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: u64,
    pub employee_id: u64,
    pub branch_id: u64,
    pub date: NaiveDate,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_from_branch: f64,
    pub status: String,
    pub worked_hours: Option<f64>,
}
