use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use serde_json::json;

use crate::store::StoreError;

/// Every way a check-in, check-out or roster read can fail.
///
/// A failed operation never leaves a partial write behind. Only
/// `StorageUnavailable` is worth retrying, and retrying is up to the caller.
#[derive(Debug, Display)]
pub enum AttendanceError {
    #[display(fmt = "employee {} already checked in on {}", employee_id, date)]
    DuplicateCheckIn { employee_id: u64, date: NaiveDate },

    #[display(fmt = "branch {} does not exist", _0)]
    UnknownBranch(u64),

    #[display(fmt = "attendance session {} not found", _0)]
    NoActiveSession(u64),

    #[display(fmt = "attendance session {} is already checked out", _0)]
    AlreadyCheckedOut(u64),

    #[display(
        fmt = "check-out at {} is not after check-in at {}",
        check_out,
        check_in
    )]
    InvalidTimestamp {
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    },

    #[display(fmt = "attendance storage unavailable: {}", _0)]
    StorageUnavailable(StoreError),
}

impl std::error::Error for AttendanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttendanceError::StorageUnavailable(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for AttendanceError {
    fn from(e: StoreError) -> Self {
        AttendanceError::StorageUnavailable(e)
    }
}

impl AttendanceError {
    /// Stable machine-readable code, one per kind.
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceError::DuplicateCheckIn { .. } => "duplicate_check_in",
            AttendanceError::UnknownBranch(_) => "unknown_branch",
            AttendanceError::NoActiveSession(_) => "no_active_session",
            AttendanceError::AlreadyCheckedOut(_) => "already_checked_out",
            AttendanceError::InvalidTimestamp { .. } => "invalid_timestamp",
            AttendanceError::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::DuplicateCheckIn { .. } => StatusCode::CONFLICT,
            AttendanceError::UnknownBranch(_) => StatusCode::NOT_FOUND,
            AttendanceError::NoActiveSession(_) => StatusCode::NOT_FOUND,
            AttendanceError::AlreadyCheckedOut(_) => StatusCode::CONFLICT,
            AttendanceError::InvalidTimestamp { .. } => StatusCode::BAD_REQUEST,
            AttendanceError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // storage details stay in the logs
        let message = match self {
            AttendanceError::StorageUnavailable(_) => {
                "Attendance storage is unavailable, try again later".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "message": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_has_a_distinct_code() {
        let now = Utc::now();
        let errors = [
            AttendanceError::DuplicateCheckIn {
                employee_id: 1,
                date: now.date_naive(),
            },
            AttendanceError::UnknownBranch(1),
            AttendanceError::NoActiveSession(1),
            AttendanceError::AlreadyCheckedOut(1),
            AttendanceError::InvalidTimestamp {
                check_in: now,
                check_out: now,
            },
            AttendanceError::StorageUnavailable(StoreError::Unavailable("down".into())),
        ];

        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn maps_to_http_status() {
        assert_eq!(
            AttendanceError::UnknownBranch(9).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AttendanceError::AlreadyCheckedOut(9).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AttendanceError::StorageUnavailable(StoreError::Unavailable("x".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
