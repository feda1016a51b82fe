use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;

use crate::model::{
    attendance::{AttendanceSession, NewSession},
    branch::Branch,
};

pub mod cache;
pub mod memory;
pub mod mysql;

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),

    #[display(fmt = "corrupt attendance row {}: {}", id, reason)]
    Corrupt { id: u64, reason: String },

    #[display(fmt = "{}", _0)]
    Unavailable(String),
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(AttendanceSession),
    /// A session already exists for the same employee and date.
    AlreadyExists,
}

/// Durable attendance sessions keyed by `(employee_id, date)`.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Creates the session unless one already exists for its employee and
    /// date. Must be atomic: of two concurrent calls for the same key exactly
    /// one returns `Inserted`.
    async fn insert_if_absent(&self, new: NewSession) -> Result<InsertOutcome, StoreError>;

    async fn find(&self, id: u64) -> Result<Option<AttendanceSession>, StoreError>;

    /// Sets the check-out fields only if the session is still open.
    /// Returns `false` when nothing was updated.
    async fn close(
        &self,
        id: u64,
        check_out_time: DateTime<Utc>,
        worked_hours: f64,
    ) -> Result<bool, StoreError>;

    async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<AttendanceSession>, StoreError>;
}

/// Read access to the branches a check-in can resolve against.
#[async_trait]
pub trait BranchRegistry: Send + Sync {
    async fn get_branch(&self, id: u64) -> Result<Option<Branch>, StoreError>;
}
