//! Geo-fenced attendance: distance, fence policy, the daily check-in /
//! check-out lifecycle and the roster read side.

pub mod clock;
pub mod error;
pub mod geo;
pub mod policy;
pub mod roster;
pub mod service;

pub use error::AttendanceError;
pub use service::AttendanceService;
