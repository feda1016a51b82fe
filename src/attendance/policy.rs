use crate::model::attendance::AttendanceStatus;

/// Decides the attendance status of a check-in from its distance to the
/// branch and the branch's configured radius.
pub trait GeoFencePolicy: Send + Sync {
    fn classify(&self, distance_meters: f64, radius_meters: f64) -> AttendanceStatus;
}

/// `present` inside the fence (boundary included), `late` anywhere else.
#[derive(Debug, Default, Clone, Copy)]
pub struct RadiusPolicy;

impl GeoFencePolicy for RadiusPolicy {
    fn classify(&self, distance_meters: f64, radius_meters: f64) -> AttendanceStatus {
        if distance_meters <= radius_meters {
            AttendanceStatus::Present
        } else {
            AttendanceStatus::Late
        }
    }
}
