use crate::attendance::{AttendanceService, geo::GeoPoint, roster::RosterSummary};
use crate::auth::auth::AuthUser;
use crate::model::attendance::{AttendanceSession, AttendanceStatus};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CheckInRequest {
    #[schema(example = 3)]
    pub branch_id: u64,
    #[schema(example = 13.0827)]
    pub latitude: f64,
    #[schema(example = 80.2707)]
    pub longitude: f64,
}

#[derive(Serialize, ToSchema)]
pub struct CheckInResponse {
    #[schema(example = "Checked in")]
    pub message: String,
    pub session: AttendanceSession,
}

#[derive(Deserialize, IntoParams)]
pub struct RosterQuery {
    /// Calendar day (YYYY-MM-DD); defaults to today
    #[param(value_type = Option<String>, example = "2026-10-19")]
    pub date: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct RosterResponse {
    #[schema(example = "2026-10-19", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub data: Vec<AttendanceSession>,
}

#[derive(Serialize, ToSchema)]
pub struct RosterSummaryResponse {
    #[schema(example = "2026-10-19", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub summary: RosterSummary,
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = CheckInRequest,
    responses(
        (status = 201, description = "Checked in", body = CheckInResponse),
        (status = 400, description = "Invalid coordinates", body = Object, example = json!({
            "error": "invalid_location",
            "message": "latitude 91 is outside [-90, 90]"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 404, description = "Unknown branch", body = Object, example = json!({
            "error": "unknown_branch",
            "message": "branch 9 does not exist"
        })),
        (status = 409, description = "Already checked in today", body = Object, example = json!({
            "error": "duplicate_check_in",
            "message": "employee 1001 already checked in on 2026-10-19"
        })),
        (status = 503, description = "Storage unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    payload: web::Json<CheckInRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;

    let location = match GeoPoint::new(payload.latitude, payload.longitude) {
        Ok(p) => p,
        Err(e) => {
            warn!(employee_id, error = %e, "Rejected check-in location");
            return Ok(HttpResponse::BadRequest().json(json!({
                "error": "invalid_location",
                "message": e.to_string()
            })));
        }
    };

    let session = service
        .check_in(employee_id, payload.branch_id, location, service.now())
        .await?;

    let message = match session.status {
        AttendanceStatus::Present => "Checked in",
        AttendanceStatus::Late => "Checked in (outside geo-fence)",
    };

    Ok(HttpResponse::Created().json(CheckInResponse {
        message: message.to_string(),
        session,
    }))
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/{session_id}/check-out",
    params(
        ("session_id" = u64, Path, description = "Attendance session to close")
    ),
    responses(
        (status = 200, description = "Checked out", body = AttendanceSession),
        (status = 400, description = "Check-out time not after check-in", body = Object, example = json!({
            "error": "invalid_timestamp",
            "message": "check-out at 2026-10-19 08:59:00 UTC is not after check-in at 2026-10-19 09:00:00 UTC"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Session belongs to someone else"),
        (status = 404, description = "No such session", body = Object, example = json!({
            "error": "no_active_session",
            "message": "attendance session 42 not found"
        })),
        (status = 409, description = "Already checked out", body = Object, example = json!({
            "error": "already_checked_out",
            "message": "attendance session 42 is already checked out"
        })),
        (status = 503, description = "Storage unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    service: web::Data<AttendanceService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let session_id = path.into_inner();

    if let Some(session) = service.session(session_id).await? {
        if !auth.can_close_session_of(session.employee_id) {
            warn!(
                session_id,
                user_id = auth.user_id,
                "Check-out of another employee's session refused"
            );
            return Err(actix_web::error::ErrorForbidden("Not your attendance session"));
        }
    }

    let session = service.check_out(session_id, service.now()).await?;

    Ok(HttpResponse::Ok().json(session))
}

/// Attendance roster for a day, latest check-in first
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(RosterQuery),
    responses(
        (status = 200, description = "Roster snapshot", body = RosterResponse),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Storage unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    _auth: AuthUser,
    service: web::Data<AttendanceService>,
    query: web::Query<RosterQuery>,
) -> actix_web::Result<impl Responder> {
    let date = query.date.unwrap_or_else(|| service.today());

    let data = service.list_for_date(date).await?;
    info!(%date, count = data.len(), "Roster listed");

    Ok(HttpResponse::Ok().json(RosterResponse { date, data }))
}

/// Head counts for a day's roster
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(RosterQuery),
    responses(
        (status = 200, description = "Roster summary", body = RosterSummaryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Storage unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_summary(
    _auth: AuthUser,
    service: web::Data<AttendanceService>,
    query: web::Query<RosterQuery>,
) -> actix_web::Result<impl Responder> {
    let date = query.date.unwrap_or_else(|| service.today());
    let summary = service.summary_for_date(date).await?;

    Ok(HttpResponse::Ok().json(RosterSummaryResponse { date, summary }))
}
