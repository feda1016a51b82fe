use crate::api::attendance::{
    CheckInRequest, CheckInResponse, RosterResponse, RosterSummaryResponse,
};
use crate::api::branch::CreateBranch;
use crate::attendance::{geo::GeoPoint, roster::RosterSummary};
use crate::model::attendance::{AttendanceSession, AttendanceStatus};
use crate::model::branch::Branch;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Branch Attendance API",
        version = "1.0.0",
        description = r#"
## Branch Attendance Service

Geo-fenced attendance for a multi-branch retail operation.

### 🔹 Key Features
- **Attendance**
  - Check in against a branch geo-fence; the distance to the branch decides
    whether the day is recorded as `present` or `late`
  - One session per employee per calendar day, closed by a single check-out
    that records worked hours
  - Daily roster and head-count summary
- **Branches**
  - Register branches with coordinates and a geo-fence radius

### 🔐 Security
Every endpoint expects a **JWT Bearer** access token from the identity provider.
Branch maintenance is limited to **HR** and **MD** roles.

### 📦 Errors
Failures return `{"error": "<kind>", "message": "..."}` where `kind` is one of
`duplicate_check_in`, `unknown_branch`, `no_active_session`,
`already_checked_out`, `invalid_timestamp`, `storage_unavailable`,
`invalid_location`.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_attendance,
        crate::api::attendance::attendance_summary,

        crate::api::branch::list_branches,
        crate::api::branch::get_branch,
        crate::api::branch::create_branch,
        crate::api::branch::update_branch
    ),
    components(
        schemas(
            GeoPoint,
            AttendanceStatus,
            AttendanceSession,
            CheckInRequest,
            CheckInResponse,
            RosterResponse,
            RosterSummary,
            RosterSummaryResponse,
            Branch,
            CreateBranch
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Geo-fenced check-in / check-out and rosters"),
        (name = "Branch", description = "Branch and geo-fence management"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by every path.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_attendance_paths_and_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/attendance/check-in"));
        assert!(doc.paths.paths.contains_key("/api/attendance/{session_id}/check-out"));
        assert!(doc.paths.paths.contains_key("/api/branches/{branch_id}"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("AttendanceSession"));
    }
}
