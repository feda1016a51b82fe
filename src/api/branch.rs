use crate::{
    attendance::geo::GeoPoint,
    auth::auth::AuthUser,
    model::branch::Branch,
    store::{BranchRegistry, cache::CachedBranchRegistry},
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

/// Columns a branch update may touch.
const UPDATABLE_COLUMNS: [&str; 5] = ["name", "location", "latitude", "longitude", "geo_fence_radius"];

#[derive(Deserialize, ToSchema)]
pub struct CreateBranch {
    #[schema(example = "Chennai Central")]
    pub name: String,
    #[schema(example = "12 Anna Salai, Chennai")]
    #[serde(default)]
    pub location: String,
    #[schema(example = 13.0827)]
    pub latitude: f64,
    #[schema(example = 80.2707)]
    pub longitude: f64,
    #[schema(example = 100.0)]
    pub geo_fence_radius: f64,
}

fn validate_radius(radius: f64) -> Result<(), String> {
    if radius.is_finite() && radius >= 0.0 {
        Ok(())
    } else {
        Err("geo_fence_radius must be a non-negative number of meters".to_string())
    }
}

/// Checks the fields of a partial update that carry geo-fence semantics.
fn validate_update(payload: &Value) -> Result<(), String> {
    let Some(obj) = payload.as_object() else {
        return Ok(());
    };

    let number = |key: &str| obj.get(key).and_then(Value::as_f64);

    if obj.contains_key("geo_fence_radius") {
        validate_radius(number("geo_fence_radius").unwrap_or(f64::NAN))?;
    }
    if obj.contains_key("latitude") {
        GeoPoint::new(number("latitude").unwrap_or(f64::NAN), 0.0).map_err(|e| e.to_string())?;
    }
    if obj.contains_key("longitude") {
        GeoPoint::new(0.0, number("longitude").unwrap_or(f64::NAN)).map_err(|e| e.to_string())?;
    }
    if let Some(name) = obj.get("name") {
        if name.as_str().is_none_or(|n| n.trim().is_empty()) {
            return Err("name must not be empty".to_string());
        }
    }

    Ok(())
}

/// List branches
#[utoipa::path(
    get,
    path = "/api/branches",
    responses(
        (status = 200, description = "All branches ordered by name", body = [Branch]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Branch",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_branches(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let branches = sqlx::query_as::<_, Branch>(
        r#"
        SELECT id, name, location, latitude, longitude, geo_fence_radius
        FROM branches
        ORDER BY name
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch branches");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(branches))
}

/// Get Branch by ID
#[utoipa::path(
    get,
    path = "/api/branches/{branch_id}",
    params(
        ("branch_id" = u64, Path, description = "Branch ID")
    ),
    responses(
        (status = 200, description = "Branch found", body = Branch),
        (status = 404, description = "Branch not found", body = Object, example = json!({
            "message": "Branch not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Branch",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_branch(
    _auth: AuthUser,
    branches: web::Data<CachedBranchRegistry>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let branch_id = path.into_inner();

    let branch = branches.get_branch(branch_id).await.map_err(|e| {
        error!(error = %e, branch_id, "Failed to fetch branch");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match branch {
        Some(b) => Ok(HttpResponse::Ok().json(b)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Branch not found"
        }))),
    }
}

/// Create Branch
#[utoipa::path(
    post,
    path = "/api/branches",
    request_body = CreateBranch,
    responses(
        (status = 201, description = "Branch created", body = Branch),
        (status = 400, description = "Invalid coordinates or radius"),
        (status = 403, description = "HR/MD only"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Branch",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_branch(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateBranch>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager()?;

    let payload = payload.into_inner();
    let name = payload.name.trim();

    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "name must not be empty"
        })));
    }
    let validation = GeoPoint::new(payload.latitude, payload.longitude)
        .map_err(|e| e.to_string())
        .and_then(|_| validate_radius(payload.geo_fence_radius));
    if let Err(message) = validation {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO branches (name, location, latitude, longitude, geo_fence_radius)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(&payload.location)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .bind(payload.geo_fence_radius)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to create branch");
        ErrorInternalServerError("Something went wrong, Contact with system admin")
    })?;

    let branch = Branch {
        id: result.last_insert_id(),
        name: name.to_string(),
        location: payload.location,
        latitude: payload.latitude,
        longitude: payload.longitude,
        geo_fence_radius: payload.geo_fence_radius,
    };
    info!(branch_id = branch.id, user_id = auth.user_id, "Branch created");

    Ok(HttpResponse::Created().json(branch))
}

/// Update Branch
#[utoipa::path(
    put,
    path = "/api/branches/{branch_id}",
    params(
        ("branch_id" = u64, Path, description = "Branch ID")
    ),
    request_body(
        content = Object,
        description = "Any subset of name, location, latitude, longitude, geo_fence_radius",
        example = json!({ "geo_fence_radius": 150.0 })
    ),
    responses(
        (status = 200, description = "Branch updated successfully", body = Object, example = json!({
            "message": "Branch updated successfully"
        })),
        (status = 400, description = "Invalid or non-updatable field"),
        (status = 403, description = "HR/MD only"),
        (status = 404, description = "Branch not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Branch",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_branch(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    branches: web::Data<CachedBranchRegistry>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager()?;

    let branch_id = path.into_inner();

    if let Err(message) = validate_update(&body) {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    let update = build_update_sql("branches", &body, &UPDATABLE_COLUMNS, "id", branch_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, branch_id, "Failed to update branch");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // check-ins must see the new fence right away
    branches.invalidate(branch_id).await;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Branch not found"
        })));
    }

    info!(branch_id, user_id = auth.user_id, "Branch updated");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Branch updated successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_must_be_finite_and_non_negative() {
        assert!(validate_radius(0.0).is_ok());
        assert!(validate_radius(250.0).is_ok());
        assert!(validate_radius(-1.0).is_err());
        assert!(validate_radius(f64::NAN).is_err());
        assert!(validate_radius(f64::INFINITY).is_err());
    }

    #[test]
    fn update_validation_checks_geo_fields() {
        assert!(validate_update(&json!({ "geo_fence_radius": 80 })).is_ok());
        assert!(validate_update(&json!({ "latitude": 13.08, "longitude": 80.27 })).is_ok());
        assert!(validate_update(&json!({ "geo_fence_radius": -5 })).is_err());
        assert!(validate_update(&json!({ "geo_fence_radius": "wide" })).is_err());
        assert!(validate_update(&json!({ "latitude": 120.0 })).is_err());
        assert!(validate_update(&json!({ "longitude": -181 })).is_err());
        assert!(validate_update(&json!({ "name": "  " })).is_err());
    }
}
