use crate::auth::jwt::verify_access_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already verified by auth_middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ))
            }
        };

        ready(AuthUser::from_token(token, &config.jwt_secret).map_err(ErrorUnauthorized))
    }
}

impl AuthUser {
    pub fn from_token(token: &str, secret: &str) -> Result<Self, String> {
        let claims = verify_access_token(token, secret)?;
        let role = Role::from_id(claims.role).ok_or_else(|| "Invalid role".to_string())?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }

    pub fn require_manager(&self) -> actix_web::Result<()> {
        if self.role.manages_attendance() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("HR/MD only"))
        }
    }

    /// Employee profile linked to this login, required for check-in.
    pub fn require_employee(&self) -> actix_web::Result<u64> {
        self.employee_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))
    }

    /// A session can be closed by its owner or by a manager.
    pub fn can_close_session_of(&self, employee_id: u64) -> bool {
        self.employee_id == Some(employee_id) || self.role.manages_attendance()
    }
}
