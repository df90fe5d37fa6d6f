use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::coach::StaffRole;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub profile_id: String,
    pub role: StaffRole,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by auth_middleware on protected routes.
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

        match verify_token(token, &config.jwt_secret) {
            Ok(claims) => ready(Ok(AuthUser {
                profile_id: claims.sub,
                role: claims.role,
            })),
            Err(_) => ready(Err(ErrorUnauthorized("Invalid token"))),
        }
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == StaffRole::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    /// Payroll, rates and staff accounts.
    pub fn require_manager(&self) -> actix_web::Result<()> {
        if matches!(self.role, StaffRole::Admin | StaffRole::HeadCoach) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin/Head coach only"))
        }
    }

    /// Students and attendance desk.
    pub fn require_front_desk(&self) -> actix_web::Result<()> {
        if matches!(
            self.role,
            StaffRole::Admin | StaffRole::HeadCoach | StaffRole::Reception
        ) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Front desk only"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: StaffRole) -> AuthUser {
        AuthUser {
            profile_id: "p-1".to_string(),
            role,
        }
    }

    #[test]
    fn manager_guard_admits_admin_and_head_coach() {
        assert!(user(StaffRole::Admin).require_manager().is_ok());
        assert!(user(StaffRole::HeadCoach).require_manager().is_ok());
        assert!(user(StaffRole::Coach).require_manager().is_err());
        assert!(user(StaffRole::Reception).require_manager().is_err());
    }

    #[test]
    fn front_desk_guard_admits_reception() {
        assert!(user(StaffRole::Reception).require_front_desk().is_ok());
        assert!(user(StaffRole::Cleaner).require_front_desk().is_err());
        assert!(user(StaffRole::HeadCoach).require_admin().is_err());
    }
}
