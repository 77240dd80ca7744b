use crate::config::Config;
use crate::model::role::{Caller, Role};
use crate::auth::jwt::verify_token;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // auth_middleware already did the work on protected routes
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
                ));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        let role = match Role::from_id(claims.role) {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Invalid role"))),
        };

        ready(Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
        }))
    }
}

impl AuthUser {
    /// Identity handed to the leave service, which does its own role checks.
    pub fn caller(&self) -> Caller {
        Caller::new(self.user_id, self.role)
    }
}
