use actix_web::dev::Payload;
use actix_web::error::{ErrorInternalServerError, ErrorUnauthorized};
use actix_web::http::header::AUTHORIZATION;
use actix_web::web::Data;
use actix_web::{Error, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use paperclip::actix::Apiv2Security;

use crate::api::UserId;
use crate::user_service::UserService;

/// Extractor guarding protected routes. Resolves only when the request carries
/// `Authorization: Bearer <token>` with a valid session token, otherwise the request fails with 401
#[derive(Debug, Clone, Copy, Apiv2Security)]
#[openapi(
    apiKey,
    in = "header",
    name = "Authorization",
    description = "Use format 'Bearer TOKEN'"
)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, Error> {
    let user_service = req.app_data::<Data<UserService>>().ok_or_else(|| {
        tracing::error!("Authentication failed: user service is not configured");
        ErrorInternalServerError("Internal server error")
    })?;

    let token = bearer_token(req).map_err(|reason| {
        tracing::warn!("Authentication failed: {}", reason);
        ErrorUnauthorized("Unauthorized")
    })?;

    let user_id = user_service.parse_token(token).map_err(|err| {
        tracing::warn!("Authentication failed: {}", err);
        ErrorUnauthorized("Unauthorized")
    })?;

    Ok(AuthenticatedUser { user_id })
}

fn bearer_token(req: &HttpRequest) -> Result<&str, &'static str> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or("empty auth header")?
        .to_str()
        .map_err(|_| "invalid auth header")?;

    let mut parts = header.split(' ');
    let (Some("Bearer"), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err("invalid auth header");
    };

    if token.is_empty() {
        return Err("token is empty");
    }
    Ok(token)
}
