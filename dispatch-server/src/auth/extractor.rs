//! Bearer-token extractor
//!
//! `CurrentUser` as a handler argument validates the JWT and rejects the
//! request with 401 before the handler runs.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

/// Validate a raw token and build the caller identity.
///
/// Shared by the header extractor and the `?token=` real-time handshake.
pub fn authenticate_token(jwt: &JwtService, token: &str) -> Result<CurrentUser, AppError> {
    let claims = jwt.validate_token(token).map_err(|e| {
        security_log!("WARN", "auth_failed", error = format!("{}", e));
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    CurrentUser::try_from(claims)
        .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {}", e)))
}

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => JwtService::extract_from_header(header)
                .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
            None => {
                security_log!("WARN", "auth_missing", uri = format!("{:?}", parts.uri));
                return Err(AppError::unauthorized());
            }
        };

        let user = authenticate_token(state.get_jwt_service(), token)?;
        tracing::debug!(user_id = user.id, role = %user.role, "request authenticated");
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
