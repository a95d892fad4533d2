use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::modules::auth::schema::ErrorResponse;
use crate::AppState;

/// Authenticated identity for the current request, resolved from the
/// Bearer token. Handlers receive it as an argument; there is no
/// process-wide session state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new("Missing authorization header")),
                )
            })?;

        let token = header_value.strip_prefix("Bearer ").ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Invalid authorization header")),
            )
        })?;

        let data = state.jwt_service.verify_access_token(token).map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Invalid or expired token")),
            )
        })?;

        Ok(AuthUser {
            id: data.claims.sub,
            email: data.claims.email,
        })
    }
}
