use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use crate::{error::AppError, models::UserId, routes::AppState};

/// Header carrying the authenticated user's id, set by the upstream auth gateway
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's role
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// A request made by a signed-in user
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

/// A request made by a signed-in administrator
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub UserId);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw = header(parts, USER_ID_HEADER).ok_or(AppError::Unauthorized)?;
        let user = raw.parse::<UserId>().map_err(|_| AppError::Unauthorized)?;
        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        match header(parts, USER_ROLE_HEADER) {
            Some(role) if role == state.admin_role => Ok(AdminUser(user)),
            _ => {
                tracing::warn!(user_id = %user, "Non-admin user denied admin endpoint");
                Err(AppError::Forbidden)
            }
        }
    }
}
