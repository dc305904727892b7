//! Request extractors that resolve the caller's identity through the
//! delegated auth service.

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};

use crate::error::AppError;
use crate::services::AuthUser;
use crate::AppState;

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))?;
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

async fn resolve(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    state.auth.get_user(token).await.map_err(|e| match e {
        AppError::Upstream(_) | AppError::InternalError(_) => e,
        _ => AppError::Unauthorized("invalid or expired session".to_string()),
    })
}

/// Any signed-in identity.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: AuthUser,
    pub token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
        let user = resolve(state, &token).await?;
        Ok(CurrentUser { user, token })
    }
}

/// The caller's identity when a bearer token was sent, `None` for anonymous requests.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            Some(token) => Ok(MaybeUser(Some(resolve(state, &token).await?))),
            None => Ok(MaybeUser(None)),
        }
    }
}

/// A back-office operator: signed in, not an investor, and on the
/// `ADMIN_EMAILS` allow-list when one is configured.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser { user, .. } = CurrentUser::from_request_parts(parts, state).await?;

        if user.is_investor() {
            return Err(AppError::Forbidden("investor accounts cannot use the admin API".to_string()));
        }
        let allow_list = &state.config.admin_emails;
        if !allow_list.is_empty() && !allow_list.contains(&user.email.to_lowercase()) {
            return Err(AppError::Forbidden("not an administrator".to_string()));
        }

        tracing::debug!(admin = %user.email, "admin request");
        Ok(AdminUser(user))
    }
}
