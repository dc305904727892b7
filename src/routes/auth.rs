use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::investor_profile;
use crate::error::AppError;
use crate::extract::CurrentUser;
use crate::routes::{check_password, non_blank, normalize_email, require, ActionResponse};
use crate::services::{NewUserMetadata, INVESTOR_ROLE};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub investor_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub user_id: Uuid,
    pub email: String,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Create an investor account and its profile
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, body = investor_profile::Model),
        (status = 400, description = "Missing fields or password too short"),
        (status = 409, description = "Email already registered")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<investor_profile::Model>), AppError> {
    let email = normalize_email(&request.email);
    require("email", &email)?;
    require("investor_name", &request.investor_name)?;
    check_password(&request.password)?;

    let phone = non_blank(request.phone);
    let metadata = NewUserMetadata {
        role: INVESTOR_ROLE.to_string(),
        investor_name: request.investor_name.trim().to_string(),
        phone: phone.clone(),
    };
    let user = state.auth.sign_up(&email, &request.password, &metadata).await?;

    let inserted = investor_profile::ActiveModel {
        id: Set(user.id),
        investor_name: Set(metadata.investor_name.clone()),
        email: Set(email),
        phone: Set(phone),
        address: Set(non_blank(request.address)),
        created_at: Set(Utc::now()),
    }
    .insert(&state.db)
    .await;

    match inserted {
        Ok(profile) => {
            tracing::info!(user_id = %profile.id, "investor signed up");
            Ok((StatusCode::CREATED, Json(profile)))
        }
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "profile insert failed, removing auth user");
            if let Err(cleanup) = state.auth.admin_delete_user(user.id).await {
                tracing::error!(user_id = %user.id, error = %cleanup, "failed to remove orphaned auth user");
            }
            Err(e.into())
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses((status = 200, body = LoginResponse), (status = 401))
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = normalize_email(&request.email);
    require("email", &email)?;
    require("password", &request.password)?;

    // GoTrue answers bad credentials with a 400
    let session = state
        .auth
        .sign_in(&email, &request.password)
        .await
        .map_err(|e| match e {
            AppError::InvalidRequest(msg) => AppError::Unauthorized(msg),
            other => other,
        })?;
    tracing::debug!(user_id = %session.user.id, "signed in");

    Ok(Json(LoginResponse {
        access_token: session.access_token,
        user_id: session.user.id,
        email: session.user.email,
        role: session.user.role,
    }))
}

/// Change the caller's password after re-checking the current one
#[utoipa::path(
    post,
    path = "/auth/password",
    request_body = PasswordChangeRequest,
    responses(
        (status = 200, body = ActionResponse),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Current password is wrong")
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %caller.user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(request): Json<PasswordChangeRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    check_password(&request.new_password)?;

    state
        .auth
        .sign_in(&caller.user.email, &request.current_password)
        .await
        .map_err(|e| match e {
            AppError::Upstream(_) => e,
            _ => AppError::Unauthorized("current password is incorrect".to_string()),
        })?;
    state
        .auth
        .update_password(&caller.token, &request.new_password)
        .await?;

    tracing::info!("password changed");
    Ok(Json(ActionResponse::ok()))
}
