//! Investor profiles: the investor's own view and back-office account management.
//!
//! A profile's id is the id of its auth identity, so every admin operation
//! here touches both the auth service and the database. Creation compensates
//! for a failed profile insert by deleting the freshly created identity.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::investment::{self, InvestmentStatus};
use crate::entities::investor_profile;
use crate::entities::project::{self, ProjectStatus};
use crate::error::AppError;
use crate::extract::{AdminUser, CurrentUser};
use crate::routes::{check_password, non_blank, normalize_email, require, ActionResponse};
use crate::services::{NewUserMetadata, INVESTOR_ROLE};
use crate::AppState;

/// One of the investor's own investments, with the project it funds.
#[derive(Debug, Serialize, ToSchema)]
pub struct OwnInvestment {
    pub id: i32,
    pub project_id: i32,
    pub project_title: Option<String>,
    pub project_status: Option<ProjectStatus>,
    pub amount: i64,
    pub status: InvestmentStatus,
    pub created_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvestorDashboard {
    pub profile: investor_profile::Model,
    pub investments: Vec<OwnInvestment>,
    /// Sum over approved and paid investments
    pub total_invested: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InvestorInput {
    pub investor_name: String,
    /// Login address. Fixed after creation; an update carrying a different one is rejected.
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// Required on create. On update, resets the password when present.
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvestorSummary {
    #[serde(flatten)]
    pub profile: investor_profile::Model,
    pub investment_count: usize,
}

/// The signed-in investor's profile and investments
#[utoipa::path(
    get,
    path = "/investor/profile",
    responses(
        (status = 200, body = InvestorDashboard),
        (status = 401),
        (status = 404, description = "No investor profile for this identity")
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = %caller.user.id))]
pub async fn my_profile(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<Json<InvestorDashboard>, AppError> {
    let profile = investor_profile::Entity::find_by_id(caller.user.id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("investor profile".to_string()))?;

    let rows = profile
        .find_related(investment::Entity)
        .find_also_related(project::Entity)
        .order_by_desc(investment::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let total_invested = rows
        .iter()
        .filter(|(inv, _)| inv.status.counts_toward_raised())
        .map(|(inv, _)| inv.amount)
        .sum();
    let investments = rows
        .into_iter()
        .map(|(inv, project)| OwnInvestment {
            id: inv.id,
            project_id: inv.project_id,
            project_title: project.as_ref().map(|p| p.title.clone()),
            project_status: project.map(|p| p.status),
            amount: inv.amount,
            status: inv.status,
            created_at: inv.created_at,
        })
        .collect();

    Ok(Json(InvestorDashboard {
        profile,
        investments,
        total_invested,
    }))
}

#[utoipa::path(
    get,
    path = "/admin/investors",
    responses((status = 200, body = [InvestorSummary])),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_list_investors(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<InvestorSummary>>, AppError> {
    let rows = investor_profile::Entity::find()
        .find_with_related(investment::Entity)
        .order_by_desc(investor_profile::Column::CreatedAt)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|(profile, investments)| InvestorSummary {
            profile,
            investment_count: investments.len(),
        })
        .collect();
    Ok(Json(rows))
}

/// Create a pre-confirmed investor account and its profile
#[utoipa::path(
    post,
    path = "/admin/investors",
    request_body = InvestorInput,
    responses((status = 201, body = investor_profile::Model), (status = 400), (status = 409)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_investor(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(input): Json<InvestorInput>,
) -> Result<(StatusCode, Json<investor_profile::Model>), AppError> {
    let email = normalize_email(&input.email);
    require("email", &email)?;
    require("investor_name", &input.investor_name)?;
    let password = input
        .password
        .as_deref()
        .ok_or_else(|| AppError::InvalidRequest("password is required".to_string()))?;
    check_password(password)?;

    let exists = investor_profile::Entity::find()
        .filter(investor_profile::Column::Email.eq(email.as_str()))
        .one(&state.db)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict(format!("an investor with email {} already exists", email)));
    }

    let phone = non_blank(input.phone);
    let metadata = NewUserMetadata {
        role: INVESTOR_ROLE.to_string(),
        investor_name: input.investor_name.trim().to_string(),
        phone: phone.clone(),
    };
    let user = state.auth.admin_create_user(&email, password, &metadata).await?;

    let inserted = investor_profile::ActiveModel {
        id: Set(user.id),
        investor_name: Set(metadata.investor_name.clone()),
        email: Set(email),
        phone: Set(phone),
        address: Set(non_blank(input.address)),
        created_at: Set(Utc::now()),
    }
    .insert(&state.db)
    .await;

    match inserted {
        Ok(profile) => {
            tracing::info!(investor_id = %profile.id, "investor account created");
            Ok((StatusCode::CREATED, Json(profile)))
        }
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "profile insert failed, rolling back auth user");
            if let Err(cleanup) = state.auth.admin_delete_user(user.id).await {
                tracing::error!(user_id = %user.id, error = %cleanup, "failed to roll back auth user");
            }
            Err(e.into())
        }
    }
}

#[utoipa::path(
    put,
    path = "/admin/investors/{id}",
    params(("id" = Uuid, Path, description = "Investor (auth user) id")),
    request_body = InvestorInput,
    responses((status = 200, body = investor_profile::Model), (status = 404)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin, input))]
pub async fn update_investor(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(input): Json<InvestorInput>,
) -> Result<Json<investor_profile::Model>, AppError> {
    let email = normalize_email(&input.email);
    require("email", &email)?;
    require("investor_name", &input.investor_name)?;
    let new_password = non_blank(input.password);
    if let Some(password) = new_password.as_deref() {
        check_password(password)?;
    }

    let existing = investor_profile::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("investor {}", id)))?;
    // The auth identity keeps its address, so the profile must too.
    if email != existing.email {
        return Err(AppError::InvalidRequest("email cannot be changed".to_string()));
    }

    let mut active: investor_profile::ActiveModel = existing.into();
    active.investor_name = Set(input.investor_name.trim().to_string());
    active.phone = Set(non_blank(input.phone));
    active.address = Set(non_blank(input.address));
    let profile = active.update(&state.db).await?;

    if let Some(password) = new_password.as_deref() {
        state.auth.admin_set_password(id, password).await?;
        tracing::info!(investor_id = %id, "investor password reset");
    }

    Ok(Json(profile))
}

/// Delete the investor's auth identity and profile. Their investments are kept, unlinked.
#[utoipa::path(
    delete,
    path = "/admin/investors/{id}",
    params(("id" = Uuid, Path, description = "Investor (auth user) id")),
    responses((status = 200, body = ActionResponse), (status = 404)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn delete_investor(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    let profile = investor_profile::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("investor {}", id)))?;

    // Database rows go first so a failed auth call rolls them back.
    let txn = state.db.begin().await?;
    investment::Entity::update_many()
        .col_expr(
            investment::Column::InvestorId,
            sea_orm::sea_query::Expr::value(Option::<Uuid>::None),
        )
        .filter(investment::Column::InvestorId.eq(id))
        .exec(&txn)
        .await?;
    profile.delete(&txn).await?;

    match state.auth.admin_delete_user(id).await {
        Ok(()) => {}
        // Already gone from the auth service; still remove the profile.
        Err(AppError::NotFound(_)) => {
            tracing::warn!(investor_id = %id, "auth user already deleted");
        }
        Err(e) => return Err(e),
    }
    txn.commit().await?;

    tracing::info!(investor_id = %id, "investor deleted");
    Ok(Json(ActionResponse::ok()))
}
