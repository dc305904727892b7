use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, EntityTrait, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::investment::{self, InvestmentStatus, InvestmentType};
use crate::entities::project::{self, ProjectStatus};
use crate::entities::{investor_profile, InvestorProfile};
use crate::error::AppError;
use crate::extract::{AdminUser, MaybeUser};
use crate::funding::{self, StatusChange};
use crate::routes::{non_blank, normalize_email, require, ActionResponse};
use crate::services::notifications;
use crate::AppState;

/// Public investment application.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InvestmentRequest {
    pub project_id: i32,
    pub investor_name: String,
    pub email: String,
    pub phone: String,
    pub amount: i64,
    pub investment_type: InvestmentType,
    #[serde(default)]
    pub investment_deadline: Option<NaiveDate>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Admin create/edit payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminInvestmentInput {
    pub project_id: i32,
    #[serde(default)]
    pub investor_id: Option<Uuid>,
    pub investor_name: String,
    pub email: String,
    pub phone: String,
    pub amount: i64,
    pub investment_type: InvestmentType,
    #[serde(default)]
    pub investment_deadline: Option<NaiveDate>,
    #[serde(default)]
    pub message: Option<String>,
    /// Defaults to `approved` on create; left unchanged on edit when omitted
    #[serde(default)]
    pub status: Option<InvestmentStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusRequest {
    /// One of pending, approved, unpaid, paid, rejected
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvestmentWithProject {
    #[serde(flatten)]
    pub investment: investment::Model,
    pub project: Option<project::Model>,
}

fn check_common(name: &str, email: &str, phone: &str, amount: i64) -> Result<(), AppError> {
    require("investor_name", name)?;
    require("email", email)?;
    require("phone", phone)?;
    if amount <= 0 {
        return Err(AppError::InvalidRequest("amount must be positive".to_string()));
    }
    Ok(())
}

/// Submit an investment application for an active project
#[utoipa::path(
    post,
    path = "/investments",
    request_body = InvestmentRequest,
    responses(
        (status = 201, description = "Recorded as pending", body = investment::Model),
        (status = 400, description = "Invalid input or project not accepting investments"),
        (status = 401, description = "Bearer token present but invalid"),
        (status = 404, description = "Unknown project")
    )
)]
#[tracing::instrument(skip(state, caller, request), fields(project_id = request.project_id))]
pub async fn submit_investment(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Json(request): Json<InvestmentRequest>,
) -> Result<(StatusCode, Json<investment::Model>), AppError> {
    check_common(&request.investor_name, &request.email, &request.phone, request.amount)?;

    let project = project::Entity::find_by_id(request.project_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {}", request.project_id)))?;
    if project.status != ProjectStatus::Active {
        return Err(AppError::InvalidRequest(
            "project is not accepting investments".to_string(),
        ));
    }

    // Only link when the caller already has a profile row.
    let investor_id = match caller.filter(|u| u.is_investor()) {
        Some(user) => InvestorProfile::find_by_id(user.id)
            .one(&state.db)
            .await?
            .map(|p| p.id),
        None => None,
    };

    let now = Utc::now();
    let row = investment::ActiveModel {
        project_id: Set(project.id),
        investor_id: Set(investor_id),
        investor_name: Set(request.investor_name.trim().to_string()),
        email: Set(normalize_email(&request.email)),
        phone: Set(request.phone.trim().to_string()),
        amount: Set(request.amount),
        investment_type: Set(request.investment_type),
        investment_deadline: Set(request.investment_deadline),
        message: Set(non_blank(request.message)),
        status: Set(InvestmentStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(investment_id = row.id, linked = investor_id.is_some(), "investment submitted");

    if let Some(inbox) = state.config.notify_email.as_deref() {
        let email = notifications::investment_submitted(inbox, &row, &project.title);
        notifications::deliver_best_effort(state.mailer.as_ref(), email, "investment-submitted").await;
    }

    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    get,
    path = "/admin/investments",
    responses((status = 200, body = [InvestmentWithProject])),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_list_investments(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<InvestmentWithProject>>, AppError> {
    let rows = investment::Entity::find()
        .find_also_related(project::Entity)
        .order_by_desc(investment::Column::CreatedAt)
        .order_by_desc(investment::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|(investment, project)| InvestmentWithProject { investment, project })
        .collect();
    Ok(Json(rows))
}

/// Record an investment on an investor's behalf
#[utoipa::path(
    post,
    path = "/admin/investments",
    request_body = AdminInvestmentInput,
    responses((status = 201, body = investment::Model), (status = 400), (status = 404)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(project_id = input.project_id))]
pub async fn create_investment(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(input): Json<AdminInvestmentInput>,
) -> Result<(StatusCode, Json<investment::Model>), AppError> {
    check_common(&input.investor_name, &input.email, &input.phone, input.amount)?;

    let txn = state.db.begin().await?;

    project::Entity::find_by_id(input.project_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {}", input.project_id)))?;
    if let Some(investor_id) = input.investor_id {
        investor_profile::Entity::find_by_id(investor_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::InvalidRequest(format!("unknown investor {}", investor_id)))?;
    }

    let now = Utc::now();
    let row = investment::ActiveModel {
        project_id: Set(input.project_id),
        investor_id: Set(input.investor_id),
        investor_name: Set(input.investor_name.trim().to_string()),
        email: Set(normalize_email(&input.email)),
        phone: Set(input.phone.trim().to_string()),
        amount: Set(input.amount),
        investment_type: Set(input.investment_type),
        investment_deadline: Set(input.investment_deadline),
        message: Set(non_blank(input.message)),
        status: Set(input.status.unwrap_or(InvestmentStatus::Approved)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let raised = funding::recompute_raised_amount(&txn, row.project_id).await?;

    txn.commit().await?;

    tracing::info!(investment_id = row.id, raised, "investment recorded by admin");
    Ok((StatusCode::CREATED, Json(row)))
}

/// Edit an investment; both the old and new project totals are recomputed
#[utoipa::path(
    put,
    path = "/admin/investments/{id}",
    params(("id" = i32, Path, description = "Investment id")),
    request_body = AdminInvestmentInput,
    responses((status = 200, body = investment::Model), (status = 404)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin, input))]
pub async fn update_investment(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(input): Json<AdminInvestmentInput>,
) -> Result<Json<investment::Model>, AppError> {
    check_common(&input.investor_name, &input.email, &input.phone, input.amount)?;

    let txn = state.db.begin().await?;

    let existing = investment::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("investment {}", id)))?;
    project::Entity::find_by_id(input.project_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {}", input.project_id)))?;

    let old_project = existing.project_id;
    let status = input.status.unwrap_or(existing.status);

    let mut active: investment::ActiveModel = existing.into();
    active.project_id = Set(input.project_id);
    active.investor_id = Set(input.investor_id);
    active.investor_name = Set(input.investor_name.trim().to_string());
    active.email = Set(normalize_email(&input.email));
    active.phone = Set(input.phone.trim().to_string());
    active.amount = Set(input.amount);
    active.investment_type = Set(input.investment_type);
    active.investment_deadline = Set(input.investment_deadline);
    active.message = Set(non_blank(input.message));
    active.status = Set(status);
    active.updated_at = Set(Utc::now());
    let row = active.update(&txn).await?;

    funding::recompute_raised_amounts(&txn, &[old_project, row.project_id]).await?;

    txn.commit().await?;
    Ok(Json(row))
}

#[utoipa::path(
    delete,
    path = "/admin/investments/{id}",
    params(("id" = i32, Path, description = "Investment id")),
    responses((status = 200, body = ActionResponse), (status = 404)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn delete_investment(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<ActionResponse>, AppError> {
    let txn = state.db.begin().await?;

    let existing = investment::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("investment {}", id)))?;
    let project_id = existing.project_id;
    investment::Entity::delete_by_id(id).exec(&txn).await?;
    funding::recompute_raised_amount(&txn, project_id).await?;

    txn.commit().await?;

    tracing::info!(id, project_id, "investment deleted");
    Ok(Json(ActionResponse::ok()))
}

/// Set an investment's status and re-derive the project's raised amount
#[utoipa::path(
    patch,
    path = "/admin/investments/{id}/status",
    params(("id" = i32, Path, description = "Investment id")),
    request_body = StatusRequest,
    responses(
        (status = 200, body = StatusChange),
        (status = 400, description = "Invalid status"),
        (status = 404)
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn set_investment_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<StatusChange>, AppError> {
    let change = funding::update_investment_status(&state.db, state.mailer.as_ref(), id, &request.status).await?;
    Ok(Json(change))
}

#[utoipa::path(
    post,
    path = "/admin/investments/{id}/approve",
    params(("id" = i32, Path, description = "Investment id")),
    responses((status = 200, body = StatusChange), (status = 404)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn approve_investment(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<StatusChange>, AppError> {
    let change = funding::update_investment_status(
        &state.db,
        state.mailer.as_ref(),
        id,
        InvestmentStatus::Approved.as_str(),
    )
    .await?;
    Ok(Json(change))
}

#[utoipa::path(
    post,
    path = "/admin/investments/{id}/reject",
    params(("id" = i32, Path, description = "Investment id")),
    responses((status = 200, body = StatusChange), (status = 404)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn reject_investment(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<StatusChange>, AppError> {
    let change = funding::update_investment_status(
        &state.db,
        state.mailer.as_ref(),
        id,
        InvestmentStatus::Rejected.as_str(),
    )
    .await?;
    Ok(Json(change))
}
