use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::counters;
use crate::entities::investment::{self, InvestmentStatus};
use crate::entities::project::{self, ProjectStatus};
use crate::error::AppError;
use crate::extract::AdminUser;
use crate::routes::{non_blank, require, ActionResponse};
use crate::AppState;

/// Admin create/edit payload. `raised_amount` is derived from investments
/// and cannot be set here.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProjectInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub goal_amount: i64,
    #[serde(default)]
    pub investor_count: i32,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    /// `active` on create; left unchanged on edit when omitted
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProjectInput {
    fn validate(&self) -> Result<(), AppError> {
        require("title", &self.title)?;
        if self.goal_amount <= 0 {
            return Err(AppError::InvalidRequest("goal_amount must be positive".to_string()));
        }
        if self.investor_count < 0 {
            return Err(AppError::InvalidRequest("investor_count must not be negative".to_string()));
        }
        Ok(())
    }

    fn apply(self, active: &mut project::ActiveModel) {
        active.title = Set(self.title.trim().to_string());
        active.description = Set(self.description);
        active.goal_amount = Set(self.goal_amount);
        active.investor_count = Set(self.investor_count);
        active.deadline = Set(self.deadline);
        if let Some(status) = self.status {
            active.status = Set(status);
        }
        active.image_url = Set(non_blank(self.image_url));
        active.updated_at = Set(Utc::now());
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectList {
    pub projects: Vec<project::Model>,
    /// Sum of `raised_amount` across the listed projects
    pub total_raised: i64,
    /// Sum of `investor_count` across the listed projects
    pub total_investors: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectDetail {
    pub project: project::Model,
    /// Public detail: approved and paid investments, newest first. Admin list: all of them.
    pub investments: Vec<investment::Model>,
}

/// List projects, newest first, with aggregate totals
#[utoipa::path(
    get,
    path = "/projects",
    responses((status = 200, body = ProjectList))
)]
#[tracing::instrument(skip(state))]
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<ProjectList>, AppError> {
    let projects = project::Entity::find()
        .order_by_desc(project::Column::CreatedAt)
        .order_by_desc(project::Column::Id)
        .all(&state.db)
        .await?;

    let total_raised = projects.iter().map(|p| p.raised_amount).sum();
    let total_investors = projects.iter().map(|p| i64::from(p.investor_count)).sum();

    Ok(Json(ProjectList {
        projects,
        total_raised,
        total_investors,
    }))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    params(("id" = i32, Path, description = "Project id")),
    responses((status = 200, body = ProjectDetail), (status = 404))
)]
#[tracing::instrument(skip(state))]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectDetail>, AppError> {
    let project = project::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {}", id)))?;

    let investments = project
        .find_related(investment::Entity)
        .filter(investment::Column::Status.is_in([InvestmentStatus::Approved, InvestmentStatus::Paid]))
        .order_by_desc(investment::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(ProjectDetail { project, investments }))
}

/// Count one page view
#[utoipa::path(
    post,
    path = "/projects/{id}/views",
    params(("id" = i32, Path, description = "Project id")),
    responses((status = 200, body = ActionResponse), (status = 404))
)]
#[tracing::instrument(skip(state))]
pub async fn record_project_view(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ActionResponse>, AppError> {
    counters::increment_project_views(&state.db, id).await?;
    Ok(Json(ActionResponse::ok()))
}

/// All projects with their full investment lists
#[utoipa::path(
    get,
    path = "/admin/projects",
    responses((status = 200, body = [ProjectDetail])),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_list_projects(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<ProjectDetail>>, AppError> {
    let rows = project::Entity::find()
        .find_with_related(investment::Entity)
        .order_by_desc(project::Column::CreatedAt)
        .order_by_desc(project::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|(project, investments)| ProjectDetail { project, investments })
        .collect();
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/admin/projects",
    request_body = ProjectInput,
    responses((status = 201, body = project::Model)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(title = %input.title))]
pub async fn create_project(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(input): Json<ProjectInput>,
) -> Result<(StatusCode, Json<project::Model>), AppError> {
    input.validate()?;

    let mut active = project::ActiveModel {
        status: Set(ProjectStatus::Active),
        raised_amount: Set(0),
        view_count: Set(0),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    input.apply(&mut active);
    let row = active.insert(&state.db).await?;

    tracing::info!(id = row.id, "project created");
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    put,
    path = "/admin/projects/{id}",
    params(("id" = i32, Path, description = "Project id")),
    request_body = ProjectInput,
    responses((status = 200, body = project::Model), (status = 404)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin, input))]
pub async fn update_project(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(input): Json<ProjectInput>,
) -> Result<Json<project::Model>, AppError> {
    input.validate()?;

    let existing = project::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project {}", id)))?;
    let mut active: project::ActiveModel = existing.into();
    input.apply(&mut active);
    Ok(Json(active.update(&state.db).await?))
}

/// Delete a project and, through the foreign key, its investments
#[utoipa::path(
    delete,
    path = "/admin/projects/{id}",
    params(("id" = i32, Path, description = "Project id")),
    responses((status = 200, body = ActionResponse), (status = 404)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn delete_project(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<ActionResponse>, AppError> {
    let result = project::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("project {}", id)));
    }
    tracing::info!(id, "project deleted");
    Ok(Json(ActionResponse::ok()))
}
