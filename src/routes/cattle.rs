use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::entities::cattle::{self, media_urls, CattleStatus};
use crate::error::AppError;
use crate::extract::AdminUser;
use crate::routes::{require, ActionResponse};
use crate::AppState;

const RELATED_LIMIT: u64 = 3;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CattleQuery {
    /// Listing status. Defaults to `available`.
    #[param(required = false)]
    pub status: Option<CattleStatus>,
    /// Exact breed match
    #[param(required = false)]
    pub breed: Option<String>,
    #[param(required = false)]
    pub min_price: Option<i64>,
    #[param(required = false)]
    pub max_price: Option<i64>,
}

/// Admin create/edit payload for a listing.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CattleInput {
    pub name: String,
    pub breed: String,
    /// Live weight in kg
    pub weight: f64,
    /// Age in months
    pub age: i32,
    pub price: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    /// `available` on create; left unchanged on edit when omitted
    #[serde(default)]
    pub status: Option<CattleStatus>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
}

impl CattleInput {
    fn validate(&self) -> Result<(), AppError> {
        require("name", &self.name)?;
        require("breed", &self.breed)?;
        if self.price < 0 {
            return Err(AppError::InvalidRequest("price must not be negative".to_string()));
        }
        if self.weight < 0.0 || self.age < 0 {
            return Err(AppError::InvalidRequest("weight and age must not be negative".to_string()));
        }
        Ok(())
    }

    fn apply(self, active: &mut cattle::ActiveModel) {
        active.name = Set(self.name.trim().to_string());
        active.breed = Set(self.breed.trim().to_string());
        active.weight = Set(self.weight);
        active.age = Set(self.age);
        active.price = Set(self.price);
        active.description = Set(self.description);
        active.location = Set(self.location.trim().to_string());
        if let Some(status) = self.status {
            active.status = Set(status);
        }
        active.images = Set(media_urls(self.images));
        active.videos = Set(media_urls(self.videos));
        active.updated_at = Set(Utc::now());
    }
}

/// List cattle, filtered by status, breed and price range
#[utoipa::path(
    get,
    path = "/cattle",
    params(CattleQuery),
    responses((status = 200, description = "Matching listings ordered by id", body = [cattle::Model]))
)]
#[tracing::instrument(skip(state))]
pub async fn list_cattle(
    State(state): State<AppState>,
    Query(query): Query<CattleQuery>,
) -> Result<Json<Vec<cattle::Model>>, AppError> {
    let mut select = cattle::Entity::find()
        .filter(cattle::Column::Status.eq(query.status.unwrap_or(CattleStatus::Available)));

    if let Some(breed) = query.breed.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
        select = select.filter(cattle::Column::Breed.eq(breed));
    }
    if let Some(min) = query.min_price {
        select = select.filter(cattle::Column::Price.gte(min));
    }
    if let Some(max) = query.max_price {
        select = select.filter(cattle::Column::Price.lte(max));
    }

    let rows = select.order_by_asc(cattle::Column::Id).all(&state.db).await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/cattle/{id}",
    params(("id" = i32, Path, description = "Cattle id")),
    responses(
        (status = 200, body = cattle::Model),
        (status = 404, description = "Unknown id")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_cattle(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<cattle::Model>, AppError> {
    let row = cattle::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cattle {}", id)))?;
    Ok(Json(row))
}

/// Up to three other available listings
#[utoipa::path(
    get,
    path = "/cattle/{id}/related",
    params(("id" = i32, Path, description = "Cattle id")),
    responses((status = 200, body = [cattle::Model]))
)]
#[tracing::instrument(skip(state))]
pub async fn related_cattle(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<cattle::Model>>, AppError> {
    let rows = cattle::Entity::find()
        .filter(cattle::Column::Status.eq(CattleStatus::Available))
        .filter(cattle::Column::Id.ne(id))
        .order_by_asc(cattle::Column::Id)
        .limit(RELATED_LIMIT)
        .all(&state.db)
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/admin/cattle",
    responses((status = 200, body = [cattle::Model])),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_list_cattle(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<cattle::Model>>, AppError> {
    let rows = cattle::Entity::find()
        .order_by_desc(cattle::Column::CreatedAt)
        .all(&state.db)
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/admin/cattle",
    request_body = CattleInput,
    responses((status = 201, body = cattle::Model)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(name = %input.name))]
pub async fn create_cattle(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(input): Json<CattleInput>,
) -> Result<(StatusCode, Json<cattle::Model>), AppError> {
    input.validate()?;

    let now = Utc::now();
    let mut active = cattle::ActiveModel {
        status: Set(CattleStatus::Available),
        created_at: Set(now),
        ..Default::default()
    };
    input.apply(&mut active);
    let row = active.insert(&state.db).await?;

    tracing::info!(id = row.id, "cattle listing created");
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    put,
    path = "/admin/cattle/{id}",
    params(("id" = i32, Path, description = "Cattle id")),
    request_body = CattleInput,
    responses((status = 200, body = cattle::Model), (status = 404)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin, input))]
pub async fn update_cattle(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(input): Json<CattleInput>,
) -> Result<Json<cattle::Model>, AppError> {
    input.validate()?;

    let existing = cattle::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cattle {}", id)))?;
    let mut active: cattle::ActiveModel = existing.into();
    input.apply(&mut active);
    Ok(Json(active.update(&state.db).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/cattle/{id}",
    params(("id" = i32, Path, description = "Cattle id")),
    responses((status = 200, body = ActionResponse), (status = 404)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn delete_cattle(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<ActionResponse>, AppError> {
    let result = cattle::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("cattle {}", id)));
    }
    tracing::info!(id, "cattle listing deleted");
    Ok(Json(ActionResponse::ok()))
}
