use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::cattle::{self, CattleStatus};
use crate::entities::order::{self, OrderStatus};
use crate::error::AppError;
use crate::extract::AdminUser;
use crate::routes::{non_blank, require};
use crate::AppState;

const DEFAULT_PAYMENT_METHOD: &str = "cash";

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderRequest {
    pub customer_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    /// Defaults to `cash`
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderStatusRequest {
    pub status: OrderStatus,
}

/// An order together with the listing it was placed for.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithCattle {
    #[serde(flatten)]
    pub order: order::Model,
    pub cattle: Option<cattle::Model>,
}

/// Place a purchase order for a listing
#[utoipa::path(
    post,
    path = "/cattle/{id}/orders",
    params(("id" = i32, Path, description = "Cattle id")),
    request_body = OrderRequest,
    responses(
        (status = 201, description = "Order recorded as pending", body = order::Model),
        (status = 400, description = "Missing fields or listing not available"),
        (status = 404, description = "Unknown listing")
    )
)]
#[tracing::instrument(skip(state, request))]
pub async fn place_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<order::Model>), AppError> {
    require("customer_name", &request.customer_name)?;
    require("phone", &request.phone)?;
    require("address", &request.address)?;

    let listing = cattle::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cattle {}", id)))?;
    if listing.status != CattleStatus::Available {
        return Err(AppError::InvalidRequest(format!("{} is not available", listing.name)));
    }

    let row = order::ActiveModel {
        cattle_id: Set(listing.id),
        customer_name: Set(request.customer_name.trim().to_string()),
        phone: Set(request.phone.trim().to_string()),
        email: Set(non_blank(request.email)),
        address: Set(request.address.trim().to_string()),
        delivery_date: Set(request.delivery_date),
        payment_method: Set(non_blank(request.payment_method)
            .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string())),
        message: Set(non_blank(request.message)),
        status: Set(OrderStatus::Pending),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(order_id = row.id, cattle_id = id, "order placed");
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    get,
    path = "/admin/orders",
    responses((status = 200, body = [OrderWithCattle])),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_list_orders(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<OrderWithCattle>>, AppError> {
    let rows = order::Entity::find()
        .find_also_related(cattle::Entity)
        .order_by_desc(order::Column::CreatedAt)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|(order, cattle)| OrderWithCattle { order, cattle })
        .collect();
    Ok(Json(rows))
}

#[utoipa::path(
    patch,
    path = "/admin/orders/{id}/status",
    params(("id" = i32, Path, description = "Order id")),
    request_body = OrderStatusRequest,
    responses((status = 200, body = order::Model), (status = 404)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn update_order_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(request): Json<OrderStatusRequest>,
) -> Result<Json<order::Model>, AppError> {
    let existing = order::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {}", id)))?;
    let mut active: order::ActiveModel = existing.into();
    active.status = Set(request.status);
    let row = active.update(&state.db).await?;

    tracing::info!(order_id = id, status = ?row.status, "order status updated");
    Ok(Json(row))
}
