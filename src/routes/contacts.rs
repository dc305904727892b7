use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::entities::contact::{self, ContactStatus};
use crate::error::AppError;
use crate::extract::AdminUser;
use crate::routes::{non_blank, normalize_email, require};
use crate::services::notifications;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplyRequest {
    pub message: String,
}

/// Leave a message for the farm
#[utoipa::path(
    post,
    path = "/contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Stored; the admin notification is best-effort", body = contact::Model),
        (status = 400)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> Result<(StatusCode, Json<contact::Model>), AppError> {
    require("name", &request.name)?;
    require("email", &request.email)?;
    require("subject", &request.subject)?;
    require("message", &request.message)?;

    let row = contact::ActiveModel {
        name: Set(request.name.trim().to_string()),
        email: Set(normalize_email(&request.email)),
        phone: Set(non_blank(request.phone)),
        subject: Set(request.subject.trim().to_string()),
        message: Set(request.message),
        status: Set(ContactStatus::New),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(contact_id = row.id, "contact message stored");

    match state.config.notify_email.as_deref() {
        Some(inbox) => {
            let email = notifications::contact_received(inbox, &row);
            notifications::deliver_best_effort(state.mailer.as_ref(), email, "contact").await;
        }
        None => tracing::debug!("NOTIFY_EMAIL not set, skipping contact notification"),
    }

    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    get,
    path = "/admin/contacts",
    responses((status = 200, body = [contact::Model])),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_list_contacts(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<contact::Model>>, AppError> {
    let rows = contact::Entity::find()
        .order_by_desc(contact::Column::CreatedAt)
        .order_by_desc(contact::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(rows))
}

/// Email a reply to the sender, then mark the message replied
#[utoipa::path(
    post,
    path = "/admin/contacts/{id}/reply",
    params(("id" = i32, Path, description = "Contact message id")),
    request_body = ReplyRequest,
    responses(
        (status = 200, body = contact::Model),
        (status = 404),
        (status = 502, description = "Email could not be sent; status left unchanged")
    ),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin, request))]
pub async fn reply_to_contact(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(request): Json<ReplyRequest>,
) -> Result<Json<contact::Model>, AppError> {
    require("message", &request.message)?;

    let existing = contact::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("contact {}", id)))?;

    state
        .mailer
        .send(notifications::contact_reply(&existing, &request.message))
        .await?;

    let mut active: contact::ActiveModel = existing.into();
    active.status = Set(ContactStatus::Replied);
    let row = active.update(&state.db).await?;

    tracing::info!(contact_id = id, "reply sent");
    Ok(Json(row))
}
