use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::counters;
use crate::entities::blog_post::{self, slugify};
use crate::error::AppError;
use crate::extract::AdminUser;
use crate::routes::{non_blank, require, ActionResponse};
use crate::AppState;

const DEFAULT_AUTHOR: &str = "Admin";

#[derive(Debug, Deserialize, ToSchema)]
pub struct BlogPostInput {
    pub title: String,
    /// Generated from the title when blank
    #[serde(default)]
    pub slug: Option<String>,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl BlogPostInput {
    fn slug(&self) -> Result<String, AppError> {
        let slug = match non_blank(self.slug.clone()) {
            Some(given) => slugify(&given),
            None => slugify(&self.title),
        };
        if slug.is_empty() {
            return Err(AppError::InvalidRequest("a slug could not be derived from the title".to_string()));
        }
        Ok(slug)
    }

    /// Applies the input; `published_at` is stamped on the first publish and cleared on unpublish.
    fn apply(self, active: &mut blog_post::ActiveModel, slug: String, was_published_at: Option<chrono::DateTime<Utc>>) {
        let now = Utc::now();
        active.published_at = Set(match (self.published, was_published_at) {
            (true, Some(at)) => Some(at),
            (true, None) => Some(now),
            (false, _) => None,
        });
        active.title = Set(self.title.trim().to_string());
        active.slug = Set(slug);
        active.content = Set(self.content);
        active.excerpt = Set(non_blank(self.excerpt));
        active.featured_image = Set(non_blank(self.featured_image));
        active.author = Set(non_blank(self.author).unwrap_or_else(|| DEFAULT_AUTHOR.to_string()));
        active.published = Set(self.published);
        active.updated_at = Set(now);
    }
}

async fn slug_taken(state: &AppState, slug: &str, except: Option<i32>) -> Result<bool, AppError> {
    let mut select = blog_post::Entity::find().filter(blog_post::Column::Slug.eq(slug));
    if let Some(id) = except {
        select = select.filter(blog_post::Column::Id.ne(id));
    }
    Ok(select.one(&state.db).await?.is_some())
}

/// Published posts, most recently published first
#[utoipa::path(
    get,
    path = "/blog",
    responses((status = 200, body = [blog_post::Model]))
)]
#[tracing::instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<blog_post::Model>>, AppError> {
    let rows = blog_post::Entity::find()
        .filter(blog_post::Column::Published.eq(true))
        .order_by_desc(blog_post::Column::PublishedAt)
        .order_by_desc(blog_post::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/blog/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses((status = 200, body = blog_post::Model), (status = 404))
)]
#[tracing::instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<blog_post::Model>, AppError> {
    let post = blog_post::Entity::find()
        .filter(blog_post::Column::Slug.eq(slug.as_str()))
        .filter(blog_post::Column::Published.eq(true))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("blog post {}", slug)))?;
    Ok(Json(post))
}

/// Count one read
#[utoipa::path(
    post,
    path = "/blog/{slug}/views",
    params(("slug" = i32, Path, description = "Post id (the segment shares its name with `/blog/{slug}`)")),
    responses((status = 200, body = ActionResponse), (status = 404))
)]
#[tracing::instrument(skip(state))]
pub async fn record_post_view(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ActionResponse>, AppError> {
    counters::increment_blog_views(&state.db, id).await?;
    Ok(Json(ActionResponse::ok()))
}

/// All posts including drafts
#[utoipa::path(
    get,
    path = "/admin/blog",
    responses((status = 200, body = [blog_post::Model])),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_list_posts(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<blog_post::Model>>, AppError> {
    let rows = blog_post::Entity::find()
        .order_by_desc(blog_post::Column::CreatedAt)
        .order_by_desc(blog_post::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/admin/blog",
    request_body = BlogPostInput,
    responses((status = 201, body = blog_post::Model), (status = 409, description = "Slug already in use")),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all, fields(title = %input.title))]
pub async fn create_post(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(input): Json<BlogPostInput>,
) -> Result<(StatusCode, Json<blog_post::Model>), AppError> {
    require("title", &input.title)?;
    let slug = input.slug()?;
    if slug_taken(&state, &slug, None).await? {
        return Err(AppError::Conflict(format!("slug {} is already in use", slug)));
    }

    let mut active = blog_post::ActiveModel {
        view_count: Set(0),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    input.apply(&mut active, slug, None);
    let row = active.insert(&state.db).await?;

    tracing::info!(id = row.id, slug = %row.slug, "blog post created");
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    put,
    path = "/admin/blog/{id}",
    params(("id" = i32, Path, description = "Post id")),
    request_body = BlogPostInput,
    responses((status = 200, body = blog_post::Model), (status = 404), (status = 409)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin, input))]
pub async fn update_post(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
    Json(input): Json<BlogPostInput>,
) -> Result<Json<blog_post::Model>, AppError> {
    require("title", &input.title)?;
    let existing = blog_post::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("blog post {}", id)))?;

    let slug = input.slug()?;
    if slug_taken(&state, &slug, Some(id)).await? {
        return Err(AppError::Conflict(format!("slug {} is already in use", slug)));
    }

    let published_at = existing.published_at;
    let mut active: blog_post::ActiveModel = existing.into();
    input.apply(&mut active, slug, published_at);
    Ok(Json(active.update(&state.db).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/blog/{id}",
    params(("id" = i32, Path, description = "Post id")),
    responses((status = 200, body = ActionResponse), (status = 404)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip(state, _admin))]
pub async fn delete_post(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<ActionResponse>, AppError> {
    let result = blog_post::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("blog post {}", id)));
    }
    tracing::info!(id, "blog post deleted");
    Ok(Json(ActionResponse::ok()))
}
