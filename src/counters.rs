//! Page-view counters. Each call is one `UPDATE … SET view_count = view_count + 1`;
//! there is no per-viewer deduplication.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::{blog_post, project};
use crate::error::AppError;

pub async fn increment_project_views<C: ConnectionTrait>(conn: &C, project_id: i32) -> Result<(), AppError> {
    let result = project::Entity::update_many()
        .col_expr(
            project::Column::ViewCount,
            Expr::col(project::Column::ViewCount).add(1),
        )
        .filter(project::Column::Id.eq(project_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("project {}", project_id)));
    }
    Ok(())
}

pub async fn increment_blog_views<C: ConnectionTrait>(conn: &C, post_id: i32) -> Result<(), AppError> {
    let result = blog_post::Entity::update_many()
        .col_expr(
            blog_post::Column::ViewCount,
            Expr::col(blog_post::Column::ViewCount).add(1),
        )
        .filter(blog_post::Column::Id.eq(post_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("blog post {}", post_id)));
    }
    Ok(())
}
