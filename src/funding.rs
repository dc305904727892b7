//! Investment status workflow and the project raised-amount it drives.
//!
//! `projects.raised_amount` is always recomputed as the sum of the project's
//! approved and paid investments inside the same transaction as the write
//! that changed them. Re-selecting a status is therefore idempotent and
//! moving an investment out of approved/paid takes its amount back out.
//!
//! The recompute takes a row lock on the project before summing. Under read
//! committed isolation the sum then runs on a snapshot taken after any
//! competing writer to the same project has committed, so two concurrent
//! updates cannot lose each other's contribution.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Select, Set, TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::investment::{self, InvestmentStatus};
use crate::entities::project;
use crate::error::AppError;
use crate::services::{notifications, Mailer};

/// Result of a status update.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusChange {
    pub investment: investment::Model,
    pub previous_status: InvestmentStatus,
    /// The owning project's raised amount after the update
    pub raised_amount: i64,
}

/// Sum of approved and paid investment amounts for `project_id`.
pub async fn counted_total<C: ConnectionTrait>(conn: &C, project_id: i32) -> Result<i64, DbErr> {
    let amounts: Vec<i64> = investment::Entity::find()
        .select_only()
        .column(investment::Column::Amount)
        .filter(investment::Column::ProjectId.eq(project_id))
        .filter(investment::Column::Status.is_in([InvestmentStatus::Approved, InvestmentStatus::Paid]))
        .into_tuple::<i64>()
        .all(conn)
        .await?;
    Ok(amounts.into_iter().sum())
}

/// `SELECT .. FOR UPDATE` on one project row.
pub fn lock_project(project_id: i32) -> Select<project::Entity> {
    project::Entity::find_by_id(project_id).lock_exclusive()
}

/// Rewrites the project's raised amount from its counted investments and returns it.
/// Must run inside a transaction; the project row stays locked until it ends.
pub async fn recompute_raised_amount<C: ConnectionTrait>(conn: &C, project_id: i32) -> Result<i64, DbErr> {
    // Lock before summing, never after.
    lock_project(project_id).one(conn).await?;
    let total = counted_total(conn, project_id).await?;
    project::Entity::update_many()
        .col_expr(project::Column::RaisedAmount, Expr::value(total))
        .col_expr(project::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(project::Column::Id.eq(project_id))
        .exec(conn)
        .await?;
    tracing::debug!(project_id, total, "recomputed raised amount");
    Ok(total)
}

/// Recomputes several projects in ascending id order so concurrent callers
/// take the row locks in the same order.
pub async fn recompute_raised_amounts<C: ConnectionTrait>(conn: &C, project_ids: &[i32]) -> Result<(), DbErr> {
    let mut ids = project_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    for id in ids {
        recompute_raised_amount(conn, id).await?;
    }
    Ok(())
}

/// Recomputes every project's raised amount. Returns how many projects were touched.
pub async fn recompute_all(db: &DatabaseConnection) -> Result<usize, DbErr> {
    let ids: Vec<i32> = project::Entity::find()
        .select_only()
        .column(project::Column::Id)
        .into_tuple::<i32>()
        .all(db)
        .await?;

    for id in &ids {
        let txn = db.begin().await?;
        recompute_raised_amount(&txn, *id).await?;
        txn.commit().await?;
    }
    Ok(ids.len())
}

/// Overwrites an investment's status (any status may follow any other) and
/// re-derives the owning project's raised amount. The status-change email is
/// sent after commit and only when the status actually changed; its failure
/// is logged and ignored.
#[tracing::instrument(skip(db, mailer))]
pub async fn update_investment_status(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    investment_id: i32,
    raw_status: &str,
) -> Result<StatusChange, AppError> {
    let status: InvestmentStatus = raw_status
        .parse()
        .map_err(|_| AppError::InvalidRequest("Invalid status".to_string()))?;

    let txn = db.begin().await?;

    let existing = investment::Entity::find_by_id(investment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("investment {}", investment_id)))?;
    let previous_status = existing.status;

    let mut active: investment::ActiveModel = existing.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    let raised_amount = recompute_raised_amount(&txn, updated.project_id).await?;
    let project_title = project::Entity::find_by_id(updated.project_id)
        .one(&txn)
        .await?
        .map(|p| p.title)
        .unwrap_or_default();

    txn.commit().await?;

    tracing::info!(
        from = %previous_status,
        to = %status,
        project_id = updated.project_id,
        raised_amount,
        "investment status updated"
    );

    if previous_status != status {
        let email = notifications::investment_status_changed(&updated, &project_title);
        notifications::deliver_best_effort(mailer, email, "investment-status").await;
    }

    Ok(StatusChange {
        investment: updated,
        previous_status,
        raised_amount,
    })
}
