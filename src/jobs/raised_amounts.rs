use sea_orm::DatabaseConnection;
use tracing::info;

use crate::funding;

/// Rewrites every project's `raised_amount` from its approved and paid
/// investments. Repairs totals inflated by repeated approvals.
pub async fn run_recompute_raised(db: &DatabaseConnection) -> anyhow::Result<usize> {
    info!("recomputing raised amounts");
    let projects = funding::recompute_all(db).await?;
    info!(projects, "raised amounts recomputed");
    Ok(projects)
}
