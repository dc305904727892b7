use axum::{extract::State, Json};
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::cattle::{self, CattleStatus};
use crate::entities::investment::{self, InvestmentStatus};
use crate::entities::project::{self, ProjectStatus};
use crate::entities::{contact, order};
use crate::error::AppError;
use crate::extract::AdminUser;
use crate::AppState;

const FEATURED_CATTLE: u64 = 3;
const RECENT_INVESTMENTS: u64 = 6;

#[derive(Debug, Serialize, ToSchema)]
pub struct RecentInvestment {
    pub investor_name: String,
    pub amount: i64,
    pub project_title: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Figures shown on the public home page.
#[derive(Debug, Serialize, ToSchema)]
pub struct SiteStats {
    pub total_orders: u64,
    pub active_projects: u64,
    pub total_raised: i64,
    pub featured_cattle: Vec<cattle::Model>,
    pub recent_investments: Vec<RecentInvestment>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminDashboard {
    pub cattle: u64,
    pub projects: u64,
    pub orders: u64,
    pub investments: u64,
    pub contacts: u64,
    /// Sum of every investment amount, whatever its status
    pub total_investment_amount: i64,
}

#[utoipa::path(
    get,
    path = "/stats",
    responses((status = 200, body = SiteStats))
)]
#[tracing::instrument(skip(state))]
pub async fn site_stats(State(state): State<AppState>) -> Result<Json<SiteStats>, AppError> {
    let db = &state.db;

    let (total_orders, active_projects, raised, featured_cattle, recent) = futures::try_join!(
        order::Entity::find().count(db),
        project::Entity::find()
            .filter(project::Column::Status.eq(ProjectStatus::Active))
            .count(db),
        project::Entity::find()
            .select_only()
            .column(project::Column::RaisedAmount)
            .into_tuple::<i64>()
            .all(db),
        cattle::Entity::find()
            .filter(cattle::Column::Status.eq(CattleStatus::Available))
            .order_by_desc(cattle::Column::CreatedAt)
            .limit(FEATURED_CATTLE)
            .all(db),
        investment::Entity::find()
            .filter(investment::Column::Status.eq(InvestmentStatus::Approved))
            .find_also_related(project::Entity)
            .order_by_desc(investment::Column::CreatedAt)
            .limit(RECENT_INVESTMENTS)
            .all(db),
    )?;

    let recent_investments = recent
        .into_iter()
        .map(|(inv, project)| RecentInvestment {
            investor_name: inv.investor_name,
            amount: inv.amount,
            project_title: project.map(|p| p.title),
            created_at: inv.created_at,
        })
        .collect();

    Ok(Json(SiteStats {
        total_orders,
        active_projects,
        total_raised: raised.into_iter().sum(),
        featured_cattle,
        recent_investments,
    }))
}

#[utoipa::path(
    get,
    path = "/admin/dashboard",
    responses((status = 200, body = AdminDashboard)),
    security(("bearer" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<AdminDashboard>, AppError> {
    let db = &state.db;

    let (cattle, projects, orders, investments, contacts, amounts) = futures::try_join!(
        cattle::Entity::find().count(db),
        project::Entity::find().count(db),
        order::Entity::find().count(db),
        investment::Entity::find().count(db),
        contact::Entity::find().count(db),
        investment::Entity::find()
            .select_only()
            .column(investment::Column::Amount)
            .into_tuple::<i64>()
            .all(db),
    )?;

    Ok(Json(AdminDashboard {
        cattle,
        projects,
        orders,
        investments,
        contacts,
        total_investment_amount: amounts.into_iter().sum(),
    }))
}
