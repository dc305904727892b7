// Backfill investor accounts for investments submitted before investors could sign in.
//
// For each unlinked investment: reuse the profile with the same email, or
// create a pre-confirmed auth identity plus profile, then set investor_id.
// A failing row is logged and counted; the run carries on.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::entities::{investment, investor_profile};
use crate::error::AppError;
use crate::routes::{check_password, normalize_email};
use crate::services::{AuthProvider, NewUserMetadata, INVESTOR_ROLE};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkSummary {
    pub linked: usize,
    pub accounts_created: usize,
    pub errors: usize,
}

async fn profile_for(
    db: &DatabaseConnection,
    auth: &dyn AuthProvider,
    row: &investment::Model,
    default_password: &str,
    summary: &mut LinkSummary,
) -> Result<Uuid, AppError> {
    let email = normalize_email(&row.email);

    let existing = investor_profile::Entity::find()
        .filter(investor_profile::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;
    if let Some(profile) = existing {
        info!(investment_id = row.id, investor_id = %profile.id, "account already exists, linking");
        return Ok(profile.id);
    }

    let phone = Some(row.phone.trim().to_string()).filter(|p| !p.is_empty());
    let metadata = NewUserMetadata {
        role: INVESTOR_ROLE.to_string(),
        investor_name: row.investor_name.clone(),
        phone: phone.clone(),
    };
    let user = auth.admin_create_user(&email, default_password, &metadata).await?;
    info!(investment_id = row.id, user_id = %user.id, "created auth user");

    investor_profile::ActiveModel {
        id: Set(user.id),
        investor_name: Set(row.investor_name.clone()),
        email: Set(email),
        phone: Set(phone),
        address: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;
    summary.accounts_created += 1;

    Ok(user.id)
}

pub async fn run_link_investor_accounts(
    db: &DatabaseConnection,
    auth: &dyn AuthProvider,
    default_password: &str,
) -> anyhow::Result<LinkSummary> {
    check_password(default_password)
        .map_err(|e| anyhow::anyhow!("INVESTOR_DEFAULT_PASSWORD rejected: {}", e))?;

    let unlinked = investment::Entity::find()
        .filter(investment::Column::InvestorId.is_null())
        .order_by_asc(investment::Column::Id)
        .all(db)
        .await?;

    if unlinked.is_empty() {
        info!("no investments without investor accounts");
        return Ok(LinkSummary::default());
    }
    info!(count = unlinked.len(), "investments without accounts");

    let mut summary = LinkSummary::default();
    for row in unlinked {
        let investor_id = match profile_for(db, auth, &row, default_password, &mut summary).await {
            Ok(id) => id,
            Err(e) => {
                error!(investment_id = row.id, email = %row.email, error = %e, "could not resolve investor account");
                summary.errors += 1;
                continue;
            }
        };

        let id = row.id;
        let mut active: investment::ActiveModel = row.into();
        active.investor_id = Set(Some(investor_id));
        active.updated_at = Set(Utc::now());
        match active.update(db).await {
            Ok(_) => summary.linked += 1,
            Err(e) => {
                error!(investment_id = id, error = %e, "failed to link investment");
                summary.errors += 1;
            }
        }
    }

    if summary.accounts_created > 0 {
        warn!(
            accounts = summary.accounts_created,
            "new accounts use the default password and should change it after first login"
        );
    }
    info!(?summary, "investor account backfill finished");
    Ok(summary)
}
