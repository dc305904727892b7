use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Workflow status of an investment. Any status may be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum InvestmentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl InvestmentStatus {
    pub const ALL: [InvestmentStatus; 5] = [
        InvestmentStatus::Pending,
        InvestmentStatus::Approved,
        InvestmentStatus::Unpaid,
        InvestmentStatus::Paid,
        InvestmentStatus::Rejected,
    ];

    /// Whether an investment in this status counts toward its project's raised amount.
    pub fn counts_toward_raised(self) -> bool {
        matches!(self, InvestmentStatus::Approved | InvestmentStatus::Paid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InvestmentStatus::Pending => "pending",
            InvestmentStatus::Approved => "approved",
            InvestmentStatus::Unpaid => "unpaid",
            InvestmentStatus::Paid => "paid",
            InvestmentStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for InvestmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InvestmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid status: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum InvestmentType {
    #[sea_orm(string_value = "6-months")]
    #[serde(rename = "6-months")]
    SixMonths,
    #[sea_orm(string_value = "12-months")]
    #[serde(rename = "12-months")]
    TwelveMonths,
    #[sea_orm(string_value = "one-time")]
    #[serde(rename = "one-time")]
    OneTime,
    #[sea_orm(string_value = "monthly")]
    #[serde(rename = "monthly")]
    Monthly,
    #[sea_orm(string_value = "quarterly")]
    #[serde(rename = "quarterly")]
    Quarterly,
}

impl InvestmentType {
    pub fn label(self) -> &'static str {
        match self {
            InvestmentType::SixMonths => "6 months",
            InvestmentType::TwelveMonths => "12 months",
            InvestmentType::OneTime => "one-time",
            InvestmentType::Monthly => "monthly",
            InvestmentType::Quarterly => "quarterly",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "investments")]
#[schema(as = Investment)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    pub project_id: i32,
    pub investor_id: Option<Uuid>,
    pub investor_name: String,
    pub email: String,
    pub phone: String,
    pub amount: i64,
    pub investment_type: InvestmentType,
    pub investment_deadline: Option<NaiveDate>,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    pub status: InvestmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::investor_profile::Entity",
        from = "Column::InvestorId",
        to = "super::investor_profile::Column::Id",
        on_delete = "SetNull"
    )]
    InvestorProfile,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::investor_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvestorProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_only_the_allow_list() {
        assert_eq!("paid".parse::<InvestmentStatus>(), Ok(InvestmentStatus::Paid));
        assert_eq!("rejected".parse::<InvestmentStatus>(), Ok(InvestmentStatus::Rejected));
        assert!("Approved".parse::<InvestmentStatus>().is_err());
        assert!("cancelled".parse::<InvestmentStatus>().is_err());
        assert!("".parse::<InvestmentStatus>().is_err());
    }

    #[test]
    fn only_approved_and_paid_count_toward_raised() {
        let counted: Vec<_> = InvestmentStatus::ALL
            .into_iter()
            .filter(|s| s.counts_toward_raised())
            .collect();
        assert_eq!(counted, vec![InvestmentStatus::Approved, InvestmentStatus::Paid]);
    }

    #[test]
    fn investment_type_uses_dashed_wire_names() {
        let json = serde_json::to_string(&InvestmentType::SixMonths).unwrap();
        assert_eq!(json, "\"6-months\"");
        let parsed: InvestmentType = serde_json::from_str("\"one-time\"").unwrap();
        assert_eq!(parsed, InvestmentType::OneTime);
    }
}
