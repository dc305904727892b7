use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "delivered")]
    Delivered,
}

/// A purchase request for one animal.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "orders")]
#[schema(as = Order)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    pub cattle_id: i32,
    pub customer_name: String,
    pub phone: String,
    pub email: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    pub delivery_date: Option<NaiveDate>,
    pub payment_method: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cattle::Entity",
        from = "Column::CattleId",
        to = "super::cattle::Column::Id",
        on_delete = "Cascade"
    )]
    Cattle,
}

impl Related<super::cattle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cattle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
