use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Periodic balance summary for one consignor.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "statements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub consignor_id: Uuid,
    pub statement_number: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub opening_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_sales: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_earnings: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_payouts: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub closing_balance: Decimal,
    pub items_sold: i32,
    pub payout_count: i32,
    pub generated_at: DateTime<Utc>,
    pub generated_by: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::consignor::Entity",
        from = "Column::ConsignorId",
        to = "super::consignor::Column::Id"
    )]
    Consignor,
}

impl Related<super::consignor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consignor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
