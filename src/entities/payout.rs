use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A payment batch to a consignor covering one or more sales.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payouts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub consignor_id: Uuid,
    #[sea_orm(unique)]
    pub payout_number: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub transaction_count: i32,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::consignor::Entity",
        from = "Column::ConsignorId",
        to = "super::consignor::Column::Id"
    )]
    Consignor,
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::consignor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consignor.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
