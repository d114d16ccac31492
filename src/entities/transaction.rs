use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PayoutStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Paid")]
    Paid,
}

/// A recorded sale of a consigned item.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub item_id: Uuid,
    pub consignor_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub sale_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub split_percentage: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub consignor_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub shop_amount: Decimal,
    pub payment_method: String,
    pub payout_status: PayoutStatus,
    pub payout_id: Option<Uuid>,
    pub consignor_paid_out: bool,
    pub is_voided: bool,
    pub voided_at: Option<DateTime<Utc>>,
    pub void_reason: Option<String>,
    pub sold_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Unpaid and not voided.
    pub fn is_payable(&self) -> bool {
        !self.is_voided && !self.consignor_paid_out && self.payout_id.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::item::Entity",
        from = "Column::ItemId",
        to = "super::item::Column::Id"
    )]
    Item,
    #[sea_orm(
        belongs_to = "super::consignor::Entity",
        from = "Column::ConsignorId",
        to = "super::consignor::Column::Id"
    )]
    Consignor,
    #[sea_orm(
        belongs_to = "super::payout::Entity",
        from = "Column::PayoutId",
        to = "super::payout::Column::Id"
    )]
    Payout,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl Related<super::consignor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consignor.def()
    }
}

impl Related<super::payout::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payout.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert && active_model.created_at.is_not_set() {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);
        Ok(active_model)
    }
}
