use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stripe subscription state mirrored onto the organization.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubscriptionStatus {
    #[sea_orm(string_value = "none")]
    None,
    #[sea_orm(string_value = "trialing")]
    Trialing,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "past_due")]
    PastDue,
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

impl SubscriptionStatus {
    /// Maps a Stripe subscription `status` string.
    pub fn from_stripe(status: &str) -> Self {
        match status {
            "trialing" => Self::Trialing,
            "active" => Self::Active,
            "past_due" | "unpaid" | "incomplete" => Self::PastDue,
            "canceled" | "incomplete_expired" => Self::Canceled,
            _ => Self::None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(unique)]
    pub store_code: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub default_split_percentage: Decimal,
    pub auto_approve_consignors: bool,
    pub is_active: bool,
    pub subscription_status: SubscriptionStatus,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user::Entity")]
    Users,
    #[sea_orm(has_many = "super::consignor::Entity")]
    Consignors,
    #[sea_orm(has_many = "super::item::Entity")]
    Items,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::consignor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consignors.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
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

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("trialing", SubscriptionStatus::Trialing)]
    #[case("active", SubscriptionStatus::Active)]
    #[case("past_due", SubscriptionStatus::PastDue)]
    #[case("unpaid", SubscriptionStatus::PastDue)]
    #[case("incomplete", SubscriptionStatus::PastDue)]
    #[case("canceled", SubscriptionStatus::Canceled)]
    #[case("incomplete_expired", SubscriptionStatus::Canceled)]
    #[case("paused", SubscriptionStatus::None)]
    fn maps_stripe_subscription_status(#[case] stripe: &str, #[case] expected: SubscriptionStatus) {
        assert_eq!(SubscriptionStatus::from_stripe(stripe), expected);
    }
}
