//! Fixtures shared by the in-crate service tests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::db::{establish_connection_with_config, run_migrations, DbConfig};
use crate::entities::{
    consignor::{self, ConsignorStatus},
    item::{self, ItemStatus},
    item_category, organization,
    organization::SubscriptionStatus,
    transaction::{self, PayoutStatus},
    user::{self, UserRole},
    ApprovalStatus,
};
use crate::events::{Event, EventSender};

pub struct TestDb {
    pub db: Arc<DatabaseConnection>,
    pub events: Arc<EventSender>,
    pub event_rx: mpsc::Receiver<Event>,
}

pub async fn setup() -> TestDb {
    let db = establish_connection_with_config(&DbConfig::single_connection("sqlite::memory:"))
        .await
        .expect("sqlite connection");
    run_migrations(&db).await.expect("migrations");
    let (tx, event_rx) = mpsc::channel(64);
    TestDb {
        db: Arc::new(db),
        events: Arc::new(EventSender::new(tx)),
        event_rx,
    }
}

pub async fn organization(db: &DatabaseConnection, split: Decimal) -> organization::Model {
    let id = Uuid::new_v4();
    organization::ActiveModel {
        id: Set(id),
        name: Set("Second Act Boutique".to_string()),
        slug: Set(format!("second-act-{}", &id.simple().to_string()[..8])),
        store_code: Set(Some(id.simple().to_string()[..6].to_uppercase())),
        default_split_percentage: Set(split),
        auto_approve_consignors: Set(false),
        is_active: Set(true),
        subscription_status: Set(SubscriptionStatus::Active),
        stripe_customer_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert organization")
}

pub async fn consignor(
    db: &DatabaseConnection,
    organization_id: Uuid,
    number: u32,
    split: Option<Decimal>,
) -> consignor::Model {
    consignor::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(organization_id),
        consignor_number: Set(format!("C-{:04}", number)),
        first_name: Set("Ada".to_string()),
        last_name: Set(format!("Consignor{}", number)),
        email: Set(Some(format!("consignor{}@example.com", number))),
        phone: Set(None),
        split_percentage: Set(split),
        status: Set(ConsignorStatus::Active),
        approval_status: Set(ApprovalStatus::Approved),
        notes: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert consignor")
}

pub async fn category(db: &DatabaseConnection, organization_id: Uuid, name: &str) -> item_category::Model {
    item_category::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(organization_id),
        name: Set(name.to_string()),
        description: Set(None),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert category")
}

pub async fn item(
    db: &DatabaseConnection,
    organization_id: Uuid,
    consignor_id: Uuid,
    category_id: Option<Uuid>,
    price: Decimal,
) -> item::Model {
    let id = Uuid::new_v4();
    item::ActiveModel {
        id: Set(id),
        organization_id: Set(organization_id),
        consignor_id: Set(consignor_id),
        category_id: Set(category_id),
        sku: Set(format!("SKU-{}", &id.simple().to_string()[..8])),
        title: Set("Wool coat".to_string()),
        description: Set(None),
        price: Set(price),
        status: Set(ItemStatus::Available),
        is_public: Set(true),
        received_at: Set(Utc::now()),
        sold_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert item")
}

/// Inserts a sold item and its sale directly, bypassing the sales service.
pub async fn sale(
    db: &DatabaseConnection,
    organization_id: Uuid,
    consignor_id: Uuid,
    sale_price: Decimal,
    consignor_amount: Decimal,
    sold_at: DateTime<Utc>,
) -> transaction::Model {
    let item = item(db, organization_id, consignor_id, None, sale_price).await;
    transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(organization_id),
        item_id: Set(item.id),
        consignor_id: Set(consignor_id),
        sale_price: Set(sale_price),
        split_percentage: Set(Decimal::from(50)),
        consignor_amount: Set(consignor_amount),
        shop_amount: Set(sale_price - consignor_amount),
        payment_method: Set("cash".to_string()),
        payout_status: Set(PayoutStatus::Pending),
        payout_id: Set(None),
        consignor_paid_out: Set(false),
        is_voided: Set(false),
        voided_at: Set(None),
        void_reason: Set(None),
        sold_at: Set(sold_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert transaction")
}

pub async fn user(
    db: &DatabaseConnection,
    organization_id: Option<Uuid>,
    role: UserRole,
    approval_status: ApprovalStatus,
) -> user::Model {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        organization_id: Set(organization_id),
        email: Set(format!("{}@example.com", id.simple())),
        full_name: Set("Test User".to_string()),
        password_hash: Set(crate::auth::password::hash_password("password123").expect("hash")),
        role: Set(role),
        approval_status: Set(approval_status),
        approved_by: Set(None),
        approved_at: Set(None),
        rejected_reason: Set(None),
        consignor_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
}
