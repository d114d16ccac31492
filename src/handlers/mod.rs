pub mod admin;
pub mod auth;
pub mod categories;
pub mod common;
pub mod consignors;
pub mod items;
pub mod organization;
pub mod payouts;
pub mod portal;
pub mod statements;
pub mod storefront;
pub mod transactions;
pub mod webhooks;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    categories::CategoryService, consignors::ConsignorService, items::ItemService,
    organizations::OrganizationService, payouts::PayoutService,
    registration::RegistrationService, statements::StatementService,
    storefront::StorefrontService, subscriptions::SubscriptionService,
    transactions::TransactionService,
};
use rust_decimal::Decimal;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub registration: Arc<RegistrationService>,
    pub organizations: Arc<OrganizationService>,
    pub consignors: Arc<ConsignorService>,
    pub categories: Arc<CategoryService>,
    pub items: Arc<ItemService>,
    pub transactions: Arc<TransactionService>,
    pub payouts: Arc<PayoutService>,
    pub statements: Arc<StatementService>,
    pub storefront: Arc<StorefrontService>,
    pub subscriptions: Arc<SubscriptionService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        Self {
            registration: Arc::new(RegistrationService::new(
                db_pool.clone(),
                event_sender.clone(),
                Decimal::from(config.default_split_percentage),
                config.store_code_length,
            )),
            organizations: Arc::new(OrganizationService::new(db_pool.clone())),
            consignors: Arc::new(ConsignorService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            categories: Arc::new(CategoryService::new(db_pool.clone())),
            items: Arc::new(ItemService::new(db_pool.clone())),
            transactions: Arc::new(TransactionService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            payouts: Arc::new(PayoutService::new(db_pool.clone(), event_sender.clone())),
            statements: Arc::new(StatementService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            storefront: Arc::new(StorefrontService::new(db_pool.clone())),
            subscriptions: Arc::new(SubscriptionService::new(db_pool, event_sender)),
        }
    }
}
