//! Consignment API Library
//!
//! Multi-tenant back office for consignment shops: consignors, inventory,
//! sales, payouts and statements, plus a public storefront.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod notifications;
pub mod openapi;
pub mod services;
pub mod tracing;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::consts as perm;
use crate::auth::{AuthRouterExt, AuthService};
use crate::entities::user::UserRole;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub auth: Arc<AuthService>,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        auth: Arc<AuthService>,
        event_sender: Arc<events::EventSender>,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), event_sender.clone(), &config);
        Self {
            db,
            config,
            auth,
            event_sender,
            services,
        }
    }
}

// Common response wrappers
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit)
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// `/auth` routes: registration and login are public.
pub fn auth_routes() -> Router<AppState> {
    let session = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
        .with_auth();

    Router::new()
        .route("/register", post(handlers::auth::register_owner))
        .route(
            "/register/consignor",
            post(handlers::auth::register_consignor),
        )
        .route("/login", post(handlers::auth::login))
        .merge(session)
}

pub fn api_v1_routes() -> Router<AppState> {
    let admin = Router::new()
        .route(
            "/admin/registrations/pending",
            get(handlers::admin::pending_owners),
        )
        .route(
            "/admin/registrations/:id/approve",
            post(handlers::admin::approve_owner),
        )
        .route(
            "/admin/registrations/:id/reject",
            post(handlers::admin::reject_owner),
        )
        .with_role(UserRole::Admin);

    let organization_read = Router::new()
        .route("/organization", get(handlers::organization::get_organization))
        .with_auth();

    let organization_manage = Router::new()
        .route(
            "/organization/settings",
            put(handlers::organization::update_settings),
        )
        .with_permission(perm::ORGANIZATION_MANAGE);

    let consignors_read = Router::new()
        .route("/consignors", get(handlers::consignors::list_consignors))
        .route("/consignors/:id", get(handlers::consignors::get_consignor))
        .route(
            "/consignors/:id/balance",
            get(handlers::consignors::consignor_balance),
        )
        .with_permission(perm::CONSIGNORS_READ);

    let consignors_manage = Router::new()
        .route("/consignors", post(handlers::consignors::create_consignor))
        .route(
            "/consignors/:id",
            put(handlers::consignors::update_consignor)
                .delete(handlers::consignors::delete_consignor),
        )
        .route(
            "/consignors/:id/approve",
            post(handlers::consignors::approve_consignor),
        )
        .route(
            "/consignors/:id/reject",
            post(handlers::consignors::reject_consignor),
        )
        .with_permission(perm::CONSIGNORS_MANAGE);

    let inventory_read = Router::new()
        .route("/categories", get(handlers::categories::list_categories))
        .route("/categories/:id", get(handlers::categories::get_category))
        .route("/items", get(handlers::items::list_items))
        .route("/items/:id", get(handlers::items::get_item))
        .with_permission(perm::INVENTORY_READ);

    let inventory_manage = Router::new()
        .route("/categories", post(handlers::categories::create_category))
        .route(
            "/categories/:id",
            put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        .route("/items", post(handlers::items::create_item))
        .route(
            "/items/:id",
            put(handlers::items::update_item).delete(handlers::items::remove_item),
        )
        .with_permission(perm::INVENTORY_MANAGE);

    let sales_read = Router::new()
        .route(
            "/transactions",
            get(handlers::transactions::list_transactions),
        )
        .route(
            "/transactions/:id",
            get(handlers::transactions::get_transaction),
        )
        .with_permission(perm::SALES_READ);

    let sales_create = Router::new()
        .route("/transactions", post(handlers::transactions::record_sale))
        .route(
            "/transactions/:id/void",
            post(handlers::transactions::void_transaction),
        )
        .with_permission(perm::SALES_CREATE);

    let payouts_read = Router::new()
        .route("/payouts", get(handlers::payouts::list_payouts))
        .route("/payouts/pending", get(handlers::payouts::pending_payouts))
        .route("/payouts/:id", get(handlers::payouts::get_payout))
        .with_permission(perm::PAYOUTS_READ);

    let payouts_create = Router::new()
        .route("/payouts", post(handlers::payouts::create_payout))
        .with_permission(perm::PAYOUTS_CREATE);

    let statements_read = Router::new()
        .route("/statements", get(handlers::statements::list_statements))
        .route("/statements/:id", get(handlers::statements::get_statement))
        .with_permission(perm::STATEMENTS_READ);

    let statements_generate = Router::new()
        .route(
            "/statements",
            post(handlers::statements::generate_statement),
        )
        .route(
            "/statements/monthly",
            post(handlers::statements::generate_monthly),
        )
        .with_permission(perm::STATEMENTS_GENERATE);

    let portal = Router::new()
        .route("/portal/me", get(handlers::portal::my_profile))
        .route("/portal/balance", get(handlers::portal::my_balance))
        .route("/portal/items", get(handlers::portal::my_items))
        .route(
            "/portal/transactions",
            get(handlers::portal::my_transactions),
        )
        .route("/portal/payouts", get(handlers::portal::my_payouts))
        .route("/portal/statements", get(handlers::portal::my_statements))
        .route(
            "/portal/statements/:id",
            get(handlers::portal::my_statement),
        )
        .with_permission(perm::PORTAL_READ);

    // Public: storefront pages and the signature-verified Stripe webhook
    let public = Router::new()
        .route(
            "/storefront/:store_code",
            get(handlers::storefront::get_store),
        )
        .route(
            "/storefront/:store_code/items",
            get(handlers::storefront::list_store_items),
        )
        .route(
            "/webhooks/stripe",
            post(handlers::webhooks::stripe_webhook),
        );

    Router::new()
        .route("/status", get(api_status))
        .merge(admin)
        .merge(organization_read)
        .merge(organization_manage)
        .merge(consignors_read)
        .merge(consignors_manage)
        .merge(inventory_read)
        .merge(inventory_manage)
        .merge(sales_read)
        .merge(sales_create)
        .merge(payouts_read)
        .merge(payouts_create)
        .merge(statements_read)
        .merge(statements_generate)
        .merge(portal)
        .merge(public)
}

/// Everything except cross-cutting layers, which `main` adds.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .nest("/api/v1", api_v1_routes())
        .layer(axum::Extension(state.auth.clone()))
        .with_state(state)
}

async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    Ok(Json(ApiResponse::success(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "timestamp": Utc::now().to_rfc3339(),
    }))))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let database = match db::check_connection(&state.db).await {
        Ok(()) => "healthy",
        Err(e) => {
            ::tracing::warn!(error = %e, "database health check failed");
            "unhealthy"
        }
    };

    Ok(Json(ApiResponse::success(json!({
        "status": database,
        "checks": { "database": database },
        "timestamp": Utc::now().to_rfc3339(),
    }))))
}
