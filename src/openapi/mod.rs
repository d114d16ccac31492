use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Consignment API",
        version = "1.0.0",
        description = r#"
# Consignment Shop API

Back office for consignment shops: consignors bring items, the shop sells
them, and the consignor's share of each sale is paid out in batches and
summarized in periodic statements.

## Authentication

Log in with `POST /auth/login` and send the returned token on every call:

```
Authorization: Bearer <your-jwt-token>
```

Shop owners register with `POST /auth/register` and can log in once a
platform administrator approves them. Approval assigns the shop's store
code, which consignors use to self-register.

## Responses

Successful calls return `{ "success": true, "data": ..., "meta": {...} }`.
Failures return `{ "success": false, "error": ..., "message": ..., "errors": [...] }`
with the matching HTTP status code.

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20, max 100).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "auth", description = "Registration, login and sessions"),
        (name = "admin", description = "Platform administration"),
        (name = "organization", description = "Shop settings"),
        (name = "consignors", description = "Consignor management"),
        (name = "categories", description = "Item categories"),
        (name = "items", description = "Consigned inventory"),
        (name = "transactions", description = "Sales"),
        (name = "payouts", description = "Consignor payouts"),
        (name = "statements", description = "Consignor statements"),
        (name = "portal", description = "Consignor self-service"),
        (name = "storefront", description = "Public shop pages"),
        (name = "webhooks", description = "Inbound integrations")
    ),
    paths(
        crate::handlers::auth::register_owner,
        crate::handlers::auth::register_consignor,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::me,

        crate::handlers::admin::pending_owners,
        crate::handlers::admin::approve_owner,
        crate::handlers::admin::reject_owner,

        crate::handlers::organization::get_organization,
        crate::handlers::organization::update_settings,

        crate::handlers::consignors::list_consignors,
        crate::handlers::consignors::create_consignor,
        crate::handlers::consignors::get_consignor,
        crate::handlers::consignors::update_consignor,
        crate::handlers::consignors::delete_consignor,
        crate::handlers::consignors::approve_consignor,
        crate::handlers::consignors::reject_consignor,
        crate::handlers::consignors::consignor_balance,

        crate::handlers::categories::list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,

        crate::handlers::items::list_items,
        crate::handlers::items::create_item,
        crate::handlers::items::get_item,
        crate::handlers::items::update_item,
        crate::handlers::items::remove_item,

        crate::handlers::transactions::record_sale,
        crate::handlers::transactions::list_transactions,
        crate::handlers::transactions::get_transaction,
        crate::handlers::transactions::void_transaction,

        crate::handlers::payouts::create_payout,
        crate::handlers::payouts::pending_payouts,
        crate::handlers::payouts::list_payouts,
        crate::handlers::payouts::get_payout,

        crate::handlers::statements::generate_statement,
        crate::handlers::statements::generate_monthly,
        crate::handlers::statements::list_statements,
        crate::handlers::statements::get_statement,

        crate::handlers::portal::my_profile,
        crate::handlers::portal::my_balance,
        crate::handlers::portal::my_items,
        crate::handlers::portal::my_transactions,
        crate::handlers::portal::my_payouts,
        crate::handlers::portal::my_statements,
        crate::handlers::portal::my_statement,

        crate::handlers::storefront::get_store,
        crate::handlers::storefront::list_store_items,

        crate::handlers::webhooks::stripe_webhook,
    ),
    components(
        schemas(
            crate::handlers::common::PaginationParams,
            crate::auth::TokenPair,

            crate::entities::ApprovalStatus,
            crate::entities::user::UserRole,
            crate::entities::organization::SubscriptionStatus,
            crate::entities::consignor::ConsignorStatus,
            crate::entities::item::ItemStatus,
            crate::entities::transaction::PayoutStatus,

            crate::handlers::auth::RegisterOwnerRequest,
            crate::handlers::auth::RegisterConsignorRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::handlers::admin::RejectOwnerRequest,
            crate::handlers::organization::UpdateSettingsRequest,
            crate::handlers::consignors::CreateConsignorRequest,
            crate::handlers::consignors::UpdateConsignorRequest,
            crate::handlers::consignors::ConsignorRemovalResponse,
            crate::handlers::categories::CreateCategoryRequest,
            crate::handlers::categories::UpdateCategoryRequest,
            crate::handlers::items::CreateItemRequest,
            crate::handlers::items::UpdateItemRequest,
            crate::handlers::transactions::RecordSaleRequest,
            crate::handlers::transactions::VoidTransactionRequest,
            crate::handlers::payouts::CreatePayoutRequest,
            crate::handlers::statements::GenerateStatementRequest,
            crate::handlers::statements::GenerateMonthlyRequest,

            crate::services::registration::UserView,
            crate::services::registration::PendingOwner,
            crate::services::registration::OwnerApproval,
            crate::services::registration::ConsignorRegistration,
            crate::services::organizations::OrganizationView,
            crate::services::consignors::ConsignorView,
            crate::services::consignors::ConsignorBalance,
            crate::services::consignors::ConsignorRemoval,
            crate::services::categories::CategoryView,
            crate::services::items::ItemView,
            crate::services::transactions::TransactionView,
            crate::services::payouts::PayoutView,
            crate::services::payouts::PayoutDetail,
            crate::services::payouts::PendingPayoutSummary,
            crate::services::statements::StatementView,
            crate::services::statements::StatementDetail,
            crate::services::storefront::StoreCategory,
            crate::services::storefront::StoreProfile,
            crate::services::storefront::StoreItem,
            crate::services::subscriptions::WebhookOutcome,

            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerSecurity)
)]
pub struct ApiDocV1;

/// Registers the `Bearer` scheme referenced by `security(("Bearer" = []))`.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_documents_core_paths_and_security() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Consignment API"));
        assert!(json.contains("/api/v1/payouts"));
        assert!(json.contains("/api/v1/storefront/{store_code}"));
        assert!(json.contains("/auth/login"));

        let components = openapi.components.expect("components");
        assert!(components.security_schemes.contains_key("Bearer"));
    }
}
