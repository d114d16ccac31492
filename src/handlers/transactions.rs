use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{created, validate_input, validate_money, validate_not_blank, PaginationParams};
use crate::{
    auth::AuthUser,
    entities::transaction::PayoutStatus,
    errors::ServiceError,
    services::transactions::{RecordSaleInput, TransactionFilter, TransactionView},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordSaleRequest {
    pub item_id: Uuid,
    /// Defaults to the item's price
    #[validate(custom = "validate_money")]
    pub sale_price: Option<Decimal>,
    #[validate(length(min = 1, max = 40), custom = "validate_not_blank")]
    pub payment_method: String,
    pub sold_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct VoidTransactionRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub consignor_id: Option<Uuid>,
    pub payout_status: Option<PayoutStatus>,
    #[serde(default)]
    pub include_voided: bool,
    /// First sale day, inclusive
    pub from: Option<NaiveDate>,
    /// Last sale day, inclusive
    pub to: Option<NaiveDate>,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

/// Record the sale of an available item
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    request_body = RecordSaleRequest,
    responses(
        (status = 201, description = "Sale recorded", body = ApiResponse<TransactionView>),
        (status = 400, description = "Item is not available", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "transactions"
)]
pub async fn record_sale(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<RecordSaleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionView>>), ServiceError> {
    validate_input(&request)?;
    let organization_id = auth_user.require_organization()?;
    let sale = state
        .services
        .transactions
        .record_sale(
            organization_id,
            RecordSaleInput {
                item_id: request.item_id,
                sale_price: request.sale_price,
                payment_method: request.payment_method,
                sold_at: request.sold_at,
            },
        )
        .await?;
    Ok(created(sale))
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    params(TransactionListQuery),
    responses(
        (status = 200, description = "Sales", body = ApiResponse<PaginatedResponse<TransactionView>>),
    ),
    security(("Bearer" = [])),
    tag = "transactions"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
    auth_user: AuthUser,
) -> ApiResult<PaginatedResponse<TransactionView>> {
    let organization_id = auth_user.require_organization()?;
    let filter = TransactionFilter {
        consignor_id: query.consignor_id,
        payout_status: query.payout_status,
        include_voided: query.include_voided,
        sold_from: query.from,
        sold_to: query.to,
    };
    let (sales, total) = state
        .services
        .transactions
        .list_transactions(organization_id, filter, query.page, query.limit)
        .await?;
    let pagination = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    Ok(Json(ApiResponse::success(pagination.respond(sales, total))))
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Sale", body = ApiResponse<TransactionView>),
        (status = 404, description = "Transaction not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "transactions"
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> ApiResult<TransactionView> {
    let organization_id = auth_user.require_organization()?;
    let sale = state
        .services
        .transactions
        .get_transaction(organization_id, id)
        .await?;
    Ok(Json(ApiResponse::success(sale)))
}

/// Void an unpaid sale and restock the item
#[utoipa::path(
    post,
    path = "/api/v1/transactions/{id}/void",
    params(("id" = Uuid, Path, description = "Transaction id")),
    request_body = VoidTransactionRequest,
    responses(
        (status = 200, description = "Sale voided", body = ApiResponse<TransactionView>),
        (status = 400, description = "Sale already paid out or voided", body = crate::errors::ErrorResponse),
        (status = 404, description = "Transaction not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "transactions"
)]
pub async fn void_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<VoidTransactionRequest>,
) -> ApiResult<TransactionView> {
    validate_input(&request)?;
    let organization_id = auth_user.require_organization()?;
    let voided = state
        .services
        .transactions
        .void_transaction(organization_id, id, request.reason)
        .await?;
    Ok(Json(ApiResponse::success(voided)))
}
