//! Read-only views for consignor portal users. Everything is scoped to the
//! consignor linked to the caller's account.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::common::PaginationParams;
use crate::{
    auth::AuthUser,
    entities::{item::ItemStatus, transaction::PayoutStatus},
    errors::ServiceError,
    services::{
        consignors::{ConsignorBalance, ConsignorView},
        items::{ItemFilter, ItemView},
        payouts::PayoutView,
        statements::{StatementDetail, StatementView},
        transactions::{TransactionFilter, TransactionView},
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PortalItemQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub status: Option<ItemStatus>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PortalTransactionQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub payout_status: Option<PayoutStatus>,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

fn scope(auth_user: &AuthUser) -> Result<(Uuid, Uuid), ServiceError> {
    Ok((auth_user.require_organization()?, auth_user.require_consignor()?))
}

#[utoipa::path(
    get,
    path = "/api/v1/portal/me",
    responses(
        (status = 200, description = "Own consignor record", body = ApiResponse<ConsignorView>),
        (status = 403, description = "Not a consignor account", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "portal"
)]
pub async fn my_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<ConsignorView> {
    let (organization_id, consignor_id) = scope(&auth_user)?;
    let consignor = state
        .services
        .consignors
        .get_consignor(organization_id, consignor_id)
        .await?;
    Ok(Json(ApiResponse::success(consignor)))
}

#[utoipa::path(
    get,
    path = "/api/v1/portal/balance",
    responses(
        (status = 200, description = "Own balance", body = ApiResponse<ConsignorBalance>),
    ),
    security(("Bearer" = [])),
    tag = "portal"
)]
pub async fn my_balance(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<ConsignorBalance> {
    let (organization_id, consignor_id) = scope(&auth_user)?;
    let balance = state
        .services
        .consignors
        .balance(organization_id, consignor_id)
        .await?;
    Ok(Json(ApiResponse::success(balance)))
}

#[utoipa::path(
    get,
    path = "/api/v1/portal/items",
    params(PortalItemQuery),
    responses(
        (status = 200, description = "Own items", body = ApiResponse<PaginatedResponse<ItemView>>),
    ),
    security(("Bearer" = [])),
    tag = "portal"
)]
pub async fn my_items(
    State(state): State<AppState>,
    Query(query): Query<PortalItemQuery>,
    auth_user: AuthUser,
) -> ApiResult<PaginatedResponse<ItemView>> {
    let (organization_id, consignor_id) = scope(&auth_user)?;
    let filter = ItemFilter {
        status: query.status,
        consignor_id: Some(consignor_id),
        ..Default::default()
    };
    let (items, total) = state
        .services
        .items
        .list_items(organization_id, filter, query.page, query.limit)
        .await?;
    let pagination = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    Ok(Json(ApiResponse::success(pagination.respond(items, total))))
}

#[utoipa::path(
    get,
    path = "/api/v1/portal/transactions",
    params(PortalTransactionQuery),
    responses(
        (status = 200, description = "Own sales", body = ApiResponse<PaginatedResponse<TransactionView>>),
    ),
    security(("Bearer" = [])),
    tag = "portal"
)]
pub async fn my_transactions(
    State(state): State<AppState>,
    Query(query): Query<PortalTransactionQuery>,
    auth_user: AuthUser,
) -> ApiResult<PaginatedResponse<TransactionView>> {
    let (organization_id, consignor_id) = scope(&auth_user)?;
    let filter = TransactionFilter {
        consignor_id: Some(consignor_id),
        payout_status: query.payout_status,
        ..Default::default()
    };
    let (transactions, total) = state
        .services
        .transactions
        .list_transactions(organization_id, filter, query.page, query.limit)
        .await?;
    let pagination = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    Ok(Json(ApiResponse::success(
        pagination.respond(transactions, total),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/portal/payouts",
    params(PaginationParams),
    responses(
        (status = 200, description = "Own payouts", body = ApiResponse<PaginatedResponse<PayoutView>>),
    ),
    security(("Bearer" = [])),
    tag = "portal"
)]
pub async fn my_payouts(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    auth_user: AuthUser,
) -> ApiResult<PaginatedResponse<PayoutView>> {
    let (organization_id, consignor_id) = scope(&auth_user)?;
    let (payouts, total) = state
        .services
        .payouts
        .list_payouts(
            organization_id,
            Some(consignor_id),
            pagination.page,
            pagination.limit,
        )
        .await?;
    Ok(Json(ApiResponse::success(pagination.respond(payouts, total))))
}

#[utoipa::path(
    get,
    path = "/api/v1/portal/statements",
    params(PaginationParams),
    responses(
        (status = 200, description = "Own statements", body = ApiResponse<PaginatedResponse<StatementView>>),
    ),
    security(("Bearer" = [])),
    tag = "portal"
)]
pub async fn my_statements(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    auth_user: AuthUser,
) -> ApiResult<PaginatedResponse<StatementView>> {
    let (organization_id, consignor_id) = scope(&auth_user)?;
    let (statements, total) = state
        .services
        .statements
        .list_statements(
            organization_id,
            Some(consignor_id),
            pagination.page,
            pagination.limit,
        )
        .await?;
    Ok(Json(ApiResponse::success(
        pagination.respond(statements, total),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/portal/statements/{id}",
    params(("id" = Uuid, Path, description = "Statement id")),
    responses(
        (status = 200, description = "Own statement", body = ApiResponse<StatementDetail>),
        (status = 404, description = "Statement not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "portal"
)]
pub async fn my_statement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> ApiResult<StatementDetail> {
    let (organization_id, consignor_id) = scope(&auth_user)?;
    let detail = state
        .services
        .statements
        .get_statement(organization_id, id)
        .await?;
    // Another consignor's statement looks the same as a missing one.
    if detail.statement.consignor_id != consignor_id {
        return Err(ServiceError::NotFound(format!("Statement {} not found", id)));
    }
    Ok(Json(ApiResponse::success(detail)))
}
