use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{created, validate_input, validate_not_blank, PaginationParams};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::payouts::{CreatePayoutInput, PayoutDetail, PayoutView, PendingPayoutSummary},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePayoutRequest {
    pub consignor_id: Uuid,
    /// Sales to settle; all must be unpaid sales of this consignor
    #[validate(length(min = 1, message = "At least one transaction is required"))]
    pub transaction_ids: Vec<Uuid>,
    #[validate(length(min = 1, max = 40), custom = "validate_not_blank")]
    pub payment_method: String,
    #[validate(length(max = 120))]
    pub payment_reference: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PayoutListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub consignor_id: Option<Uuid>,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

/// Pay a consignor for a set of sales
#[utoipa::path(
    post,
    path = "/api/v1/payouts",
    request_body = CreatePayoutRequest,
    responses(
        (status = 201, description = "Payout created", body = ApiResponse<PayoutDetail>),
        (status = 400, description = "Invalid, voided or already paid transactions", body = crate::errors::ErrorResponse),
        (status = 409, description = "Transactions changed concurrently", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "payouts"
)]
pub async fn create_payout(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreatePayoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PayoutDetail>>), ServiceError> {
    validate_input(&request)?;
    let organization_id = auth_user.require_organization()?;
    let payout = state
        .services
        .payouts
        .create_payout(
            organization_id,
            Some(auth_user.user_id),
            CreatePayoutInput {
                consignor_id: request.consignor_id,
                transaction_ids: request.transaction_ids,
                payment_method: request.payment_method,
                payment_reference: request.payment_reference,
                notes: request.notes,
                paid_at: request.paid_at,
            },
        )
        .await?;
    Ok(created(payout))
}

/// Unpaid earnings per consignor
#[utoipa::path(
    get,
    path = "/api/v1/payouts/pending",
    responses(
        (status = 200, description = "Pending payouts", body = ApiResponse<Vec<PendingPayoutSummary>>),
    ),
    security(("Bearer" = [])),
    tag = "payouts"
)]
pub async fn pending_payouts(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Vec<PendingPayoutSummary>> {
    let organization_id = auth_user.require_organization()?;
    let pending = state.services.payouts.pending_payouts(organization_id).await?;
    Ok(Json(ApiResponse::success(pending)))
}

#[utoipa::path(
    get,
    path = "/api/v1/payouts",
    params(PayoutListQuery),
    responses(
        (status = 200, description = "Payouts", body = ApiResponse<PaginatedResponse<PayoutView>>),
    ),
    security(("Bearer" = [])),
    tag = "payouts"
)]
pub async fn list_payouts(
    State(state): State<AppState>,
    Query(query): Query<PayoutListQuery>,
    auth_user: AuthUser,
) -> ApiResult<PaginatedResponse<PayoutView>> {
    let organization_id = auth_user.require_organization()?;
    let (payouts, total) = state
        .services
        .payouts
        .list_payouts(organization_id, query.consignor_id, query.page, query.limit)
        .await?;
    let pagination = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    Ok(Json(ApiResponse::success(pagination.respond(payouts, total))))
}

#[utoipa::path(
    get,
    path = "/api/v1/payouts/{id}",
    params(("id" = Uuid, Path, description = "Payout id")),
    responses(
        (status = 200, description = "Payout with its transactions", body = ApiResponse<PayoutDetail>),
        (status = 404, description = "Payout not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "payouts"
)]
pub async fn get_payout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> ApiResult<PayoutDetail> {
    let organization_id = auth_user.require_organization()?;
    let payout = state.services.payouts.get_payout(organization_id, id).await?;
    Ok(Json(ApiResponse::success(payout)))
}
