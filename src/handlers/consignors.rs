use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{created, validate_input, validate_not_blank, validate_split, PaginationParams};
use crate::{
    auth::AuthUser,
    entities::{consignor::ConsignorStatus, ApprovalStatus},
    errors::ServiceError,
    services::consignors::{
        ConsignorBalance, ConsignorFilter, ConsignorRemoval, ConsignorView, CreateConsignorInput,
        UpdateConsignorInput,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateConsignorRequest {
    #[validate(length(min = 1, max = 80), custom = "validate_not_blank")]
    pub first_name: String,
    #[validate(length(min = 1, max = 80), custom = "validate_not_blank")]
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    /// Consignor share in percent; omit to use the shop default
    #[validate(custom = "validate_split")]
    pub split_percentage: Option<Decimal>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateConsignorRequest {
    #[validate(length(min = 1, max = 80), custom = "validate_not_blank")]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 80), custom = "validate_not_blank")]
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(custom = "validate_split")]
    pub split_percentage: Option<Decimal>,
    /// Revert to the shop default split
    #[serde(default)]
    pub use_default_split: bool,
    pub status: Option<ConsignorStatus>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConsignorListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub status: Option<ConsignorStatus>,
    pub approval_status: Option<ApprovalStatus>,
    pub search: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConsignorRemovalResponse {
    pub id: Uuid,
    pub result: ConsignorRemoval,
}

/// List the shop's consignors
#[utoipa::path(
    get,
    path = "/api/v1/consignors",
    params(ConsignorListQuery),
    responses(
        (status = 200, description = "Consignors", body = ApiResponse<PaginatedResponse<ConsignorView>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "consignors"
)]
pub async fn list_consignors(
    State(state): State<AppState>,
    Query(query): Query<ConsignorListQuery>,
    auth_user: AuthUser,
) -> ApiResult<PaginatedResponse<ConsignorView>> {
    let organization_id = auth_user.require_organization()?;
    let filter = ConsignorFilter {
        status: query.status,
        approval_status: query.approval_status,
        search: query.search,
    };
    let (consignors, total) = state
        .services
        .consignors
        .list_consignors(organization_id, filter, query.page, query.limit)
        .await?;
    let pagination = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    Ok(Json(ApiResponse::success(
        pagination.respond(consignors, total),
    )))
}

/// Add a consignor on behalf of the shop
#[utoipa::path(
    post,
    path = "/api/v1/consignors",
    request_body = CreateConsignorRequest,
    responses(
        (status = 201, description = "Consignor created", body = ApiResponse<ConsignorView>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "consignors"
)]
pub async fn create_consignor(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateConsignorRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ConsignorView>>), ServiceError> {
    validate_input(&request)?;
    let organization_id = auth_user.require_organization()?;
    let consignor = state
        .services
        .consignors
        .create_consignor(
            organization_id,
            CreateConsignorInput {
                first_name: request.first_name,
                last_name: request.last_name,
                email: request.email,
                phone: request.phone,
                split_percentage: request.split_percentage,
                notes: request.notes,
            },
        )
        .await?;
    Ok(created(consignor))
}

#[utoipa::path(
    get,
    path = "/api/v1/consignors/{id}",
    params(("id" = Uuid, Path, description = "Consignor id")),
    responses(
        (status = 200, description = "Consignor", body = ApiResponse<ConsignorView>),
        (status = 404, description = "Consignor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "consignors"
)]
pub async fn get_consignor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> ApiResult<ConsignorView> {
    let organization_id = auth_user.require_organization()?;
    let consignor = state
        .services
        .consignors
        .get_consignor(organization_id, id)
        .await?;
    Ok(Json(ApiResponse::success(consignor)))
}

#[utoipa::path(
    put,
    path = "/api/v1/consignors/{id}",
    params(("id" = Uuid, Path, description = "Consignor id")),
    request_body = UpdateConsignorRequest,
    responses(
        (status = 200, description = "Consignor updated", body = ApiResponse<ConsignorView>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Consignor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "consignors"
)]
pub async fn update_consignor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateConsignorRequest>,
) -> ApiResult<ConsignorView> {
    validate_input(&request)?;
    let organization_id = auth_user.require_organization()?;
    let updated = state
        .services
        .consignors
        .update_consignor(
            organization_id,
            id,
            UpdateConsignorInput {
                first_name: request.first_name,
                last_name: request.last_name,
                email: request.email,
                phone: request.phone,
                split_percentage: request.split_percentage,
                clear_split_percentage: request.use_default_split,
                status: request.status,
                notes: request.notes,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Delete a consignor, or deactivate one that has history
#[utoipa::path(
    delete,
    path = "/api/v1/consignors/{id}",
    params(("id" = Uuid, Path, description = "Consignor id")),
    responses(
        (status = 200, description = "Consignor removed", body = ApiResponse<ConsignorRemovalResponse>),
        (status = 404, description = "Consignor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "consignors"
)]
pub async fn delete_consignor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> ApiResult<ConsignorRemovalResponse> {
    let organization_id = auth_user.require_organization()?;
    let result = state
        .services
        .consignors
        .delete_consignor(organization_id, id)
        .await?;
    Ok(Json(ApiResponse::success(ConsignorRemovalResponse { id, result })))
}

/// Approve a self-registered consignor
#[utoipa::path(
    post,
    path = "/api/v1/consignors/{id}/approve",
    params(("id" = Uuid, Path, description = "Consignor id")),
    responses(
        (status = 200, description = "Consignor approved", body = ApiResponse<ConsignorView>),
        (status = 400, description = "Consignor is not pending", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "consignors"
)]
pub async fn approve_consignor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> ApiResult<ConsignorView> {
    let organization_id = auth_user.require_organization()?;
    let consignor = state
        .services
        .consignors
        .approve_consignor(organization_id, id)
        .await?;
    Ok(Json(ApiResponse::success(consignor)))
}

#[utoipa::path(
    post,
    path = "/api/v1/consignors/{id}/reject",
    params(("id" = Uuid, Path, description = "Consignor id")),
    responses(
        (status = 200, description = "Consignor rejected", body = ApiResponse<ConsignorView>),
        (status = 400, description = "Consignor is not pending", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "consignors"
)]
pub async fn reject_consignor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> ApiResult<ConsignorView> {
    let organization_id = auth_user.require_organization()?;
    let consignor = state
        .services
        .consignors
        .reject_consignor(organization_id, id)
        .await?;
    Ok(Json(ApiResponse::success(consignor)))
}

/// Item counts and money owed to a consignor
#[utoipa::path(
    get,
    path = "/api/v1/consignors/{id}/balance",
    params(("id" = Uuid, Path, description = "Consignor id")),
    responses(
        (status = 200, description = "Balance", body = ApiResponse<ConsignorBalance>),
        (status = 404, description = "Consignor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "consignors"
)]
pub async fn consignor_balance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> ApiResult<ConsignorBalance> {
    let organization_id = auth_user.require_organization()?;
    let balance = state.services.consignors.balance(organization_id, id).await?;
    Ok(Json(ApiResponse::success(balance)))
}
