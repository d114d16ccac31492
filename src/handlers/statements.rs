use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{created, validate_input, PaginationParams};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::statements::{StatementDetail, StatementView},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenerateStatementRequest {
    pub consignor_id: Uuid,
    pub period_start: NaiveDate,
    /// Inclusive
    pub period_end: NaiveDate,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenerateMonthlyRequest {
    #[validate(range(min = 2000, max = 9999))]
    pub year: i32,
    #[validate(range(min = 1, max = 12))]
    pub month: u32,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatementListQuery {
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

/// Generate (or regenerate) a consignor statement for a period
#[utoipa::path(
    post,
    path = "/api/v1/statements",
    request_body = GenerateStatementRequest,
    responses(
        (status = 201, description = "Statement generated", body = ApiResponse<StatementView>),
        (status = 400, description = "Invalid period", body = crate::errors::ErrorResponse),
        (status = 404, description = "Consignor not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "statements"
)]
pub async fn generate_statement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<GenerateStatementRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StatementView>>), ServiceError> {
    validate_input(&request)?;
    let organization_id = auth_user.require_organization()?;
    let statement = state
        .services
        .statements
        .generate_statement(
            organization_id,
            request.consignor_id,
            request.period_start,
            request.period_end,
            Some(auth_user.user_id),
        )
        .await?;
    Ok(created(statement))
}

/// Statements for every approved consignor for one month
#[utoipa::path(
    post,
    path = "/api/v1/statements/monthly",
    request_body = GenerateMonthlyRequest,
    responses(
        (status = 201, description = "Statements generated", body = ApiResponse<Vec<StatementView>>),
        (status = 400, description = "Invalid month", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "statements"
)]
pub async fn generate_monthly(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<GenerateMonthlyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<StatementView>>>), ServiceError> {
    validate_input(&request)?;
    let organization_id = auth_user.require_organization()?;
    let statements = state
        .services
        .statements
        .generate_monthly(
            organization_id,
            request.year,
            request.month,
            Some(auth_user.user_id),
        )
        .await?;
    Ok(created(statements))
}

#[utoipa::path(
    get,
    path = "/api/v1/statements",
    params(StatementListQuery),
    responses(
        (status = 200, description = "Statements", body = ApiResponse<PaginatedResponse<StatementView>>),
    ),
    security(("Bearer" = [])),
    tag = "statements"
)]
pub async fn list_statements(
    State(state): State<AppState>,
    Query(query): Query<StatementListQuery>,
    auth_user: AuthUser,
) -> ApiResult<PaginatedResponse<StatementView>> {
    let organization_id = auth_user.require_organization()?;
    let (statements, total) = state
        .services
        .statements
        .list_statements(organization_id, query.consignor_id, query.page, query.limit)
        .await?;
    let pagination = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    Ok(Json(ApiResponse::success(
        pagination.respond(statements, total),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/statements/{id}",
    params(("id" = Uuid, Path, description = "Statement id")),
    responses(
        (status = 200, description = "Statement with period activity", body = ApiResponse<StatementDetail>),
        (status = 404, description = "Statement not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "statements"
)]
pub async fn get_statement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> ApiResult<StatementDetail> {
    let organization_id = auth_user.require_organization()?;
    let statement = state
        .services
        .statements
        .get_statement(organization_id, id)
        .await?;
    Ok(Json(ApiResponse::success(statement)))
}
