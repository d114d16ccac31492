use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::common::{validate_input, validate_not_blank, validate_split};
use crate::{
    auth::AuthUser,
    services::organizations::{OrganizationView, UpdateSettingsInput},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 2, max = 120), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(custom = "validate_split")]
    pub default_split_percentage: Option<Decimal>,
    pub auto_approve_consignors: Option<bool>,
    #[validate(length(max = 255))]
    pub stripe_customer_id: Option<String>,
}

/// The caller's shop
#[utoipa::path(
    get,
    path = "/api/v1/organization",
    responses(
        (status = 200, description = "Organization profile", body = ApiResponse<OrganizationView>),
        (status = 403, description = "No organization for this account", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "organization"
)]
pub async fn get_organization(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<OrganizationView> {
    let organization_id = auth_user.require_organization()?;
    let organization = state
        .services
        .organizations
        .get_organization(organization_id)
        .await?;
    Ok(Json(ApiResponse::success(organization)))
}

/// Update shop settings such as the default split
#[utoipa::path(
    put,
    path = "/api/v1/organization/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = ApiResponse<OrganizationView>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "organization"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<UpdateSettingsRequest>,
) -> ApiResult<OrganizationView> {
    validate_input(&request)?;
    let organization_id = auth_user.require_organization()?;
    let updated = state
        .services
        .organizations
        .update_settings(
            organization_id,
            UpdateSettingsInput {
                name: request.name,
                default_split_percentage: request.default_split_percentage,
                auto_approve_consignors: request.auto_approve_consignors,
                stripe_customer_id: request.stripe_customer_id,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
