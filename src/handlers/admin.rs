use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::common::validate_input;
use crate::{
    auth::AuthUser,
    services::registration::{OwnerApproval, PendingOwner, UserView},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct RejectOwnerRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Owners waiting for approval
#[utoipa::path(
    get,
    path = "/api/v1/admin/registrations/pending",
    responses(
        (status = 200, description = "Pending owner registrations", body = ApiResponse<Vec<PendingOwner>>),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn pending_owners(State(state): State<AppState>) -> ApiResult<Vec<PendingOwner>> {
    let pending = state.services.registration.pending_owners().await?;
    Ok(Json(ApiResponse::success(pending)))
}

/// Approve an owner and activate their shop
#[utoipa::path(
    post,
    path = "/api/v1/admin/registrations/{id}/approve",
    params(("id" = Uuid, Path, description = "Owner user id")),
    responses(
        (status = 200, description = "Owner approved", body = ApiResponse<OwnerApproval>),
        (status = 400, description = "User is not an owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn approve_owner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> ApiResult<OwnerApproval> {
    let approval = state
        .services
        .registration
        .approve_owner(auth_user.user_id, id)
        .await?;
    Ok(Json(ApiResponse::success(approval)))
}

/// Reject an owner registration
#[utoipa::path(
    post,
    path = "/api/v1/admin/registrations/{id}/reject",
    params(("id" = Uuid, Path, description = "Owner user id")),
    request_body = RejectOwnerRequest,
    responses(
        (status = 200, description = "Owner rejected", body = ApiResponse<UserView>),
        (status = 400, description = "User is not an owner", body = crate::errors::ErrorResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "admin"
)]
pub async fn reject_owner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<RejectOwnerRequest>,
) -> ApiResult<UserView> {
    validate_input(&request)?;
    let rejected = state
        .services
        .registration
        .reject_owner(auth_user.user_id, id, request.reason)
        .await?;
    Ok(Json(ApiResponse::success(rejected)))
}
