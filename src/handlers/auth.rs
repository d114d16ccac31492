use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use super::common::{created, validate_input, validate_not_blank};
use crate::{
    auth::{bearer_token, AuthError, AuthUser, TokenPair},
    errors::ServiceError,
    services::registration::{
        ConsignorRegistration, RegisterConsignorInput, RegisterOwnerInput, UserView,
    },
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterOwnerRequest {
    #[validate(length(min = 2, max = 120), custom = "validate_not_blank")]
    pub organization_name: String,
    #[validate(length(min = 1, max = 120), custom = "validate_not_blank")]
    pub full_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterConsignorRequest {
    #[validate(length(min = 4, max = 12))]
    pub store_code: String,
    #[validate(length(min = 1, max = 80), custom = "validate_not_blank")]
    pub first_name: String,
    #[validate(length(min = 1, max = 80), custom = "validate_not_blank")]
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: TokenPair,
    pub user: UserView,
}

/// Register a shop and its owner (pending platform approval)
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterOwnerRequest,
    responses(
        (status = 201, description = "Registration received", body = ApiResponse<UserView>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email or shop name already taken", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn register_owner(
    State(state): State<AppState>,
    Json(request): Json<RegisterOwnerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserView>>), ServiceError> {
    validate_input(&request)?;
    let owner = state
        .services
        .registration
        .register_owner(RegisterOwnerInput {
            organization_name: request.organization_name,
            full_name: request.full_name,
            email: request.email,
            password: request.password,
        })
        .await?;
    Ok(created(owner))
}

/// Self-register as a consignor of the shop behind a store code
#[utoipa::path(
    post,
    path = "/auth/register/consignor",
    request_body = RegisterConsignorRequest,
    responses(
        (status = 201, description = "Consignor registered", body = ApiResponse<ConsignorRegistration>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown store code", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn register_consignor(
    State(state): State<AppState>,
    Json(request): Json<RegisterConsignorRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ConsignorRegistration>>), ServiceError> {
    validate_input(&request)?;
    let registration = state
        .services
        .registration
        .register_consignor(RegisterConsignorInput {
            store_code: request.store_code,
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            phone: request.phone,
            password: request.password,
        })
        .await?;
    Ok(created(registration))
}

/// Exchange credentials for an access token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
        (status = 403, description = "Account not approved", body = crate::errors::ErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    validate_input(&request)?;
    let account = state
        .services
        .registration
        .authenticate(&request.email, &request.password)
        .await?;
    let token = state.auth.generate_token(&account)?;

    info!(user_id = %account.id, role = %account.role, "user logged in");
    Ok(Json(ApiResponse::success(LoginResponse {
        token,
        user: account.into(),
    })))
}

/// Revoke the presented access token
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Token revoked"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    auth_user: AuthUser,
) -> ApiResult<()> {
    let token = bearer_token(&headers).ok_or(AuthError::MissingAuth)?;
    state.auth.revoke_token(token).await?;
    info!(user_id = %auth_user.user_id, "user logged out");
    Ok(Json(ApiResponse::success(())))
}

/// The caller's identity as carried by the token
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "auth"
)]
pub async fn me(auth_user: AuthUser) -> ApiResult<AuthUser> {
    Ok(Json(ApiResponse::success(auth_user)))
}
