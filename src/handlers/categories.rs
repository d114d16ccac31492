use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{created, validate_input, validate_not_blank};
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::categories::{CategoryView, CreateCategoryInput, UpdateCategoryInput},
    ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 80), custom = "validate_not_blank")]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 80), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryListQuery {
    /// Include soft-deleted categories
    #[serde(default)]
    pub include_inactive: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(CategoryListQuery),
    responses(
        (status = 200, description = "Categories", body = ApiResponse<Vec<CategoryView>>),
    ),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoryListQuery>,
    auth_user: AuthUser,
) -> ApiResult<Vec<CategoryView>> {
    let organization_id = auth_user.require_organization()?;
    let categories = state
        .services
        .categories
        .list_categories(organization_id, query.include_inactive)
        .await?;
    Ok(Json(ApiResponse::success(categories)))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryView>),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryView>>), ServiceError> {
    validate_input(&request)?;
    let organization_id = auth_user.require_organization()?;
    let category = state
        .services
        .categories
        .create_category(
            organization_id,
            CreateCategoryInput {
                name: request.name,
                description: request.description,
            },
        )
        .await?;
    Ok(created(category))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = ApiResponse<CategoryView>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> ApiResult<CategoryView> {
    let organization_id = auth_user.require_organization()?;
    let category = state
        .services
        .categories
        .get_category(organization_id, id)
        .await?;
    Ok(Json(ApiResponse::success(category)))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryView>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateCategoryRequest>,
) -> ApiResult<CategoryView> {
    validate_input(&request)?;
    let organization_id = auth_user.require_organization()?;
    let category = state
        .services
        .categories
        .update_category(
            organization_id,
            id,
            UpdateCategoryInput {
                name: request.name,
                description: request.description,
                is_active: request.is_active,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(category)))
}

/// Soft-delete a category no item uses
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deactivated", body = ApiResponse<CategoryView>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category has items assigned", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> ApiResult<CategoryView> {
    let organization_id = auth_user.require_organization()?;
    let category = state
        .services
        .categories
        .delete_category(organization_id, id)
        .await?;
    Ok(Json(ApiResponse::success(category)))
}
