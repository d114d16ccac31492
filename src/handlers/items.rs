use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{created, validate_input, validate_money, validate_not_blank, PaginationParams};
use crate::{
    auth::AuthUser,
    entities::item::ItemStatus,
    errors::ServiceError,
    services::items::{CreateItemInput, ItemFilter, ItemView, UpdateItemInput},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    pub consignor_id: Uuid,
    pub category_id: Option<Uuid>,
    /// Generated when omitted
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(custom = "validate_money")]
    pub price: Decimal,
    /// Listed on the storefront; defaults to true
    pub is_public: Option<bool>,
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateItemRequest {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200), custom = "validate_not_blank")]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(custom = "validate_money")]
    pub price: Option<Decimal>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub status: Option<ItemStatus>,
    pub consignor_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(ItemListQuery),
    responses(
        (status = 200, description = "Inventory", body = ApiResponse<PaginatedResponse<ItemView>>),
    ),
    security(("Bearer" = [])),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemListQuery>,
    auth_user: AuthUser,
) -> ApiResult<PaginatedResponse<ItemView>> {
    let organization_id = auth_user.require_organization()?;
    let filter = ItemFilter {
        status: query.status,
        consignor_id: query.consignor_id,
        category_id: query.category_id,
        search: query.search,
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

/// Take an item in on consignment
#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ApiResponse<ItemView>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already in use", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ItemView>>), ServiceError> {
    validate_input(&request)?;
    let organization_id = auth_user.require_organization()?;
    let item = state
        .services
        .items
        .create_item(
            organization_id,
            CreateItemInput {
                consignor_id: request.consignor_id,
                category_id: request.category_id,
                sku: request.sku,
                title: request.title,
                description: request.description,
                price: request.price,
                is_public: request.is_public,
                received_at: request.received_at,
            },
        )
        .await?;
    Ok(created(item))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item", body = ApiResponse<ItemView>),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> ApiResult<ItemView> {
    let organization_id = auth_user.require_organization()?;
    let item = state.services.items.get_item(organization_id, id).await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    put,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ApiResponse<ItemView>),
        (status = 400, description = "Sold items cannot be modified", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateItemRequest>,
) -> ApiResult<ItemView> {
    validate_input(&request)?;
    let organization_id = auth_user.require_organization()?;
    let item = state
        .services
        .items
        .update_item(
            organization_id,
            id,
            UpdateItemInput {
                category_id: request.category_id,
                title: request.title,
                description: request.description,
                price: request.price,
                is_public: request.is_public,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(item)))
}

/// Take an item off the floor
#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item removed", body = ApiResponse<ItemView>),
        (status = 400, description = "Sold items cannot be removed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "items"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> ApiResult<ItemView> {
    let organization_id = auth_user.require_organization()?;
    let item = state.services.items.remove_item(organization_id, id).await?;
    Ok(Json(ApiResponse::success(item)))
}
