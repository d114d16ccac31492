//! Public shop pages; no authentication.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::common::PaginationParams;
use crate::{
    services::storefront::{StoreItem, StoreItemFilter, StoreProfile},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StoreItemQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub category_id: Option<Uuid>,
    /// Matches title, description or SKU
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
    path = "/api/v1/storefront/{store_code}",
    params(("store_code" = String, Path, description = "Public store code")),
    responses(
        (status = 200, description = "Store profile", body = ApiResponse<StoreProfile>),
        (status = 404, description = "Unknown or inactive store", body = crate::errors::ErrorResponse),
    ),
    tag = "storefront"
)]
pub async fn get_store(
    State(state): State<AppState>,
    Path(store_code): Path<String>,
) -> ApiResult<StoreProfile> {
    let store = state.services.storefront.get_store(&store_code).await?;
    Ok(Json(ApiResponse::success(store)))
}

/// Items on the floor and listed publicly
#[utoipa::path(
    get,
    path = "/api/v1/storefront/{store_code}/items",
    params(
        ("store_code" = String, Path, description = "Public store code"),
        StoreItemQuery
    ),
    responses(
        (status = 200, description = "Available items", body = ApiResponse<PaginatedResponse<StoreItem>>),
        (status = 404, description = "Unknown or inactive store", body = crate::errors::ErrorResponse),
    ),
    tag = "storefront"
)]
pub async fn list_store_items(
    State(state): State<AppState>,
    Path(store_code): Path<String>,
    Query(query): Query<StoreItemQuery>,
) -> ApiResult<PaginatedResponse<StoreItem>> {
    let filter = StoreItemFilter {
        category_id: query.category_id,
        search: query.search,
    };
    let (items, total) = state
        .services
        .storefront
        .list_items(&store_code, filter, query.page, query.limit)
        .await?;
    let pagination = PaginationParams {
        page: query.page,
        limit: query.limit,
    };
    Ok(Json(ApiResponse::success(pagination.respond(items, total))))
}
