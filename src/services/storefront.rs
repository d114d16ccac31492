//! Public, unauthenticated view of a shop's floor.

use crate::{
    db::DbPool,
    entities::{
        item::{self, ItemStatus},
        item_category, organization,
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoreCategory {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoreProfile {
    pub name: String,
    pub slug: String,
    pub store_code: String,
    pub categories: Vec<StoreCategory>,
    pub available_items: u64,
}

/// Item as shown to shoppers; no consignor details.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoreItem {
    pub id: Uuid,
    pub sku: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<StoreCategory>,
    pub listed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct StoreItemFilter {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
}

fn listed_items(organization_id: Uuid) -> Select<item::Entity> {
    item::Entity::find()
        .filter(item::Column::OrganizationId.eq(organization_id))
        .filter(item::Column::Status.eq(ItemStatus::Available))
        .filter(item::Column::IsPublic.eq(true))
}

#[derive(Clone)]
pub struct StorefrontService {
    db_pool: Arc<DbPool>,
}

impl StorefrontService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn active_store(&self, store_code: &str) -> Result<organization::Model, ServiceError> {
        let code = store_code.trim().to_uppercase();
        organization::Entity::find()
            .filter(organization::Column::StoreCode.eq(code.as_str()))
            .filter(organization::Column::IsActive.eq(true))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Store {} not found", code)))
    }

    async fn active_categories(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<StoreCategory>, ServiceError> {
        Ok(item_category::Entity::find()
            .filter(item_category::Column::OrganizationId.eq(organization_id))
            .filter(item_category::Column::IsActive.eq(true))
            .order_by_asc(item_category::Column::Name)
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .map(|c| StoreCategory {
                id: c.id,
                name: c.name,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_store(&self, store_code: &str) -> Result<StoreProfile, ServiceError> {
        let store = self.active_store(store_code).await?;
        let categories = self.active_categories(store.id).await?;
        let available_items = listed_items(store.id).count(&*self.db_pool).await?;

        Ok(StoreProfile {
            name: store.name,
            slug: store.slug,
            store_code: store.store_code.unwrap_or_default(),
            categories,
            available_items,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        store_code: &str,
        filter: StoreItemFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<StoreItem>, u64), ServiceError> {
        let store = self.active_store(store_code).await?;
        let (page, limit) = super::page_window(page, limit);

        let mut query = listed_items(store.id);
        if let Some(category_id) = filter.category_id {
            query = query.filter(item::Column::CategoryId.eq(category_id));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(item::Column::Title.contains(search))
                    .add(item::Column::Description.contains(search))
                    .add(item::Column::Sku.contains(search)),
            );
        }

        let paginator = query
            .order_by_desc(item::Column::ReceivedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page).await?;

        let categories: HashMap<Uuid, StoreCategory> = self
            .active_categories(store.id)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let items = models
            .into_iter()
            .map(|m| StoreItem {
                category: m.category_id.and_then(|id| categories.get(&id).cloned()),
                id: m.id,
                sku: m.sku,
                title: m.title,
                description: m.description,
                price: m.price,
                listed_at: m.received_at,
            })
            .collect();
        Ok((items, total))
    }
}
