use crate::{
    db::DbPool,
    entities::{
        consignor::ConsignorStatus,
        item::{self, Entity as ItemEntity, ItemStatus},
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{categories, consignors};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemView {
    pub id: Uuid,
    pub consignor_id: Uuid,
    pub category_id: Option<Uuid>,
    pub sku: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub status: ItemStatus,
    pub is_public: bool,
    pub received_at: DateTime<Utc>,
    pub sold_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<item::Model> for ItemView {
    fn from(model: item::Model) -> Self {
        Self {
            id: model.id,
            consignor_id: model.consignor_id,
            category_id: model.category_id,
            sku: model.sku,
            title: model.title,
            description: model.description,
            price: model.price,
            status: model.status,
            is_public: model.is_public,
            received_at: model.received_at,
            sold_at: model.sold_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateItemInput {
    pub consignor_id: Uuid,
    pub category_id: Option<Uuid>,
    /// Generated when absent
    pub sku: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_public: Option<bool>,
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateItemInput {
    pub category_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub status: Option<ItemStatus>,
    pub consignor_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
}

pub(crate) async fn find_in_organization<C>(
    conn: &C,
    organization_id: Uuid,
    item_id: Uuid,
) -> Result<item::Model, ServiceError>
where
    C: ConnectionTrait,
{
    ItemEntity::find_by_id(item_id)
        .filter(item::Column::OrganizationId.eq(organization_id))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id)))
}

fn validate_price(price: Decimal) -> Result<Decimal, ServiceError> {
    if price <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Price must be greater than zero".to_string(),
        ));
    }
    Ok(super::round_money(price))
}

fn generate_sku() -> String {
    format!("SKU-{}", &Uuid::new_v4().simple().to_string()[..8].to_uppercase())
}

#[derive(Clone)]
pub struct ItemService {
    db_pool: Arc<DbPool>,
}

impl ItemService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn ensure_active_category(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), ServiceError> {
        let category =
            categories::find_in_organization(&*self.db_pool, organization_id, category_id).await?;
        if !category.is_active {
            return Err(ServiceError::ValidationError(format!(
                "Category '{}' is inactive",
                category.name
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, input))]
    pub async fn create_item(
        &self,
        organization_id: Uuid,
        input: CreateItemInput,
    ) -> Result<ItemView, ServiceError> {
        let db = &*self.db_pool;
        let price = validate_price(input.price)?;
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(ServiceError::ValidationError("Title is required".to_string()));
        }

        let consignor =
            consignors::find_in_organization(db, organization_id, input.consignor_id).await?;
        if !consignor.is_approved() || consignor.status != ConsignorStatus::Active {
            return Err(ServiceError::ValidationError(format!(
                "Consignor {} is not an approved, active consignor",
                consignor.consignor_number
            )));
        }
        if let Some(category_id) = input.category_id {
            self.ensure_active_category(organization_id, category_id)
                .await?;
        }

        let sku = match input.sku.map(|s| s.trim().to_uppercase()) {
            Some(sku) if !sku.is_empty() => sku,
            _ => generate_sku(),
        };
        let taken = ItemEntity::find()
            .filter(item::Column::OrganizationId.eq(organization_id))
            .filter(item::Column::Sku.eq(sku.as_str()))
            .count(db)
            .await?;
        if taken > 0 {
            return Err(ServiceError::Conflict(format!("SKU {} is already in use", sku)));
        }

        let model = item::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            consignor_id: Set(consignor.id),
            category_id: Set(input.category_id),
            sku: Set(sku),
            title: Set(title),
            description: Set(input.description),
            price: Set(price),
            status: Set(ItemStatus::Available),
            is_public: Set(input.is_public.unwrap_or(true)),
            received_at: Set(input.received_at.unwrap_or_else(Utc::now)),
            sold_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(item_id = %model.id, sku = %model.sku, "item consigned");
        Ok(model.into())
    }

    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        organization_id: Uuid,
        filter: ItemFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<ItemView>, u64), ServiceError> {
        let (page, limit) = super::page_window(page, limit);
        let mut query = ItemEntity::find().filter(item::Column::OrganizationId.eq(organization_id));

        if let Some(status) = filter.status {
            query = query.filter(item::Column::Status.eq(status));
        }
        if let Some(consignor_id) = filter.consignor_id {
            query = query.filter(item::Column::ConsignorId.eq(consignor_id));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(item::Column::CategoryId.eq(category_id));
        }
        if let Some(search) = filter.search.filter(|s| !s.trim().is_empty()) {
            let search = search.trim().to_string();
            query = query.filter(
                Condition::any()
                    .add(item::Column::Title.contains(&search))
                    .add(item::Column::Sku.contains(&search)),
            );
        }

        let paginator = query
            .order_by_desc(item::Column::ReceivedAt)
            .paginate(&*self.db_pool, limit);
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page).await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, organization_id: Uuid, item_id: Uuid) -> Result<ItemView, ServiceError> {
        find_in_organization(&*self.db_pool, organization_id, item_id)
            .await
            .map(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn update_item(
        &self,
        organization_id: Uuid,
        item_id: Uuid,
        input: UpdateItemInput,
    ) -> Result<ItemView, ServiceError> {
        let existing = find_in_organization(&*self.db_pool, organization_id, item_id).await?;
        if existing.status == ItemStatus::Sold {
            return Err(ServiceError::InvalidOperation(
                "Sold items cannot be modified".to_string(),
            ));
        }

        if let Some(category_id) = input.category_id {
            self.ensure_active_category(organization_id, category_id)
                .await?;
        }

        let mut model = existing.into_active_model();
        if let Some(category_id) = input.category_id {
            model.category_id = Set(Some(category_id));
        }
        if let Some(title) = input.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(ServiceError::ValidationError("Title is required".to_string()));
            }
            model.title = Set(title);
        }
        if let Some(description) = input.description {
            model.description = Set(Some(description));
        }
        if let Some(price) = input.price {
            model.price = Set(validate_price(price)?);
        }
        if let Some(is_public) = input.is_public {
            model.is_public = Set(is_public);
        }

        Ok(model.update(&*self.db_pool).await?.into())
    }

    /// Takes an unsold item off the floor.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        organization_id: Uuid,
        item_id: Uuid,
    ) -> Result<ItemView, ServiceError> {
        let existing = find_in_organization(&*self.db_pool, organization_id, item_id).await?;
        match existing.status {
            ItemStatus::Sold => {
                return Err(ServiceError::InvalidOperation(
                    "Sold items cannot be removed".to_string(),
                ))
            }
            ItemStatus::Removed => return Ok(existing.into()),
            ItemStatus::Available => {}
        }

        let mut model = existing.into_active_model();
        model.status = Set(ItemStatus::Removed);
        model.is_public = Set(false);
        let updated = model.update(&*self.db_pool).await?;

        info!(item_id = %item_id, "item removed");
        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ApprovalStatus;
    use crate::test_support;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use sea_orm::ActiveModelTrait;

    fn input(consignor_id: Uuid, category_id: Option<Uuid>) -> CreateItemInput {
        CreateItemInput {
            consignor_id,
            category_id,
            sku: None,
            title: "Leather bag".to_string(),
            description: None,
            price: dec!(120.005),
            is_public: None,
            received_at: None,
        }
    }

    #[tokio::test]
    async fn create_item_generates_sku_and_rounds_price() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let c = test_support::consignor(&t.db, org.id, 1, None).await;
        let service = ItemService::new(t.db.clone());

        let item = service.create_item(org.id, input(c.id, None)).await.unwrap();
        assert!(item.sku.starts_with("SKU-"));
        assert_eq!(item.price, dec!(120.01));
        assert_eq!(item.status, ItemStatus::Available);
    }

    #[tokio::test]
    async fn pending_consignor_cannot_consign() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let c = test_support::consignor(&t.db, org.id, 1, None).await;
        let mut pending = c.clone().into_active_model();
        pending.approval_status = Set(ApprovalStatus::Pending);
        pending.update(&*t.db).await.unwrap();
        let service = ItemService::new(t.db.clone());

        assert_matches!(
            service.create_item(org.id, input(c.id, None)).await,
            Err(ServiceError::ValidationError(_))
        );
    }

    #[tokio::test]
    async fn inactive_category_is_rejected() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let c = test_support::consignor(&t.db, org.id, 1, None).await;
        let category = test_support::category(&t.db, org.id, "Hats").await;
        let mut inactive = category.clone().into_active_model();
        inactive.is_active = Set(false);
        inactive.update(&*t.db).await.unwrap();
        let service = ItemService::new(t.db.clone());

        let err = service
            .create_item(org.id, input(c.id, Some(category.id)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("inactive"));
    }

    #[tokio::test]
    async fn duplicate_sku_conflicts() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let c = test_support::consignor(&t.db, org.id, 1, None).await;
        let service = ItemService::new(t.db.clone());

        let mut first = input(c.id, None);
        first.sku = Some("abc-1".to_string());
        let created = service.create_item(org.id, first.clone()).await.unwrap();
        assert_eq!(created.sku, "ABC-1");
        assert_matches!(
            service.create_item(org.id, first).await,
            Err(ServiceError::Conflict(_))
        );
    }

    #[tokio::test]
    async fn sold_items_are_immutable() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let c = test_support::consignor(&t.db, org.id, 1, None).await;
        let sale = test_support::sale(&t.db, org.id, c.id, dec!(10), dec!(5), Utc::now()).await;
        let mut sold = find_in_organization(&*t.db, org.id, sale.item_id)
            .await
            .unwrap()
            .into_active_model();
        sold.status = Set(ItemStatus::Sold);
        sold.update(&*t.db).await.unwrap();
        let service = ItemService::new(t.db.clone());

        let update = UpdateItemInput {
            price: Some(dec!(1)),
            ..Default::default()
        };
        assert_matches!(
            service.update_item(org.id, sale.item_id, update).await,
            Err(ServiceError::InvalidOperation(_))
        );
        assert_matches!(
            service.remove_item(org.id, sale.item_id).await,
            Err(ServiceError::InvalidOperation(_))
        );
    }

    #[tokio::test]
    async fn list_items_filters_by_search() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let c = test_support::consignor(&t.db, org.id, 1, None).await;
        let service = ItemService::new(t.db.clone());
        service.create_item(org.id, input(c.id, None)).await.unwrap();
        let mut scarf = input(c.id, None);
        scarf.title = "Silk scarf".to_string();
        service.create_item(org.id, scarf).await.unwrap();

        let filter = ItemFilter {
            search: Some("scarf".to_string()),
            ..Default::default()
        };
        let (items, total) = service.list_items(org.id, filter, 1, 20).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].title, "Silk scarf");
    }
}
