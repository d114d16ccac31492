use crate::{
    db::DbPool,
    entities::{
        item,
        item_category::{self, Entity as CategoryEntity},
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<item_category::Model> for CategoryView {
    fn from(model: item_category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

pub(crate) async fn find_in_organization<C>(
    conn: &C,
    organization_id: Uuid,
    category_id: Uuid,
) -> Result<item_category::Model, ServiceError>
where
    C: ConnectionTrait,
{
    CategoryEntity::find_by_id(category_id)
        .filter(item_category::Column::OrganizationId.eq(organization_id))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))
}

#[derive(Clone)]
pub struct CategoryService {
    db_pool: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn ensure_unique_name(
        &self,
        organization_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = CategoryEntity::find()
            .filter(item_category::Column::OrganizationId.eq(organization_id))
            .filter(item_category::Column::IsActive.eq(true))
            .filter(item_category::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(item_category::Column::Id.ne(id));
        }
        if query.count(&*self.db_pool).await? > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, input))]
    pub async fn create_category(
        &self,
        organization_id: Uuid,
        input: CreateCategoryInput,
    ) -> Result<CategoryView, ServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name is required".to_string(),
            ));
        }
        self.ensure_unique_name(organization_id, &name, None).await?;

        let model = item_category::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            name: Set(name),
            description: Set(input.description),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(category_id = %model.id, "category created");
        Ok(model.into())
    }

    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        organization_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<CategoryView>, ServiceError> {
        let mut query = CategoryEntity::find()
            .filter(item_category::Column::OrganizationId.eq(organization_id));
        if !include_inactive {
            query = query.filter(item_category::Column::IsActive.eq(true));
        }
        let models = query
            .order_by_asc(item_category::Column::Name)
            .all(&*self.db_pool)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_category(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
    ) -> Result<CategoryView, ServiceError> {
        find_in_organization(&*self.db_pool, organization_id, category_id)
            .await
            .map(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<CategoryView, ServiceError> {
        let existing = find_in_organization(&*self.db_pool, organization_id, category_id).await?;
        let mut model = existing.into_active_model();

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Category name is required".to_string(),
                ));
            }
            self.ensure_unique_name(organization_id, &name, Some(category_id))
                .await?;
            model.name = Set(name);
        }
        if let Some(description) = input.description {
            model.description = Set(Some(description));
        }
        if let Some(is_active) = input.is_active {
            model.is_active = Set(is_active);
        }

        Ok(model.update(&*self.db_pool).await?.into())
    }

    /// Soft-deletes a category that no item references.
    #[instrument(skip(self))]
    pub async fn delete_category(
        &self,
        organization_id: Uuid,
        category_id: Uuid,
    ) -> Result<CategoryView, ServiceError> {
        let existing = find_in_organization(&*self.db_pool, organization_id, category_id).await?;

        let assigned = item::Entity::find()
            .filter(item::Column::CategoryId.eq(category_id))
            .count(&*self.db_pool)
            .await?;
        if assigned > 0 {
            return Err(ServiceError::Conflict(
                "Cannot delete category with items assigned".to_string(),
            ));
        }

        let mut model = existing.into_active_model();
        model.is_active = Set(false);
        let updated = model.update(&*self.db_pool).await?;

        info!(category_id = %category_id, "category deactivated");
        Ok(updated.into())
    }
}
