use crate::{
    db::DbPool,
    entities::organization::{self, Entity as OrganizationEntity, SubscriptionStatus},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Shop profile and settings as seen by its staff.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub store_code: Option<String>,
    #[schema(value_type = String, example = "50.00")]
    pub default_split_percentage: Decimal,
    pub auto_approve_consignors: bool,
    pub is_active: bool,
    pub subscription_status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<organization::Model> for OrganizationView {
    fn from(model: organization::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            store_code: model.store_code,
            default_split_percentage: model.default_split_percentage,
            auto_approve_consignors: model.auto_approve_consignors,
            is_active: model.is_active,
            subscription_status: model.subscription_status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSettingsInput {
    pub name: Option<String>,
    pub default_split_percentage: Option<Decimal>,
    pub auto_approve_consignors: Option<bool>,
    pub stripe_customer_id: Option<String>,
}

#[derive(Clone)]
pub struct OrganizationService {
    db_pool: Arc<DbPool>,
}

impl OrganizationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub(crate) async fn find_model(
        &self,
        organization_id: Uuid,
    ) -> Result<organization::Model, ServiceError> {
        OrganizationEntity::find_by_id(organization_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Organization not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn get_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<OrganizationView, ServiceError> {
        self.find_model(organization_id).await.map(Into::into)
    }

    #[instrument(skip(self, input))]
    pub async fn update_settings(
        &self,
        organization_id: Uuid,
        input: UpdateSettingsInput,
    ) -> Result<OrganizationView, ServiceError> {
        let mut model = self.find_model(organization_id).await?.into_active_model();

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::ValidationError(
                    "Organization name is required".to_string(),
                ));
            }
            model.name = Set(name);
        }
        if let Some(split) = input.default_split_percentage {
            super::validate_split(split)?;
            model.default_split_percentage = Set(super::round_money(split));
        }
        if let Some(auto_approve) = input.auto_approve_consignors {
            model.auto_approve_consignors = Set(auto_approve);
        }
        if let Some(customer_id) = input.stripe_customer_id {
            model.stripe_customer_id = Set(Some(customer_id).filter(|c| !c.is_empty()));
        }

        let updated = model.update(&*self.db_pool).await?;
        info!(organization_id = %updated.id, "organization settings updated");
        Ok(updated.into())
    }
}
