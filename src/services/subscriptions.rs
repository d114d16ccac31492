//! Applies Stripe subscription lifecycle events to organizations.

use crate::{
    db::DbPool,
    entities::organization::{self, SubscriptionStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// The parts of a Stripe event envelope this service reads.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: StripeSubscription,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeSubscription {
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Applied {
        organization_id: Uuid,
        status: SubscriptionStatus,
    },
    /// Acknowledged without changes: unhandled type or unknown customer
    Ignored { reason: String },
}

fn target_status(event: &StripeEvent) -> Option<SubscriptionStatus> {
    match event.event_type.as_str() {
        "customer.subscription.created" | "customer.subscription.updated" => Some(
            SubscriptionStatus::from_stripe(event.data.object.status.as_deref().unwrap_or("")),
        ),
        "customer.subscription.deleted" => Some(SubscriptionStatus::Canceled),
        _ => None,
    }
}

#[derive(Clone)]
pub struct SubscriptionService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl SubscriptionService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    async fn find_organization(
        &self,
        subscription: &StripeSubscription,
    ) -> Result<Option<organization::Model>, ServiceError> {
        let db = &*self.db_pool;
        if let Some(customer) = subscription.customer.as_deref() {
            let found = organization::Entity::find()
                .filter(organization::Column::StripeCustomerId.eq(customer))
                .one(db)
                .await?;
            if found.is_some() {
                return Ok(found);
            }
        }

        let Some(org_id) = subscription
            .metadata
            .get("organization_id")
            .and_then(|raw| Uuid::parse_str(raw).ok())
        else {
            return Ok(None);
        };
        Ok(organization::Entity::find_by_id(org_id).one(db).await?)
    }

    /// Updates the matching organization's subscription status.
    #[instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn apply_stripe_event(
        &self,
        event: &StripeEvent,
    ) -> Result<WebhookOutcome, ServiceError> {
        let Some(status) = target_status(event) else {
            info!("ignoring unhandled stripe event");
            return Ok(WebhookOutcome::Ignored {
                reason: format!("unhandled event type {}", event.event_type),
            });
        };

        let subscription = &event.data.object;
        let Some(organization) = self.find_organization(subscription).await? else {
            warn!(customer = ?subscription.customer, "no organization for stripe customer");
            return Ok(WebhookOutcome::Ignored {
                reason: "no matching organization".to_string(),
            });
        };

        let organization_id = organization.id;
        let link_customer = organization.stripe_customer_id.is_none();
        let mut model = organization.into_active_model();
        model.subscription_status = Set(status);
        if link_customer {
            model.stripe_customer_id = Set(subscription.customer.clone());
        }
        model.update(&*self.db_pool).await?;

        info!(organization_id = %organization_id, status = %status, "subscription updated");
        self.event_sender
            .send_or_log(Event::SubscriptionUpdated {
                organization_id,
                status,
            })
            .await;

        Ok(WebhookOutcome::Applied {
            organization_id,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn event(kind: &str, body: serde_json::Value) -> StripeEvent {
        serde_json::from_value(json!({
            "id": "evt_1",
            "type": kind,
            "data": { "object": body }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn metadata_links_customer_then_customer_id_is_used() {
        let t = test_support::setup().await;
        let org = test_support::organization(&t.db, dec!(50)).await;
        let service = SubscriptionService::new(t.db.clone(), t.events.clone());

        let created = event(
            "customer.subscription.created",
            json!({
                "customer": "cus_123",
                "status": "trialing",
                "metadata": { "organization_id": org.id.to_string() }
            }),
        );
        assert_eq!(
            service.apply_stripe_event(&created).await.unwrap(),
            WebhookOutcome::Applied {
                organization_id: org.id,
                status: SubscriptionStatus::Trialing
            }
        );

        let deleted = event(
            "customer.subscription.deleted",
            json!({ "customer": "cus_123", "status": "canceled" }),
        );
        service.apply_stripe_event(&deleted).await.unwrap();

        let reloaded = organization::Entity::find_by_id(org.id)
            .one(&*t.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reloaded.subscription_status, SubscriptionStatus::Canceled);
        assert_eq!(reloaded.stripe_customer_id.as_deref(), Some("cus_123"));
    }

    #[tokio::test]
    async fn unknown_customers_and_types_are_ignored() {
        let t = test_support::setup().await;
        let service = SubscriptionService::new(t.db.clone(), t.events.clone());

        let unknown = event(
            "customer.subscription.updated",
            json!({ "customer": "cus_missing", "status": "active" }),
        );
        assert!(matches!(
            service.apply_stripe_event(&unknown).await.unwrap(),
            WebhookOutcome::Ignored { .. }
        ));

        let invoice = event("invoice.paid", json!({}));
        assert!(matches!(
            service.apply_stripe_event(&invoice).await.unwrap(),
            WebhookOutcome::Ignored { .. }
        ));
    }
}
