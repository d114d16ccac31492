use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::entities::{consignor, organization, payout, statement, user};
use crate::errors::ServiceError;
use crate::notifications::{self, EmailMessage, EmailSender};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), ServiceError> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))
    }

    /// Sends after a commit; the committed work stands even if nobody listens.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("{}", e);
        }
    }
}

/// Domain events emitted by the services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OwnerRegistered {
        organization_id: Uuid,
        user_id: Uuid,
    },
    OwnerApproved {
        organization_id: Uuid,
        user_id: Uuid,
        store_code: String,
    },
    OwnerRejected {
        user_id: Uuid,
    },
    ConsignorRegistered {
        organization_id: Uuid,
        consignor_id: Uuid,
        auto_approved: bool,
    },
    ConsignorApproved {
        organization_id: Uuid,
        consignor_id: Uuid,
    },
    ItemSold {
        organization_id: Uuid,
        item_id: Uuid,
        transaction_id: Uuid,
        sale_price: Decimal,
    },
    TransactionVoided {
        organization_id: Uuid,
        transaction_id: Uuid,
    },
    PayoutCreated {
        organization_id: Uuid,
        consignor_id: Uuid,
        payout_id: Uuid,
        amount: Decimal,
    },
    StatementGenerated {
        organization_id: Uuid,
        consignor_id: Uuid,
        statement_id: Uuid,
        period_start: NaiveDate,
    },
    SubscriptionUpdated {
        organization_id: Uuid,
        status: organization::SubscriptionStatus,
    },
}

/// Turns events into consignor and owner notifications.
#[derive(Clone)]
pub struct EventHandler {
    db: Arc<DatabaseConnection>,
    email: Arc<dyn EmailSender>,
}

impl EventHandler {
    pub fn new(db: Arc<DatabaseConnection>, email: Arc<dyn EmailSender>) -> Self {
        Self { db, email }
    }

    pub async fn handle(&self, event: Event) -> Result<(), ServiceError> {
        match event {
            Event::PayoutCreated { payout_id, .. } => self.notify_payout(payout_id).await,
            Event::StatementGenerated { statement_id, .. } => {
                self.notify_statement(statement_id).await
            }
            Event::OwnerApproved {
                user_id,
                store_code,
                ..
            } => self.notify_owner_approved(user_id, &store_code).await,
            other => {
                debug!(event = ?other, "no notification for event");
                Ok(())
            }
        }
    }

    async fn notify_payout(&self, payout_id: Uuid) -> Result<(), ServiceError> {
        let Some(payout) = payout::Entity::find_by_id(payout_id).one(&*self.db).await? else {
            return Err(ServiceError::NotFound(format!("Payout {} not found", payout_id)));
        };
        let Some((consignor, email)) = self.consignor_with_email(payout.consignor_id).await? else {
            return Ok(());
        };

        self.deliver(notifications::payout_email(
            &email,
            &consignor.display_name(),
            &payout.payout_number,
            payout.amount,
            payout.transaction_count,
        ))
        .await
    }

    async fn notify_statement(&self, statement_id: Uuid) -> Result<(), ServiceError> {
        let Some(statement) = statement::Entity::find_by_id(statement_id)
            .one(&*self.db)
            .await?
        else {
            // Replaced by a later regeneration before we got to it
            return Ok(());
        };
        let Some((consignor, email)) = self.consignor_with_email(statement.consignor_id).await?
        else {
            return Ok(());
        };

        self.deliver(notifications::statement_email(
            &email,
            &consignor.display_name(),
            &statement.statement_number,
            statement.closing_balance,
        ))
        .await
    }

    async fn notify_owner_approved(&self, user_id: Uuid, store_code: &str) -> Result<(), ServiceError> {
        let owner = user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

        self.deliver(notifications::owner_approved_email(
            &owner.email,
            &owner.full_name,
            store_code,
        ))
        .await
    }

    async fn consignor_with_email(
        &self,
        consignor_id: Uuid,
    ) -> Result<Option<(consignor::Model, String)>, ServiceError> {
        let consignor = consignor::Entity::find_by_id(consignor_id)
            .one(&*self.db)
            .await?;
        Ok(consignor.and_then(|c| {
            let email = c.email.clone().filter(|e| !e.is_empty())?;
            Some((c, email))
        }))
    }

    async fn deliver(&self, message: EmailMessage) -> Result<(), ServiceError> {
        self.email
            .send(message)
            .await
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, handler: EventHandler) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        debug!("Received event: {:?}", event);
        if let Err(e) = handler.handle(event.clone()).await {
            error!(event = ?event, error = %e, "Failed to handle event");
        }
    }

    info!("Event channel closed; event processing stopped");
}
