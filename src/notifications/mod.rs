//! Outbound email to consignors and shop owners.
//!
//! SendGrid is used when an API key is configured; otherwise messages are
//! written to the log so local runs and tests never reach the network.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::AppConfig;

const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Notification errors
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Email provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Delivery channel for [`EmailMessage`]s
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError>;
}

/// SendGrid v3 mail-send client
#[derive(Clone)]
pub struct SendGridEmailSender {
    client: reqwest::Client,
    api_key: String,
    from_address: String,
    endpoint: String,
}

impl SendGridEmailSender {
    pub fn new(api_key: String, from_address: String) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key,
            from_address,
            endpoint: SENDGRID_API_URL.to_string(),
        })
    }

    /// Points the client at a different endpoint, e.g. a sandbox.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Request body for SendGrid's mail-send API
pub fn sendgrid_payload(from_address: &str, message: &EmailMessage) -> serde_json::Value {
    json!({
        "personalizations": [{ "to": [{ "email": message.to }] }],
        "from": { "email": from_address },
        "subject": message.subject,
        "content": [{ "type": "text/plain", "value": message.body }],
    })
}

#[async_trait]
impl EmailSender for SendGridEmailSender {
    #[instrument(skip(self, message), fields(to = %message.to))]
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&sendgrid_payload(&self.from_address, &message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(subject = %message.subject, "email sent");
        Ok(())
    }
}

/// Writes messages to the log instead of sending them
#[derive(Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "email delivery disabled; message logged"
        );
        Ok(())
    }
}

/// Picks SendGrid when configured, the log sender otherwise.
pub fn email_sender_from_config(
    config: &AppConfig,
) -> Result<Arc<dyn EmailSender>, NotificationError> {
    match config.sendgrid_api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(api_key) => Ok(Arc::new(SendGridEmailSender::new(
            api_key.to_string(),
            config.email_from_address.clone(),
        )?)),
        None => Ok(Arc::new(LogEmailSender)),
    }
}

pub fn payout_email(
    to: &str,
    consignor_name: &str,
    payout_number: &str,
    amount: Decimal,
    transaction_count: i32,
) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Payout {} issued", payout_number),
        body: format!(
            "Hi {},\n\nWe've issued payout {} for ${:.2} covering {} sold item(s).\n",
            consignor_name, payout_number, amount, transaction_count
        ),
    }
}

pub fn statement_email(
    to: &str,
    consignor_name: &str,
    statement_number: &str,
    closing_balance: Decimal,
) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Statement {} is ready", statement_number),
        body: format!(
            "Hi {},\n\nYour statement {} is available. Closing balance: ${:.2}.\n",
            consignor_name, statement_number, closing_balance
        ),
    }
}

pub fn owner_approved_email(to: &str, owner_name: &str, store_code: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: "Your shop has been approved".to_string(),
        body: format!(
            "Hi {},\n\nYour shop is live. Share store code {} with consignors so they can register.\n",
            owner_name, store_code
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sendgrid_payload_has_recipient_and_body() {
        let message = payout_email("c@example.com", "Ada", "PAY-20240131-ABC123", dec!(42.5), 3);
        let payload = sendgrid_payload("shop@example.com", &message);

        assert_eq!(
            payload["personalizations"][0]["to"][0]["email"],
            "c@example.com"
        );
        assert_eq!(payload["from"]["email"], "shop@example.com");
        assert_eq!(payload["subject"], "Payout PAY-20240131-ABC123 issued");
        assert!(payload["content"][0]["value"]
            .as_str()
            .unwrap()
            .contains("$42.50"));
    }

    #[tokio::test]
    async fn log_sender_accepts_messages() {
        let sender = LogEmailSender;
        let message = statement_email("c@example.com", "Ada", "STMT-202401-C-0001", dec!(10));
        assert!(sender.send(message).await.is_ok());
    }

    #[test]
    fn config_without_api_key_uses_log_sender() {
        let config = AppConfig::new(
            "sqlite::memory:".into(),
            "a".repeat(32),
            "127.0.0.1".into(),
            8080,
            "test".into(),
        );
        assert!(email_sender_from_config(&config).is_ok());
    }
}
