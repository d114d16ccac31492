//! Stripe subscription webhook.

use axum::{extract::State, http::HeaderMap, Json};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::{
    errors::ServiceError,
    services::subscriptions::{StripeEvent, WebhookOutcome},
    ApiResponse, ApiResult, AppState,
};

type HmacSha256 = Hmac<Sha256>;

pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing or malformed signature header")]
    Malformed,
    #[error("signature timestamp outside tolerance")]
    Expired,
    #[error("no matching signature")]
    Mismatch,
}

/// Checks a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=...]`) against
/// the raw payload. Any matching `v1` entry is accepted.
pub fn verify_stripe_signature(
    header: &str,
    payload: &[u8],
    secret: &str,
    tolerance_secs: u64,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if signatures.is_empty() {
        return Err(SignatureError::Malformed);
    }
    if now.abs_diff(timestamp) > tolerance_secs {
        return Err(SignatureError::Expired);
    }

    let mut signed = timestamp.to_string().into_bytes();
    signed.push(b'.');
    signed.extend_from_slice(payload);

    for candidate in signatures {
        let Ok(expected) = hex::decode(candidate) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| SignatureError::Malformed)?;
        mac.update(&signed);
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }
    Err(SignatureError::Mismatch)
}

#[utoipa::path(
    post,
    path = "/api/v1/webhooks/stripe",
    request_body(content = String, description = "Raw Stripe event JSON", content_type = "application/json"),
    responses(
        (status = 200, description = "Event processed or acknowledged", body = ApiResponse<WebhookOutcome>),
        (status = 400, description = "Unparseable event", body = crate::errors::ErrorResponse),
        (status = 401, description = "Invalid signature", body = crate::errors::ErrorResponse),
    ),
    tag = "webhooks"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<WebhookOutcome> {
    match state.config.stripe_webhook_secret.as_deref() {
        Some(secret) => {
            let header = headers
                .get(STRIPE_SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    ServiceError::Unauthorized("missing Stripe-Signature header".to_string())
                })?;
            verify_stripe_signature(
                header,
                &body,
                secret,
                state.config.stripe_webhook_tolerance_secs,
                chrono::Utc::now().timestamp(),
            )
            .map_err(|e| {
                warn!(error = %e, "stripe webhook signature rejected");
                ServiceError::Unauthorized(format!("invalid webhook signature: {}", e))
            })?;
        }
        None if state.config.is_development() => {
            warn!("stripe webhook secret not configured; skipping signature check");
        }
        None => {
            return Err(ServiceError::InternalError(
                "stripe webhook secret not configured".to_string(),
            ));
        }
    }

    let event: StripeEvent = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::BadRequest(format!("invalid stripe event: {}", e)))?;
    let outcome = state.services.subscriptions.apply_stripe_event(&event).await?;
    Ok(Json(ApiResponse::success(outcome)))
}
