mod common;

use axum::http::{Method, StatusCode};
use common::{read_json, uuid_at, TestApp, TEST_WEBHOOK_SECRET};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;

const WEBHOOK: &str = "/api/v1/webhooks/stripe";

fn signature_header(payload: &[u8], secret: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

fn subscription_event(event_type: &str, customer: &str, status: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": "evt_test_1",
        "type": event_type,
        "data": { "object": { "customer": customer, "status": status, "metadata": {} } },
    }))
    .unwrap()
}

async fn deliver(app: &TestApp, payload: Vec<u8>, secret: &str) -> (StatusCode, Value) {
    let header = signature_header(&payload, secret);
    let response = app
        .request_raw(
            Method::POST,
            WEBHOOK,
            payload,
            &[("stripe-signature", header.as_str())],
        )
        .await;
    read_json(response).await
}

#[tokio::test]
async fn signed_subscription_update_changes_organization_status() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("Subscribed Shop").await;
    let (status, _) = app
        .call(
            Method::PUT,
            "/api/v1/organization/settings",
            Some(json!({ "stripe_customer_id": "cus_subscribed" })),
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let payload = subscription_event("customer.subscription.updated", "cus_subscribed", "active");
    let (status, body) = deliver(&app, payload, TEST_WEBHOOK_SECRET).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["result"], "applied");
    assert_eq!(uuid_at(&body["data"]["organization_id"]), shop.organization_id);

    let (_, body) = app
        .call(
            Method::GET,
            "/api/v1/organization",
            None,
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(body["data"]["subscription_status"], "active");

    let payload = subscription_event("customer.subscription.deleted", "cus_subscribed", "active");
    let (status, _) = deliver(&app, payload, TEST_WEBHOOK_SECRET).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .call(
            Method::GET,
            "/api/v1/organization",
            None,
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(body["data"]["subscription_status"], "canceled");
}

#[tokio::test]
async fn wrong_secret_is_unauthorized() {
    let app = TestApp::new().await;
    let payload = subscription_event("customer.subscription.updated", "cus_any", "active");
    let (status, body) = deliver(&app, payload, "whsec_someone_else").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn missing_signature_is_unauthorized() {
    let app = TestApp::new().await;
    let payload = subscription_event("customer.subscription.updated", "cus_any", "active");
    let response = app.request_raw(Method::POST, WEBHOOK, payload, &[]).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unhandled_events_and_unknown_customers_are_acknowledged() {
    let app = TestApp::new().await;

    let payload = subscription_event("invoice.paid", "cus_any", "active");
    let (status, body) = deliver(&app, payload, TEST_WEBHOOK_SECRET).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["result"], "ignored");

    let payload = subscription_event("customer.subscription.updated", "cus_nobody", "active");
    let (status, body) = deliver(&app, payload, TEST_WEBHOOK_SECRET).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["result"], "ignored");
}
