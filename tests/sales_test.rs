mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_at, uuid_at, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn sale_uses_consignor_split_and_marks_item_sold() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("Split Decisions").await;
    let consignor = app.create_consignor(&shop, Some("60")).await;
    let item = app
        .create_item(&shop, consignor, None, "Leather satchel", "80.00")
        .await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/transactions",
            Some(json!({ "item_id": item, "sale_price": "75.50", "payment_method": "Card" })),
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let sale = &body["data"];
    assert_eq!(decimal_at(&sale["sale_price"]), dec!(75.50));
    assert_eq!(decimal_at(&sale["consignor_amount"]), dec!(45.30));
    assert_eq!(decimal_at(&sale["shop_amount"]), dec!(30.20));
    assert_eq!(sale["payment_method"], "card");
    assert_eq!(sale["payout_status"], "Pending");

    let (_, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/items/{}", item),
            None,
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(body["data"]["status"], "sold");

    // A sold item cannot be sold twice
    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/transactions",
            Some(json!({ "item_id": item, "payment_method": "cash" })),
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sale_falls_back_to_organization_split() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("Default Split").await;
    let consignor = app.create_consignor(&shop, None).await;

    let sale = app.sell(&shop, consignor, "40.00").await;
    assert_eq!(decimal_at(&sale["split_percentage"]), dec!(50));
    assert_eq!(decimal_at(&sale["consignor_amount"]), dec!(20));
    assert_eq!(decimal_at(&sale["shop_amount"]), dec!(20));
}

#[tokio::test]
async fn voiding_restocks_the_item() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("Second Thoughts").await;
    let consignor = app.create_consignor(&shop, None).await;
    let sale = app.sell(&shop, consignor, "30.00").await;
    let sale_id = uuid_at(&sale["id"]);
    let item_id = uuid_at(&sale["item_id"]);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/transactions/{}/void", sale_id),
            Some(json!({ "reason": "customer returned it" })),
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["is_voided"], true);
    assert_eq!(body["data"]["void_reason"], "customer returned it");

    let (_, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/items/{}", item_id),
            None,
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(body["data"]["status"], "available");

    // Voided sales drop out of the default listing
    let (_, body) = app
        .call(
            Method::GET,
            "/api/v1/transactions",
            None,
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(body["data"]["total"], 0);

    let (_, body) = app
        .call(
            Method::GET,
            "/api/v1/transactions?include_voided=true",
            None,
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(body["data"]["total"], 1);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/api/v1/transactions/{}/void", sale_id),
            Some(json!({})),
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sales_are_isolated_per_organization() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("Mine").await;
    let other = app.onboard_shop("Theirs").await;
    let consignor = app.create_consignor(&shop, None).await;
    let sale = app.sell(&shop, consignor, "10.00").await;

    let (status, _) = app
        .call(
            Method::GET,
            &format!("/api/v1/transactions/{}", sale["id"].as_str().unwrap()),
            None,
            Some(&other.owner_token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sale_requires_a_payment_method() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("Cash Only").await;
    let consignor = app.create_consignor(&shop, None).await;
    let item = app.create_item(&shop, consignor, None, "Mirror", "15.00").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/v1/transactions",
            Some(json!({ "item_id": item, "payment_method": "   " })),
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
