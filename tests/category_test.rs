mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn category_with_items_cannot_be_deleted() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("Sorted Goods").await;
    let consignor = app.create_consignor(&shop, None).await;
    let furniture = app.create_category(&shop, "Furniture").await;
    app.create_item(&shop, consignor, Some(furniture), "Oak chair", "45.00")
        .await;

    let (status, body) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/categories/{}", furniture),
            None,
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Cannot delete category with items assigned");

    let (_, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/categories/{}", furniture),
            None,
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(body["data"]["is_active"], true);
}

#[tokio::test]
async fn empty_category_is_deactivated() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("Tidy Shelves").await;
    let books = app.create_category(&shop, "Books").await;

    let (status, body) = app
        .call(
            Method::DELETE,
            &format!("/api/v1/categories/{}", books),
            None,
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["is_active"], false);

    let (_, body) = app
        .call(
            Method::GET,
            "/api/v1/categories",
            None,
            Some(&shop.owner_token),
        )
        .await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body) = app
        .call(
            Method::GET,
            "/api/v1/categories?include_inactive=true",
            None,
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn category_names_are_unique_per_shop() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("One Of Each").await;
    let other = app.onboard_shop("Copycat").await;
    app.create_category(&shop, "Lighting").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "name": "Lighting" })),
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Another shop may reuse the name
    app.create_category(&other, "Lighting").await;
}

#[tokio::test]
async fn items_cannot_use_another_shops_category() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("Borrower").await;
    let other = app.onboard_shop("Lender").await;
    let consignor = app.create_consignor(&shop, None).await;
    let foreign = app.create_category(&other, "Rugs").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/items",
            Some(json!({
                "consignor_id": consignor,
                "category_id": foreign,
                "title": "Persian rug",
                "price": "300.00",
            })),
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
