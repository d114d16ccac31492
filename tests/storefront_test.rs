mod common;

use axum::http::{Method, StatusCode};
use common::{uuid_at, TestApp};
use serde_json::json;

#[tokio::test]
async fn storefront_shows_public_available_items_without_consignor_details() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("Window Display").await;
    let consignor = app.create_consignor(&shop, None).await;
    let lamps = app.create_category(&shop, "Lamps").await;

    let listed = app
        .create_item(&shop, consignor, Some(lamps), "Brass lamp", "65.00")
        .await;
    let hidden = app
        .create_item(&shop, consignor, None, "Back room lamp", "20.00")
        .await;
    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/v1/items/{}", hidden),
            Some(json!({ "is_public": false })),
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    app.sell(&shop, consignor, "15.00").await;

    // No token: the storefront is public
    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/storefront/{}", shop.store_code),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["name"], "Window Display");
    assert_eq!(body["data"]["store_code"], shop.store_code);
    assert_eq!(body["data"]["available_items"], 1);
    assert_eq!(body["data"]["categories"][0]["name"], "Lamps");

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/storefront/{}/items", shop.store_code),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    let item = &body["data"]["items"][0];
    assert_eq!(uuid_at(&item["id"]), listed);
    assert_eq!(item["category"]["name"], "Lamps");
    assert!(item.get("consignor_id").is_none());
    assert!(item.get("consignor").is_none());
}

#[tokio::test]
async fn storefront_search_and_category_filters() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("Browse Around").await;
    let consignor = app.create_consignor(&shop, None).await;
    let chairs = app.create_category(&shop, "Chairs").await;
    app.create_item(&shop, consignor, Some(chairs), "Wicker chair", "30.00")
        .await;
    app.create_item(&shop, consignor, None, "Glass vase", "12.00")
        .await;

    let (_, body) = app
        .call(
            Method::GET,
            &format!("/api/v1/storefront/{}/items?search=vase", shop.store_code),
            None,
            None,
        )
        .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Glass vase");

    let (_, body) = app
        .call(
            Method::GET,
            &format!(
                "/api/v1/storefront/{}/items?category_id={}",
                shop.store_code, chairs
            ),
            None,
            None,
        )
        .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Wicker chair");
}

#[tokio::test]
async fn unknown_store_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(Method::GET, "/api/v1/storefront/NOPE00", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
