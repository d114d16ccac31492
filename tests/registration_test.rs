mod common;

use axum::http::{Method, StatusCode};
use common::{uuid_at, TestApp, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn pending_owner_cannot_log_in_until_approved() {
    let app = TestApp::new().await;
    let owner_id = app.register_owner("Second Act", "olive@secondact.test").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": "olive@secondact.test", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, body) = app
        .call(
            Method::GET,
            "/api/v1/admin/registrations/pending",
            None,
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let pending = body["data"].as_array().expect("pending list");
    assert!(pending
        .iter()
        .any(|p| p["user_id"] == owner_id.to_string()));

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/admin/registrations/{}/approve", owner_id),
            None,
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let user = &body["data"]["user"];
    assert_eq!(user["approval_status"], "approved");
    assert!(user["approved_at"].is_string());
    assert!(user["approved_by"].is_string());

    let store_code = body["data"]["store_code"].as_str().unwrap();
    assert_eq!(store_code.len(), 6);
    assert!(store_code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

    app.login("olive@secondact.test", PASSWORD).await;
}

#[tokio::test]
async fn approved_shops_get_distinct_store_codes() {
    let app = TestApp::new().await;
    let first = app.onboard_shop("Thread Count").await;
    let second = app.onboard_shop("Good Bones").await;
    assert_ne!(first.store_code, second.store_code);
    assert_ne!(first.organization_id, second.organization_id);
}

#[tokio::test]
async fn rejecting_a_non_owner_fails_without_changes() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("Rerun Resale").await;
    let consignor_email = "casey@consignor.test";

    let (status, body) = app
        .call(
            Method::POST,
            "/auth/register/consignor",
            Some(json!({
                "store_code": shop.store_code,
                "first_name": "Casey",
                "last_name": "Lender",
                "email": consignor_email,
                "password": PASSWORD,
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let consignor_user = uuid_at(&body["data"]["user"]["id"]);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/admin/registrations/{}/reject", consignor_user),
            Some(json!({ "reason": "not a shop" })),
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("User is not an owner"));

    // Nothing was stamped on the consignor's account
    let (status, body) = app
        .call(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": consignor_email, "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap().contains("awaiting approval"));
}

#[tokio::test]
async fn rejected_owner_cannot_log_in() {
    let app = TestApp::new().await;
    let owner_id = app.register_owner("Fly By Night", "fbn@shop.test").await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/v1/admin/registrations/{}/reject", owner_id),
            Some(json!({ "reason": "incomplete application" })),
            Some(app.admin_token()),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["approval_status"], "rejected");
    assert_eq!(body["data"]["rejected_reason"], "incomplete application");

    let (status, _) = app
        .call(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": "fbn@shop.test", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicate_owner_email_conflicts() {
    let app = TestApp::new().await;
    app.register_owner("Once Upon", "dup@shop.test").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/auth/register",
            Some(json!({
                "organization_name": "Twice Upon",
                "full_name": "Dee Dupe",
                "email": "dup@shop.test",
                "password": PASSWORD,
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn registration_validates_fields() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(
            Method::POST,
            "/auth/register",
            Some(json!({
                "organization_name": "X",
                "full_name": "Short Password",
                "email": "not-an-email",
                "password": "short",
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().expect("field errors");
    assert!(errors.len() >= 3);
}

#[tokio::test]
async fn consignor_self_registration_respects_auto_approve() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("Auto Approve Attic").await;

    let (status, _) = app
        .call(
            Method::PUT,
            "/api/v1/organization/settings",
            Some(json!({ "auto_approve_consignors": true })),
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(
            Method::POST,
            "/auth/register/consignor",
            Some(json!({
                "store_code": shop.store_code.to_lowercase(),
                "first_name": "Quinn",
                "last_name": "Quick",
                "email": "quinn@consignor.test",
                "password": PASSWORD,
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["approved"], true);
    assert_eq!(body["data"]["consignor_number"], "C-0001");

    app.login("quinn@consignor.test", PASSWORD).await;
}

#[tokio::test]
async fn unknown_store_code_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app
        .call(
            Method::POST,
            "/auth/register/consignor",
            Some(json!({
                "store_code": "ZZZZZZ",
                "first_name": "Nobody",
                "last_name": "Home",
                "email": "nobody@consignor.test",
                "password": PASSWORD,
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn shop_owner_cannot_use_admin_routes() {
    let app = TestApp::new().await;
    let shop = app.onboard_shop("Not An Admin").await;
    let (status, _) = app
        .call(
            Method::GET,
            "/api/v1/admin/registrations/pending",
            None,
            Some(&shop.owner_token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
