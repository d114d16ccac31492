#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use consignment_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db::{self, DbConfig},
    events::{self, EventHandler, EventSender},
    notifications::LogEmailSender,
    AppState,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const ADMIN_EMAIL: &str = "admin@platform.test";
pub const PASSWORD: &str = "correct-horse-battery";

/// A shop that has been registered, approved and logged into.
pub struct Shop {
    pub organization_id: Uuid,
    pub owner_id: Uuid,
    pub store_code: String,
    pub owner_token: String,
}

/// Boots the full router over an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    admin_token: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.stripe_webhook_secret = Some(TEST_WEBHOOK_SECRET.to_string());

        // One connection keeps every query on the same in-memory database.
        let pool = db::establish_connection_with_config(&DbConfig::single_connection(
            cfg.database_url.clone(),
        ))
        .await
        .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(
            event_rx,
            EventHandler::new(db_arc.clone(), Arc::new(LogEmailSender)),
        ));

        let auth_service = Arc::new(AuthService::new(AuthConfig::from(&cfg)));
        let state = AppState::new(
            db_arc,
            cfg,
            auth_service,
            Arc::new(EventSender::new(event_tx)),
        );

        state
            .services
            .registration
            .create_admin(ADMIN_EMAIL, "Platform Admin", PASSWORD)
            .await
            .expect("create admin");

        let router = consignment_api::app_router(state.clone()).layer(
            axum::middleware::from_fn(consignment_api::tracing::request_id_middleware),
        );

        let mut app = Self {
            router,
            state,
            admin_token: String::new(),
            _event_task: event_task,
        };
        app.admin_token = app.login(ADMIN_EMAIL, PASSWORD).await;
        app
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends raw bytes with extra headers; used for webhooks.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        body: Vec<u8>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(body)).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Request and decode the JSON body in one step.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, token).await;
        read_json(response).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/login",
                Some(json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["token"]["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }

    /// Registers an owner without approving them; returns the user id.
    pub async fn register_owner(&self, shop_name: &str, email: &str) -> Uuid {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/register",
                Some(json!({
                    "organization_name": shop_name,
                    "full_name": "Olive Owner",
                    "email": email,
                    "password": PASSWORD,
                })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        uuid_at(&body["data"]["id"])
    }

    /// Registers, approves and logs in a shop owner.
    pub async fn onboard_shop(&self, shop_name: &str) -> Shop {
        let email = format!("owner-{}@shop.test", Uuid::new_v4().simple());
        let owner_id = self.register_owner(shop_name, &email).await;

        let (status, body) = self
            .call(
                Method::POST,
                &format!("/api/v1/admin/registrations/{}/approve", owner_id),
                None,
                Some(self.admin_token()),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "approve failed: {body}");

        let store_code = body["data"]["store_code"]
            .as_str()
            .expect("store code")
            .to_string();
        let organization_id = uuid_at(&body["data"]["user"]["organization_id"]);
        let owner_token = self.login(&email, PASSWORD).await;

        Shop {
            organization_id,
            owner_id,
            store_code,
            owner_token,
        }
    }

    pub async fn create_consignor(&self, shop: &Shop, split: Option<&str>) -> Uuid {
        let mut payload = json!({
            "first_name": "Clara",
            "last_name": "Consignor",
            "email": format!("clara-{}@example.com", Uuid::new_v4().simple()),
        });
        if let Some(split) = split {
            payload["split_percentage"] = json!(split);
        }
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/consignors",
                Some(payload),
                Some(&shop.owner_token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create consignor failed: {body}");
        uuid_at(&body["data"]["id"])
    }

    pub async fn create_category(&self, shop: &Shop, name: &str) -> Uuid {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/categories",
                Some(json!({ "name": name })),
                Some(&shop.owner_token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create category failed: {body}");
        uuid_at(&body["data"]["id"])
    }

    pub async fn create_item(
        &self,
        shop: &Shop,
        consignor_id: Uuid,
        category_id: Option<Uuid>,
        title: &str,
        price: &str,
    ) -> Uuid {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/items",
                Some(json!({
                    "consignor_id": consignor_id,
                    "category_id": category_id,
                    "title": title,
                    "price": price,
                })),
                Some(&shop.owner_token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create item failed: {body}");
        uuid_at(&body["data"]["id"])
    }

    /// Consigns an item and sells it at its tag price; returns the sale.
    pub async fn sell(&self, shop: &Shop, consignor_id: Uuid, price: &str) -> Value {
        let item_id = self
            .create_item(shop, consignor_id, None, "Vintage lamp", price)
            .await;
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/transactions",
                Some(json!({ "item_id": item_id, "payment_method": "card" })),
                Some(&shop.owner_token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "record sale failed: {body}");
        body["data"].clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

pub fn uuid_at(value: &Value) -> Uuid {
    Uuid::parse_str(value.as_str().expect("uuid string")).expect("valid uuid")
}

/// Money fields serialize as strings; accept numbers too.
pub fn decimal_at(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    }
}
