#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use packworkx_api::{
    auth::{AuthConfig, AuthService, LoginCredentials},
    config::AppConfig,
    db,
    events::{self, EventSender},
    models::UserRole,
    services::users::CreateUserRequest,
    AppState,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@packworkx.test";
pub const PASSWORD: &str = "corrugated-42";

/// Helper harness for spinning up the real router over an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub auth_service: Arc<AuthService>,
    token: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Fresh schema, one seeded admin, and a bearer token for it.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps the in-memory database alive for the whole test.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(
            AuthConfig::from_app_config(&cfg),
            db_arc.clone(),
        ));
        let state = AppState::new(db_arc, cfg, event_sender);

        state
            .services
            .users
            .create_user(
                CreateUserRequest {
                    company_id: None,
                    name: "Admin".to_string(),
                    email: ADMIN_EMAIL.to_string(),
                    password: PASSWORD.to_string(),
                    role: UserRole::Admin,
                },
                None,
            )
            .await
            .expect("seed admin user");

        let token = auth_service
            .login(&LoginCredentials {
                email: ADMIN_EMAIL.to_string(),
                password: PASSWORD.to_string(),
            })
            .await
            .expect("admin login")
            .access_token;

        let router = packworkx_api::app_router(state.clone(), auth_service.clone());

        Self {
            router,
            state,
            auth_service,
            token,
            _event_task: event_task,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Send a request and decode the JSON body (Null when empty).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        let response = self.send(builder.body(body).expect("build request")).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, Some(self.token())).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), Some(self.token()))
            .await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body), Some(self.token()))
            .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None, Some(self.token()))
            .await
    }

    /// Create a user with `role` and return a token obtained through `/auth/login`.
    pub async fn token_for(&self, role: UserRole, company_id: Option<Uuid>) -> String {
        let email = format!("{}-{}@packworkx.test", role, Uuid::new_v4().simple());
        let (status, _) = self
            .post(
                "/api/v1/users",
                json!({
                    "company_id": company_id,
                    "name": format!("{} user", role),
                    "email": email,
                    "password": PASSWORD,
                    "role": role,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .request(
                Method::POST,
                "/auth/login",
                Some(json!({ "email": email, "password": PASSWORD })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }

    pub async fn create_company(&self, name: &str) -> Uuid {
        let (status, body) = self
            .post("/api/v1/companies", json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body["data"])
    }

    pub async fn create_client(&self, company_id: Uuid, name: &str) -> Uuid {
        let (status, body) = self
            .post(
                "/api/v1/clients",
                json!({ "company_id": company_id, "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body["data"])
    }

    pub async fn create_sku(&self, company_id: Uuid, name: &str) -> Uuid {
        let (status, body) = self
            .post(
                "/api/v1/skus",
                json!({
                    "company_id": company_id,
                    "name": name,
                    "ply": 5,
                    "length_mm": "300",
                    "width_mm": "200",
                    "height_mm": "150",
                    "unit_price": "42.50",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body["data"])
    }

    /// Purchase order with one line per `(sku, quantity)`; returns the PO body.
    pub async fn create_purchase_order(&self, company_id: Uuid, lines: &[(Uuid, i32)]) -> Value {
        let items: Vec<Value> = lines
            .iter()
            .map(|(sku_id, quantity)| json!({ "sku_id": sku_id, "quantity": quantity, "rate": "10.00" }))
            .collect();
        let (status, body) = self
            .post(
                "/api/v1/purchase-orders",
                json!({
                    "company_id": company_id,
                    "supplier_name": "Kraft Paper Mills",
                    "items": items,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub fn id_of(value: &Value) -> Uuid {
    value["id"]
        .as_str()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .unwrap_or_else(|| panic!("missing id in {value}"))
}

/// Money fields serialize as strings; compare them numerically.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(raw) => Decimal::from_str(raw).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}
