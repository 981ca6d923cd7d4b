//! PackWorkX API
//!
//! Back office for corrugated-box manufacturers: companies, clients, SKUs,
//! purchase orders, goods-received notes, stock, invoicing and machine setup.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod commands;
pub mod config;
pub mod db;
pub mod documents;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod metrics;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;
pub mod tracing;
pub mod validation;

use axum::{
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::consts as perm;
use crate::auth::{AuthRouterExt, AuthService};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: Arc<events::EventSender>,
    ) -> Self {
        let services = handlers::AppServices::new(
            db.clone(),
            event_sender.clone(),
            config.document_number_padding,
        );
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

/// Success envelope shared by every `/api/v1` endpoint.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[test]
    fn success_envelope_serializes_expected_shape() {
        let body = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], serde_json::json!([1, 2]));
        assert!(body["meta"]["timestamp"].is_string());
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Every `/api/v1` route, grouped by the permission that gates it.
pub fn api_v1_routes() -> Router<AppState> {
    use handlers::{
        clients, companies, credit_notes, grns, inventory, invoices, machines, processes,
        purchase_orders, skus, users,
    };

    let companies_read = Router::new()
        .route("/companies", get(companies::list_companies))
        .route("/companies/:id", get(companies::get_company))
        .with_permission(perm::COMPANIES_READ);

    let companies_manage = Router::new()
        .route("/companies", post(companies::create_company))
        .route(
            "/companies/:id",
            put(companies::update_company).delete(companies::deactivate_company),
        )
        .route("/companies/:id/activate", post(companies::activate_company))
        .with_permission(perm::COMPANIES_MANAGE);

    let clients_read = Router::new()
        .route("/clients", get(clients::list_clients))
        .route("/clients/:id", get(clients::get_client))
        .route("/clients/:id/statement", get(clients::client_statement))
        .with_permission(perm::CLIENTS_READ);

    let clients_manage = Router::new()
        .route("/clients", post(clients::create_client))
        .route(
            "/clients/:id",
            put(clients::update_client).delete(clients::deactivate_client),
        )
        .route("/clients/:id/activate", post(clients::activate_client))
        .with_permission(perm::CLIENTS_MANAGE);

    let skus_read = Router::new()
        .route("/skus", get(skus::list_skus))
        .route("/skus/:id", get(skus::get_sku))
        .with_permission(perm::SKUS_READ);

    let skus_manage = Router::new()
        .route("/skus", post(skus::create_sku))
        .route("/skus/:id", put(skus::update_sku).delete(skus::deactivate_sku))
        .with_permission(perm::SKUS_MANAGE);

    let purchase_orders_read = Router::new()
        .route("/purchase-orders", get(purchase_orders::list_purchase_orders))
        .route("/purchase-orders/:id", get(purchase_orders::get_purchase_order))
        .route(
            "/purchase-orders/:id/receipt-summary",
            get(purchase_orders::receipt_summary),
        )
        .with_permission(perm::PURCHASEORDERS_READ);

    let purchase_orders_manage = Router::new()
        .route("/purchase-orders", post(purchase_orders::create_purchase_order))
        .route(
            "/purchase-orders/:id",
            put(purchase_orders::update_purchase_order)
                .delete(purchase_orders::deactivate_purchase_order),
        )
        .route(
            "/purchase-orders/:id/cancel",
            post(purchase_orders::cancel_purchase_order),
        )
        .with_permission(perm::PURCHASEORDERS_MANAGE);

    let grns_read = Router::new()
        .route("/grns", get(grns::list_grns))
        .route("/grns/:id", get(grns::get_grn))
        .with_permission(perm::GRNS_READ);

    let grns_manage = Router::new()
        .route("/grns", post(grns::create_grn))
        .route("/grns/:id", delete(grns::cancel_grn))
        .route("/grns/:id/items", put(grns::update_grn_items))
        .with_permission(perm::GRNS_MANAGE);

    let inventory_read = Router::new()
        .route("/inventory", get(inventory::list_inventory))
        .route("/inventory/low-stock", get(inventory::low_stock))
        .route("/inventory/:id", get(inventory::get_inventory))
        .route("/inventory/:id/history", get(inventory::inventory_history))
        .with_permission(perm::INVENTORY_READ);

    let inventory_manage = Router::new()
        .route("/inventory/adjust", post(inventory::adjust_inventory))
        .route(
            "/inventory/:id/reorder-level",
            put(inventory::set_reorder_level),
        )
        .with_permission(perm::INVENTORY_MANAGE);

    let invoices_read = Router::new()
        .route("/invoices", get(invoices::list_invoices))
        .route("/invoices/:id", get(invoices::get_invoice))
        .with_permission(perm::INVOICES_READ);

    let invoices_manage = Router::new()
        .route("/invoices", post(invoices::create_invoice))
        .route("/invoices/:id", delete(invoices::cancel_invoice))
        .with_permission(perm::INVOICES_MANAGE);

    let payments_read = Router::new()
        .route("/invoices/:id/payments", get(invoices::list_payments))
        .with_permission(perm::PAYMENTS_READ);

    let payments_manage = Router::new()
        .route("/invoices/:id/payments", post(invoices::record_payment))
        .route("/payments/:id", delete(invoices::reverse_payment))
        .with_permission(perm::PAYMENTS_MANAGE);

    let credit_notes_read = Router::new()
        .route("/credit-notes", get(credit_notes::list_credit_notes))
        .route("/credit-notes/:id", get(credit_notes::get_credit_note))
        .with_permission(perm::CREDITNOTES_READ);

    let credit_notes_manage = Router::new()
        .route("/credit-notes", post(credit_notes::issue_credit_note))
        .route("/credit-notes/:id", delete(credit_notes::cancel_credit_note))
        .with_permission(perm::CREDITNOTES_MANAGE);

    let processes_read = Router::new()
        .route("/processes", get(processes::list_processes))
        .route("/processes/:id", get(processes::get_process))
        .with_permission(perm::PROCESSES_READ);

    let processes_manage = Router::new()
        .route("/processes", post(processes::create_process))
        .route(
            "/processes/:id",
            put(processes::update_process).delete(processes::deactivate_process),
        )
        .route("/processes/:id/fields", post(processes::add_field))
        .route(
            "/processes/:id/fields/:field_id",
            put(processes::update_field).delete(processes::remove_field),
        )
        .with_permission(perm::PROCESSES_MANAGE);

    let machines_read = Router::new()
        .route("/machines", get(machines::list_machines))
        .route("/machines/:id", get(machines::get_machine))
        .with_permission(perm::MACHINES_READ);

    let machines_manage = Router::new()
        .route("/machines", post(machines::create_machine))
        .route(
            "/machines/:id",
            put(machines::update_machine).delete(machines::deactivate_machine),
        )
        .route(
            "/machines/:id/processes/:process_id",
            put(machines::assign_process)
                .patch(machines::update_process_values)
                .delete(machines::unassign_process),
        )
        .with_permission(perm::MACHINES_MANAGE);

    let users_read = Router::new()
        .route("/users", get(users::list_users))
        .with_permission(perm::USERS_READ);

    let users_manage = Router::new()
        .route("/users", post(users::create_user))
        .route("/users/:id", delete(users::deactivate_user))
        .with_permission(perm::USERS_MANAGE);

    Router::new()
        .merge(companies_read)
        .merge(companies_manage)
        .merge(clients_read)
        .merge(clients_manage)
        .merge(skus_read)
        .merge(skus_manage)
        .merge(purchase_orders_read)
        .merge(purchase_orders_manage)
        .merge(grns_read)
        .merge(grns_manage)
        .merge(inventory_read)
        .merge(inventory_manage)
        .merge(invoices_read)
        .merge(invoices_manage)
        .merge(payments_read)
        .merge(payments_manage)
        .merge(credit_notes_read)
        .merge(credit_notes_manage)
        .merge(processes_read)
        .merge(processes_manage)
        .merge(machines_read)
        .merge(machines_manage)
        .merge(users_read)
        .merge(users_manage)
}

/// The full application: `/api/v1`, `/auth`, health, metrics and Swagger UI,
/// with request ids and auth service injection applied. Transport layers
/// (CORS, compression, tracing) are added by the binary.
pub fn app_router(state: AppState, auth_service: Arc<AuthService>) -> Router {
    let health = health::health_routes(state.db.clone(), &state.config.environment);

    Router::new()
        .route("/metrics", get(metrics::metrics_handler))
        .merge(health)
        .nest("/api/v1", api_v1_routes().with_state(state))
        .nest("/auth", auth::auth_routes().with_state(auth_service.clone()))
        .merge(openapi::swagger_ui())
        .layer(axum::middleware::from_fn_with_state(
            auth_service,
            auth::inject_auth_service,
        ))
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}
