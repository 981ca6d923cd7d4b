use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "PackWorkX API",
        version = "1.0.0",
        description = r#"
# PackWorkX API

Back office for corrugated-box manufacturers: companies and their clients,
box SKUs, purchase orders, goods-received notes, stock, work-order invoices
with partial payments and credit notes, and machine/process configuration.

## Authentication

Exchange an email and password at `POST /auth/login` for a bearer token:

```
Authorization: Bearer <your-jwt-token>
```

## Responses

Successful calls return `{ "success": true, "data": ..., "meta": { "request_id", "timestamp" } }`.
Errors return `{ "error", "message", "request_id", "timestamp" }`.

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20, max 100).
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local development")),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login"),
        (name = "companies", description = "Manufacturing companies"),
        (name = "clients", description = "Customers of a company"),
        (name = "skus", description = "Box specifications"),
        (name = "purchase-orders", description = "Inbound purchase orders"),
        (name = "grns", description = "Goods-received notes"),
        (name = "inventory", description = "Stock levels and movements"),
        (name = "invoices", description = "Work-order invoices"),
        (name = "payments", description = "Partial payments against invoices"),
        (name = "credit-notes", description = "Credit notes against invoices"),
        (name = "processes", description = "Production processes and their dynamic fields"),
        (name = "machines", description = "Machines and their process settings"),
        (name = "users", description = "User administration"),
        (name = "health", description = "Health and status")
    ),
    paths(
        crate::auth::login_handler,
        crate::health::health_check,
        crate::health::status,

        crate::handlers::companies::list_companies,
        crate::handlers::companies::create_company,
        crate::handlers::companies::get_company,
        crate::handlers::companies::update_company,
        crate::handlers::companies::deactivate_company,
        crate::handlers::companies::activate_company,

        crate::handlers::clients::list_clients,
        crate::handlers::clients::create_client,
        crate::handlers::clients::get_client,
        crate::handlers::clients::update_client,
        crate::handlers::clients::deactivate_client,
        crate::handlers::clients::activate_client,
        crate::handlers::clients::client_statement,

        crate::handlers::skus::list_skus,
        crate::handlers::skus::create_sku,
        crate::handlers::skus::get_sku,
        crate::handlers::skus::update_sku,
        crate::handlers::skus::deactivate_sku,

        crate::handlers::purchase_orders::list_purchase_orders,
        crate::handlers::purchase_orders::create_purchase_order,
        crate::handlers::purchase_orders::get_purchase_order,
        crate::handlers::purchase_orders::update_purchase_order,
        crate::handlers::purchase_orders::deactivate_purchase_order,
        crate::handlers::purchase_orders::cancel_purchase_order,
        crate::handlers::purchase_orders::receipt_summary,

        crate::handlers::grns::list_grns,
        crate::handlers::grns::create_grn,
        crate::handlers::grns::get_grn,
        crate::handlers::grns::update_grn_items,
        crate::handlers::grns::cancel_grn,

        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::low_stock,
        crate::handlers::inventory::get_inventory,
        crate::handlers::inventory::inventory_history,
        crate::handlers::inventory::adjust_inventory,
        crate::handlers::inventory::set_reorder_level,

        crate::handlers::invoices::list_invoices,
        crate::handlers::invoices::create_invoice,
        crate::handlers::invoices::get_invoice,
        crate::handlers::invoices::cancel_invoice,
        crate::handlers::invoices::list_payments,
        crate::handlers::invoices::record_payment,
        crate::handlers::invoices::reverse_payment,

        crate::handlers::credit_notes::list_credit_notes,
        crate::handlers::credit_notes::issue_credit_note,
        crate::handlers::credit_notes::get_credit_note,
        crate::handlers::credit_notes::cancel_credit_note,

        crate::handlers::processes::list_processes,
        crate::handlers::processes::create_process,
        crate::handlers::processes::get_process,
        crate::handlers::processes::update_process,
        crate::handlers::processes::deactivate_process,
        crate::handlers::processes::add_field,
        crate::handlers::processes::update_field,
        crate::handlers::processes::remove_field,

        crate::handlers::machines::list_machines,
        crate::handlers::machines::create_machine,
        crate::handlers::machines::get_machine,
        crate::handlers::machines::update_machine,
        crate::handlers::machines::deactivate_machine,
        crate::handlers::machines::assign_process,
        crate::handlers::machines::update_process_values,
        crate::handlers::machines::unassign_process,

        crate::handlers::users::list_users,
        crate::handlers::users::create_user,
        crate::handlers::users::deactivate_user,
    ),
    components(
        schemas(
            crate::models::RecordStatus,
            crate::models::PoStatus,
            crate::models::PaymentStatus,
            crate::models::PaymentMethod,
            crate::models::FieldType,
            crate::models::ReferenceType,
            crate::models::UserRole,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_core_routes() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("PackWorkX API"));
        assert!(json.contains("/api/v1/grns"));
        assert!(json.contains("/api/v1/invoices/{id}/payments"));
        assert!(json.contains("bearer_auth"));
    }
}
