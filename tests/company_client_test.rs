mod common;

use axum::http::StatusCode;
use common::{dec, id_of, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn company_names_are_unique_ignoring_case() {
    let app = TestApp::new().await;
    app.create_company("Shree Corrugators").await;

    let (status, body) = app
        .post("/api/v1/companies", json!({ "name": "SHREE corrugators" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["error"], "Conflict");
}

#[tokio::test]
async fn company_can_be_deactivated_and_reactivated() {
    let app = TestApp::new().await;
    let company_id = app.create_company("Balaji Packaging").await;

    let (status, body) = app
        .delete(&format!("/api/v1/companies/{company_id}"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "inactive");

    let (status, body) = app
        .post(
            &format!("/api/v1/companies/{company_id}/activate"),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "active");
}

#[tokio::test]
async fn invalid_company_payload_is_rejected() {
    let app = TestApp::new().await;

    let (status, _) = app.post("/api/v1/companies", json!({ "name": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post("/api/v1/companies", json!({ "legal_name": "No Name Pvt Ltd" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn clients_get_sequential_codes_per_company() {
    let app = TestApp::new().await;
    let company_id = app.create_company("Ganesh Boxes").await;

    let (status, first) = app
        .post(
            "/api/v1/clients",
            json!({ "company_id": company_id, "name": "Amul Dairy", "credit_limit": "50000.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    assert_eq!(first["success"], true);
    assert_eq!(first["data"]["client_code"], "CLI-00001");
    assert_eq!(dec(&first["data"]["credit_limit"]), dec!(50000));

    let (_, second) = app
        .post(
            "/api/v1/clients",
            json!({ "company_id": company_id, "name": "Haldiram Snacks" }),
        )
        .await;
    assert_eq!(second["data"]["client_code"], "CLI-00002");
}

#[tokio::test]
async fn client_for_unknown_company_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app
        .post(
            "/api/v1/clients",
            json!({ "company_id": uuid::Uuid::new_v4(), "name": "Orphan" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn client_list_filters_by_company_and_search() {
    let app = TestApp::new().await;
    let company_a = app.create_company("Alpha Cartons").await;
    let company_b = app.create_company("Beta Cartons").await;
    app.create_client(company_a, "Parle Biscuits").await;
    app.create_client(company_a, "Britannia").await;
    app.create_client(company_b, "Parle Agro").await;

    let (status, body) = app
        .get(&format!("/api/v1/clients?company_id={company_a}&search=parle"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let items = body["data"]["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Parle Biscuits");
    assert_eq!(body["data"]["total"], 1);

    let (_, body) = app
        .get(&format!("/api/v1/clients?company_id={company_a}&limit=1"))
        .await;
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"]["total_pages"], 2);
}

#[tokio::test]
async fn deactivated_client_drops_out_of_active_listing() {
    let app = TestApp::new().await;
    let company_id = app.create_company("Gamma Packaging").await;
    let client_id = app.create_client(company_id, "Dabur").await;

    let (status, body) = app.delete(&format!("/api/v1/clients/{client_id}")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "inactive");

    let (_, body) = app
        .get(&format!(
            "/api/v1/clients?company_id={company_id}&status=active"
        ))
        .await;
    assert_eq!(body["data"]["total"], 0);

    let (status, body) = app.get(&format!("/api/v1/clients/{client_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(id_of(&body["data"]), client_id);
}

#[tokio::test]
async fn client_statement_sums_open_invoices() {
    let app = TestApp::new().await;
    let company_id = app.create_company("Delta Boxes").await;
    let client_id = app.create_client(company_id, "ITC Foods").await;

    for rate in ["100.00", "250.00"] {
        let (status, body) = app
            .post(
                "/api/v1/invoices",
                json!({
                    "company_id": company_id,
                    "client_id": client_id,
                    "items": [{ "description": "5 ply RSC box", "quantity": 2, "rate": rate }],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (status, body) = app
        .get(&format!("/api/v1/clients/{client_id}/statement"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let statement = &body["data"];
    assert_eq!(statement["client_name"], "ITC Foods");
    assert_eq!(statement["currency"], "INR");
    assert_eq!(statement["invoice_count"], 2);
    assert_eq!(dec(&statement["total_invoiced"]), dec!(700));
    assert_eq!(dec(&statement["outstanding"]), dec!(700));
    assert_eq!(dec(&statement["total_paid"]), dec!(0));
}
