mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{id_of, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

async fn adjust(app: &TestApp, company_id: Uuid, sku_id: Uuid, change: i32) -> (StatusCode, Value) {
    app.post(
        "/api/v1/inventory/adjust",
        json!({
            "company_id": company_id,
            "sku_id": sku_id,
            "quantity_change": change,
            "reason": "cycle count",
        }),
    )
    .await
}

#[tokio::test]
async fn adjustments_create_the_row_and_track_previous_quantity() {
    let app = TestApp::new().await;
    let company_id = app.create_company("Om Packers").await;
    let sku_id = app.create_sku(company_id, "Pizza box 10in").await;

    let (status, body) = adjust(&app, company_id, sku_id, 120).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["previous_quantity"], 0);
    assert_eq!(body["data"]["inventory"]["quantity_on_hand"], 120);
    assert_eq!(body["data"]["transaction"]["quantity_change"], 120);
    assert_eq!(body["data"]["transaction"]["reference_type"], "adjustment");

    let (status, body) = adjust(&app, company_id, sku_id, -45).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["previous_quantity"], 120);
    assert_eq!(body["data"]["inventory"]["quantity_on_hand"], 75);
    assert_eq!(body["data"]["transaction"]["balance_after"], 75);
}

#[tokio::test]
async fn stock_never_goes_negative() {
    let app = TestApp::new().await;
    let company_id = app.create_company("Laxmi Cartons").await;
    let sku_id = app.create_sku(company_id, "Shoe box").await;
    adjust(&app, company_id, sku_id, 10).await;

    let (status, body) = adjust(&app, company_id, sku_id, -11).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");

    let (_, body) = app
        .get(&format!("/api/v1/inventory?sku_id={sku_id}"))
        .await;
    assert_eq!(body["data"]["items"][0]["quantity_on_hand"], 10);
}

#[tokio::test]
async fn zero_change_and_foreign_sku_are_rejected() {
    let app = TestApp::new().await;
    let company_a = app.create_company("North Boxes").await;
    let company_b = app.create_company("South Boxes").await;
    let sku_b = app.create_sku(company_b, "Fruit crate").await;

    let (status, _) = adjust(&app, company_b, sku_b, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = adjust(&app, company_a, sku_b, 5).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn low_stock_lists_rows_at_or_below_reorder_level() {
    let app = TestApp::new().await;
    let company_id = app.create_company("Vishal Corrugated").await;
    let plenty = app.create_sku(company_id, "Master carton").await;
    let scarce = app.create_sku(company_id, "Inner carton").await;

    let (_, body) = adjust(&app, company_id, plenty, 500).await;
    let plenty_row = id_of(&body["data"]["inventory"]);
    let (_, body) = adjust(&app, company_id, scarce, 40).await;
    let scarce_row = id_of(&body["data"]["inventory"]);

    for (row, level) in [(plenty_row, 100), (scarce_row, 50)] {
        let (status, body) = app
            .put(
                &format!("/api/v1/inventory/{row}/reorder-level"),
                json!({ "reorder_level": level }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["reorder_level"], level);
    }

    let (status, body) = app
        .get(&format!("/api/v1/inventory/low-stock?company_id={company_id}"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let rows = body["data"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(id_of(&rows[0]), scarce_row);

    let (_, body) = app
        .get(&format!(
            "/api/v1/inventory?company_id={company_id}&low_stock_only=true"
        ))
        .await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn negative_reorder_level_is_rejected() {
    let app = TestApp::new().await;
    let company_id = app.create_company("Kiran Packaging").await;
    let sku_id = app.create_sku(company_id, "Bottle divider").await;
    let (_, body) = adjust(&app, company_id, sku_id, 5).await;
    let row = id_of(&body["data"]["inventory"]);

    let (status, _) = app
        .put(
            &format!("/api/v1/inventory/{row}/reorder-level"),
            json!({ "reorder_level": -1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn history_is_newest_first() {
    let app = TestApp::new().await;
    let company_id = app.create_company("Sunrise Boxes").await;
    let sku_id = app.create_sku(company_id, "Tray").await;

    let mut row = None;
    for change in [30, -10, 5] {
        let (status, body) = adjust(&app, company_id, sku_id, change).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        row = Some(id_of(&body["data"]["inventory"]));
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let row = row.expect("inventory row");

    let (status, body) = app
        .get(&format!("/api/v1/inventory/{row}/history"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let balances: Vec<i64> = body["data"]["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|entry| entry["balance_after"].as_i64().expect("balance"))
        .collect();
    assert_eq!(balances, vec![25, 20, 30]);
}

#[tokio::test]
async fn unknown_inventory_row_is_not_found() {
    let app = TestApp::new().await;
    let (status, body) = app
        .get(&format!("/api/v1/inventory/{}", Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn inventory_is_addressable_by_company_and_sku() {
    let app = TestApp::new().await;
    let company_id = app.create_company("Lookup Cartons").await;
    let sku_id = app.create_sku(company_id, "Gift box").await;
    let inventory = &app.state.services.inventory;

    assert!(inventory.get_by_sku(company_id, sku_id).await.is_err());

    let (_, body) = adjust(&app, company_id, sku_id, 7).await;
    let row = inventory
        .get_by_sku(company_id, sku_id)
        .await
        .expect("row after first adjustment");
    assert_eq!(row.id, id_of(&body["data"]["inventory"]));
    assert_eq!(row.quantity_on_hand, 7);
}
