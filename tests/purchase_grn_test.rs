mod common;

use axum::http::StatusCode;
use common::{dec, id_of, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

struct Fixture {
    app: TestApp,
    company_id: Uuid,
    sku_a: Uuid,
    sku_b: Uuid,
    po: Value,
}

impl Fixture {
    /// One company, two SKUs and a PO for 100 of A and 50 of B.
    async fn new() -> Self {
        let app = TestApp::new().await;
        let company_id = app.create_company("Sai Corrugation").await;
        let sku_a = app.create_sku(company_id, "3 ply mailer").await;
        let sku_b = app.create_sku(company_id, "5 ply export carton").await;
        let po = app
            .create_purchase_order(company_id, &[(sku_a, 100), (sku_b, 50)])
            .await;
        Self {
            app,
            company_id,
            sku_a,
            sku_b,
            po,
        }
    }

    fn po_id(&self) -> Uuid {
        id_of(&self.po)
    }

    fn line_for(&self, sku_id: Uuid) -> Uuid {
        self.po["items"]
            .as_array()
            .expect("po items")
            .iter()
            .find(|item| item["sku_id"] == json!(sku_id))
            .map(id_of)
            .expect("po line for sku")
    }

    async fn receive(&self, lines: &[(Uuid, i32, i32)]) -> (StatusCode, Value) {
        let items: Vec<Value> = lines
            .iter()
            .map(|(sku_id, accepted, rejected)| {
                json!({
                    "purchase_order_item_id": self.line_for(*sku_id),
                    "received_quantity": accepted + rejected,
                    "accepted_quantity": accepted,
                    "rejected_quantity": rejected,
                })
            })
            .collect();
        self.app
            .post(
                "/api/v1/grns",
                json!({
                    "purchase_order_id": self.po_id(),
                    "received_by": "Ramesh",
                    "vehicle_number": "MH12AB1234",
                    "items": items,
                }),
            )
            .await
    }

    async fn on_hand(&self, sku_id: Uuid) -> i64 {
        let (status, body) = self
            .app
            .get(&format!(
                "/api/v1/inventory?company_id={}&sku_id={}",
                self.company_id, sku_id
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["items"]
            .as_array()
            .and_then(|rows| rows.first())
            .map(|row| row["quantity_on_hand"].as_i64().expect("quantity"))
            .unwrap_or(0)
    }

    async fn po_status(&self) -> String {
        let (_, body) = self
            .app
            .get(&format!("/api/v1/purchase-orders/{}", self.po_id()))
            .await;
        body["data"]["po_status"]
            .as_str()
            .expect("po_status")
            .to_string()
    }
}

#[tokio::test]
async fn purchase_order_gets_number_and_total() {
    let fx = Fixture::new().await;
    assert_eq!(fx.po["po_number"], "PO-00001");
    assert_eq!(fx.po["po_status"], "open");
    // 150 units at 10.00
    assert_eq!(dec(&fx.po["total_amount"]), dec!(1500));
    assert_eq!(fx.po["items"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn purchase_order_needs_at_least_one_line() {
    let app = TestApp::new().await;
    let company_id = app.create_company("Empty Orders Co").await;
    let (status, _) = app
        .post(
            "/api/v1/purchase-orders",
            json!({ "company_id": company_id, "supplier_name": "Kraft Paper Mills", "items": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn partial_receipt_moves_stock_and_status() {
    let fx = Fixture::new().await;

    let (status, body) = fx.receive(&[(fx.sku_a, 60, 5)]).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["grn_number"], "GRN-00001");
    assert_eq!(body["data"]["items"][0]["accepted_quantity"], 60);

    assert_eq!(fx.on_hand(fx.sku_a).await, 60);
    assert_eq!(fx.on_hand(fx.sku_b).await, 0);
    assert_eq!(fx.po_status().await, "partially_received");
}

#[tokio::test]
async fn accepting_more_than_ordered_conflicts() {
    let fx = Fixture::new().await;
    let (status, _) = fx.receive(&[(fx.sku_a, 80, 0)]).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = fx.receive(&[(fx.sku_a, 30, 0)]).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(fx.on_hand(fx.sku_a).await, 80);
}

#[tokio::test]
async fn mismatched_receipt_quantities_are_rejected() {
    let fx = Fixture::new().await;
    let (status, _) = fx
        .app
        .post(
            "/api/v1/grns",
            json!({
                "purchase_order_id": fx.po_id(),
                "items": [{
                    "purchase_order_item_id": fx.line_for(fx.sku_a),
                    "received_quantity": 10,
                    "accepted_quantity": 8,
                    "rejected_quantity": 1,
                }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn receiving_every_line_marks_the_order_received() {
    let fx = Fixture::new().await;
    fx.receive(&[(fx.sku_a, 70, 0)]).await;
    let (status, body) = fx.receive(&[(fx.sku_a, 30, 0), (fx.sku_b, 50, 0)]).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["grn_number"], "GRN-00002");

    assert_eq!(fx.po_status().await, "received");

    let (status, body) = fx
        .app
        .get(&format!(
            "/api/v1/purchase-orders/{}/receipt-summary",
            fx.po_id()
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let lines = body["data"]["lines"].as_array().expect("lines");
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|line| line["pending"] == 0));
}

#[tokio::test]
async fn rejected_goods_stay_pending() {
    let fx = Fixture::new().await;
    fx.receive(&[(fx.sku_b, 40, 4)]).await;

    let (_, body) = fx
        .app
        .get(&format!(
            "/api/v1/purchase-orders/{}/receipt-summary",
            fx.po_id()
        ))
        .await;
    let line_b = body["data"]["lines"]
        .as_array()
        .expect("lines")
        .iter()
        .find(|line| line["sku_id"] == json!(fx.sku_b))
        .cloned()
        .expect("line for sku b");
    assert_eq!(line_b["ordered"], 50);
    assert_eq!(line_b["accepted"], 40);
    assert_eq!(line_b["rejected"], 4);
    assert_eq!(line_b["pending"], 10);
    assert_eq!(fx.on_hand(fx.sku_b).await, 40);
}

#[tokio::test]
async fn cancelling_a_grn_reverts_stock_and_status() {
    let fx = Fixture::new().await;
    let (_, body) = fx.receive(&[(fx.sku_a, 100, 0), (fx.sku_b, 50, 0)]).await;
    let grn_id = id_of(&body["data"]);
    assert_eq!(fx.po_status().await, "received");

    let (status, body) = fx.app.delete(&format!("/api/v1/grns/{grn_id}")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "inactive");

    assert_eq!(fx.on_hand(fx.sku_a).await, 0);
    assert_eq!(fx.on_hand(fx.sku_b).await, 0);
    assert_eq!(fx.po_status().await, "open");

    let (status, _) = fx.app.delete(&format!("/api/v1/grns/{grn_id}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancelling_a_grn_whose_stock_was_consumed_is_refused() {
    let fx = Fixture::new().await;
    let (_, body) = fx.receive(&[(fx.sku_a, 20, 0)]).await;
    let grn_id = id_of(&body["data"]);

    let (status, body) = fx
        .app
        .post(
            "/api/v1/inventory/adjust",
            json!({
                "company_id": fx.company_id,
                "sku_id": fx.sku_a,
                "quantity_change": -15,
                "reason": "issued to production",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = fx.app.delete(&format!("/api/v1/grns/{grn_id}")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(fx.on_hand(fx.sku_a).await, 5);
}

#[tokio::test]
async fn updating_grn_items_applies_the_net_change() {
    let fx = Fixture::new().await;
    let (_, body) = fx.receive(&[(fx.sku_a, 40, 0)]).await;
    let grn_id = id_of(&body["data"]);

    let (status, body) = fx
        .app
        .put(
            &format!("/api/v1/grns/{grn_id}/items"),
            json!({
                "items": [
                    {
                        "purchase_order_item_id": fx.line_for(fx.sku_a),
                        "received_quantity": 30,
                        "accepted_quantity": 25,
                        "rejected_quantity": 5,
                    },
                    {
                        "purchase_order_item_id": fx.line_for(fx.sku_b),
                        "received_quantity": 10,
                        "accepted_quantity": 10,
                        "rejected_quantity": 0,
                    },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(2));

    assert_eq!(fx.on_hand(fx.sku_a).await, 25);
    assert_eq!(fx.on_hand(fx.sku_b).await, 10);
    assert_eq!(fx.po_status().await, "partially_received");
}

#[tokio::test]
async fn purchase_order_with_active_grn_cannot_be_cancelled() {
    let fx = Fixture::new().await;
    fx.receive(&[(fx.sku_a, 10, 0)]).await;

    let (status, body) = fx
        .app
        .post(
            &format!("/api/v1/purchase-orders/{}/cancel", fx.po_id()),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(fx.po_status().await, "partially_received");
}

#[tokio::test]
async fn cancelled_purchase_order_refuses_receipts() {
    let fx = Fixture::new().await;
    let (status, body) = fx
        .app
        .post(
            &format!("/api/v1/purchase-orders/{}/cancel", fx.po_id()),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["po_status"], "cancelled");

    let (status, _) = fx.receive(&[(fx.sku_a, 10, 0)]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn lines_for_the_same_po_item_are_checked_together() {
    let fx = Fixture::new().await;

    let (status, body) = fx.receive(&[(fx.sku_a, 60, 0), (fx.sku_a, 50, 0)]).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(fx.on_hand(fx.sku_a).await, 0);

    // The refused receipt rolled back, so its number is reused.
    let (status, body) = fx.receive(&[(fx.sku_a, 60, 0), (fx.sku_a, 40, 0)]).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["grn_number"], "GRN-00001");
    assert_eq!(fx.on_hand(fx.sku_a).await, 100);
}

#[tokio::test]
async fn oversized_receipt_quantities_are_rejected() {
    let fx = Fixture::new().await;
    let (status, body) = fx
        .app
        .post(
            "/api/v1/grns",
            json!({
                "purchase_order_id": fx.po_id(),
                "items": [{
                    "purchase_order_item_id": fx.line_for(fx.sku_a),
                    "received_quantity": 5,
                    "accepted_quantity": i32::MAX,
                    "rejected_quantity": 1,
                }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn purchase_order_amount_overflow_is_a_validation_error() {
    let fx = Fixture::new().await;
    let (status, body) = fx
        .app
        .post(
            "/api/v1/purchase-orders",
            json!({
                "company_id": fx.company_id,
                "supplier_name": "Kraft Paper Mills",
                "items": [{ "sku_id": fx.sku_a, "quantity": 1000, "rate": "79228162514264337593543950335" }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let po = fx
        .app
        .create_purchase_order(fx.company_id, &[(fx.sku_b, 5)])
        .await;
    assert_eq!(po["po_number"], "PO-00002");
}

#[tokio::test]
async fn grn_edits_are_tagged_in_the_stock_ledger() {
    let fx = Fixture::new().await;
    let (_, body) = fx.receive(&[(fx.sku_a, 40, 0)]).await;
    let grn_id = id_of(&body["data"]);

    let (status, body) = fx
        .app
        .put(
            &format!("/api/v1/grns/{grn_id}/items"),
            json!({
                "items": [{
                    "purchase_order_item_id": fx.line_for(fx.sku_a),
                    "received_quantity": 35,
                    "accepted_quantity": 35,
                    "rejected_quantity": 0,
                }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, body) = fx
        .app
        .get(&format!(
            "/api/v1/inventory?company_id={}&sku_id={}",
            fx.company_id, fx.sku_a
        ))
        .await;
    let row = id_of(&body["data"]["items"][0]);
    let (status, body) = fx
        .app
        .get(&format!("/api/v1/inventory/{row}/history"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let mut movements: Vec<(String, i64)> = body["data"]["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|entry| {
            (
                entry["reference_type"].as_str().expect("reference").to_string(),
                entry["quantity_change"].as_i64().expect("change"),
            )
        })
        .collect();
    movements.sort();
    assert_eq!(
        movements,
        vec![("grn".to_string(), 40), ("grn_update".to_string(), -5)]
    );
}

#[tokio::test]
async fn concurrent_receipts_cannot_overfill_a_line() {
    let fx = Fixture::new().await;

    let lines_first = [(fx.sku_a, 60, 0)];
    let lines_second = [(fx.sku_a, 60, 0)];
    let (first, second) = tokio::join!(fx.receive(&lines_first), fx.receive(&lines_second));
    let mut statuses = vec![first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
    assert_eq!(fx.on_hand(fx.sku_a).await, 60);
}
