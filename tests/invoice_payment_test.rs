mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{dec, id_of, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

struct Billing {
    app: TestApp,
    company_id: Uuid,
    client_id: Uuid,
}

impl Billing {
    async fn new() -> Self {
        let app = TestApp::new().await;
        let company_id = app.create_company("Mahalaxmi Corrugators").await;
        let client_id = app.create_client(company_id, "Nestle India").await;
        Self {
            app,
            company_id,
            client_id,
        }
    }

    /// 4 boxes at 250.00 with 18% tax: 1000.00 + 180.00.
    async fn invoice(&self) -> Value {
        let (status, body) = self
            .app
            .post(
                "/api/v1/invoices",
                json!({
                    "company_id": self.company_id,
                    "client_id": self.client_id,
                    "tax_rate": "18",
                    "items": [{ "description": "7 ply heavy duty box", "quantity": 4, "rate": "250.00" }],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }

    async fn pay(&self, invoice_id: Uuid, amount: &str) -> (StatusCode, Value) {
        self.app
            .post(
                &format!("/api/v1/invoices/{invoice_id}/payments"),
                json!({ "amount": amount, "payment_method": "bank_transfer", "reference_number": "UTR123" }),
            )
            .await
    }

    async fn fetch(&self, invoice_id: Uuid) -> Value {
        let (status, body) = self
            .app
            .get(&format!("/api/v1/invoices/{invoice_id}"))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"].clone()
    }
}

#[tokio::test]
async fn invoice_totals_include_tax() {
    let billing = Billing::new().await;
    let invoice = billing.invoice().await;

    assert_eq!(invoice["invoice_number"], "INV-00001");
    assert_eq!(dec(&invoice["sub_total"]), dec!(1000));
    assert_eq!(dec(&invoice["tax_amount"]), dec!(180));
    assert_eq!(dec(&invoice["total_amount"]), dec!(1180));
    assert_eq!(dec(&invoice["balance_amount"]), dec!(1180));
    assert_eq!(invoice["payment_status"], "unpaid");
    assert_eq!(invoice["items"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn invoice_needs_items_and_a_sane_due_date() {
    let billing = Billing::new().await;

    let (status, _) = billing
        .app
        .post(
            "/api/v1/invoices",
            json!({ "company_id": billing.company_id, "client_id": billing.client_id, "items": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let today = Utc::now().date_naive();
    let (status, _) = billing
        .app
        .post(
            "/api/v1/invoices",
            json!({
                "company_id": billing.company_id,
                "client_id": billing.client_id,
                "invoice_date": today,
                "due_date": today - Duration::days(1),
                "items": [{ "description": "box", "quantity": 1, "rate": "10.00" }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn payments_move_invoice_through_statuses() {
    let billing = Billing::new().await;
    let invoice_id = id_of(&billing.invoice().await);

    let (status, body) = billing.pay(invoice_id, "500.00").await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["invoice"]["payment_status"], "partially_paid");
    assert_eq!(dec(&body["data"]["invoice"]["balance_amount"]), dec!(680));
    assert_eq!(body["data"]["payment"]["payment_method"], "bank_transfer");

    let (status, body) = billing.pay(invoice_id, "680.00").await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["invoice"]["payment_status"], "paid");
    assert_eq!(dec(&body["data"]["invoice"]["paid_amount"]), dec!(1180));

    let (status, body) = billing
        .app
        .get(&format!("/api/v1/invoices/{invoice_id}/payments"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn overpayment_is_refused() {
    let billing = Billing::new().await;
    let invoice_id = id_of(&billing.invoice().await);

    let (status, body) = billing.pay(invoice_id, "1180.01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = billing.pay(invoice_id, "0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let invoice = billing.fetch(invoice_id).await;
    assert_eq!(dec(&invoice["paid_amount"]), dec!(0));
}

#[tokio::test]
async fn credit_note_settles_the_remaining_balance() {
    let billing = Billing::new().await;
    let invoice_id = id_of(&billing.invoice().await);
    billing.pay(invoice_id, "1000.00").await;

    let (status, body) = billing
        .app
        .post(
            "/api/v1/credit-notes",
            json!({ "invoice_id": invoice_id, "amount": "180.00", "reason": "damaged in transit" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["credit_note"]["credit_note_number"], "CN-00001");
    assert_eq!(body["data"]["invoice"]["payment_status"], "paid");
    assert_eq!(dec(&body["data"]["invoice"]["credited_amount"]), dec!(180));
    assert_eq!(dec(&body["data"]["invoice"]["balance_amount"]), dec!(0));

    let (status, _) = billing
        .app
        .post(
            "/api/v1/credit-notes",
            json!({ "invoice_id": invoice_id, "amount": "1.00" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancelling_a_credit_note_reopens_the_balance() {
    let billing = Billing::new().await;
    let invoice_id = id_of(&billing.invoice().await);

    let (_, body) = billing
        .app
        .post(
            "/api/v1/credit-notes",
            json!({ "invoice_id": invoice_id, "amount": "100.00" }),
        )
        .await;
    let note_id = id_of(&body["data"]["credit_note"]);

    let (status, body) = billing
        .app
        .delete(&format!("/api/v1/credit-notes/{note_id}"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(dec(&body["data"]["invoice"]["balance_amount"]), dec!(1180));
    assert_eq!(body["data"]["invoice"]["payment_status"], "unpaid");
}

#[tokio::test]
async fn reversing_a_payment_restores_the_balance() {
    let billing = Billing::new().await;
    let invoice_id = id_of(&billing.invoice().await);
    let (_, body) = billing.pay(invoice_id, "1180.00").await;
    let payment_id = id_of(&body["data"]["payment"]);

    let (status, body) = billing
        .app
        .delete(&format!("/api/v1/payments/{payment_id}"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["payment"]["status"], "inactive");
    assert_eq!(body["data"]["invoice"]["payment_status"], "unpaid");
    assert_eq!(dec(&body["data"]["invoice"]["balance_amount"]), dec!(1180));

    let (status, _) = billing
        .app
        .delete(&format!("/api/v1/payments/{payment_id}"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invoice_with_payments_cannot_be_cancelled() {
    let billing = Billing::new().await;
    let invoice_id = id_of(&billing.invoice().await);
    let (_, body) = billing.pay(invoice_id, "100.00").await;
    let payment_id = id_of(&body["data"]["payment"]);

    let (status, body) = billing
        .app
        .delete(&format!("/api/v1/invoices/{invoice_id}"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    billing
        .app
        .delete(&format!("/api/v1/payments/{payment_id}"))
        .await;
    let (status, body) = billing
        .app
        .delete(&format!("/api/v1/invoices/{invoice_id}"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "inactive");

    let (status, _) = billing.pay(invoice_id, "10.00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn overdue_filter_only_returns_unpaid_past_due_invoices() {
    let billing = Billing::new().await;
    let today = Utc::now().date_naive();

    let mut ids = Vec::new();
    for due in [today - Duration::days(10), today + Duration::days(10)] {
        let (status, body) = billing
            .app
            .post(
                "/api/v1/invoices",
                json!({
                    "company_id": billing.company_id,
                    "client_id": billing.client_id,
                    "invoice_date": today - Duration::days(40),
                    "due_date": due,
                    "items": [{ "description": "die-cut tray", "quantity": 10, "rate": "12.50" }],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        ids.push(id_of(&body["data"]));
    }

    let (status, body) = billing
        .app
        .get(&format!(
            "/api/v1/invoices?client_id={}&overdue_only=true",
            billing.client_id
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let items = body["data"]["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(id_of(&items[0]), ids[0]);

    billing.pay(ids[0], "125.00").await;
    let (_, body) = billing
        .app
        .get(&format!(
            "/api/v1/invoices?client_id={}&overdue_only=true",
            billing.client_id
        ))
        .await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn credit_note_cannot_exceed_the_balance() {
    let billing = Billing::new().await;
    let invoice_id = id_of(&billing.invoice().await);
    billing.pay(invoice_id, "1100.00").await;

    let (status, body) = billing
        .app
        .post(
            "/api/v1/credit-notes",
            json!({ "invoice_id": invoice_id, "amount": "80.01", "reason": "rate revision" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let message = body["message"].as_str().expect("message");
    assert!(message.contains("exceeds outstanding balance"), "{message}");

    let invoice = billing.fetch(invoice_id).await;
    assert_eq!(dec(&invoice["credited_amount"]), dec!(0));
    assert_eq!(dec(&invoice["balance_amount"]), dec!(80));
}

#[tokio::test]
async fn oversized_invoice_lines_are_rejected_without_using_a_number() {
    let billing = Billing::new().await;
    let (status, body) = billing
        .app
        .post(
            "/api/v1/invoices",
            json!({
                "company_id": billing.company_id,
                "client_id": billing.client_id,
                "items": [{ "description": "jumbo box", "quantity": 1000, "rate": "79228162514264337593543950335" }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let invoice = billing.invoice().await;
    assert_eq!(invoice["invoice_number"], "INV-00001");
}
