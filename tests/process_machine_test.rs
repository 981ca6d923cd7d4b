mod common;

use axum::http::StatusCode;
use common::{id_of, TestApp};
use serde_json::{json, Value};
use uuid::Uuid;

struct Shop {
    app: TestApp,
    company_id: Uuid,
    process_id: Uuid,
    machine_id: Uuid,
}

impl Shop {
    /// A printing process with a select and a number field, and one machine.
    async fn new() -> Self {
        let app = TestApp::new().await;
        let company_id = app.create_company("Precision Print & Pack").await;

        let (status, body) = app
            .post(
                "/api/v1/processes",
                json!({
                    "company_id": company_id,
                    "process_name": "Flexo Printing",
                    "description": "Two colour flexo on liner",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let process_id = id_of(&body["data"]);

        let shop = Self {
            machine_id: Uuid::nil(),
            app,
            company_id,
            process_id,
        };
        for field in [
            json!({
                "field_key": "ink_colour",
                "label": "Ink colour",
                "field_type": "select",
                "options": ["red", "blue", "black"],
                "required": true,
            }),
            json!({ "field_key": "speed_mpm", "label": "Speed (m/min)", "field_type": "number" }),
        ] {
            let (status, body) = shop.add_field(field).await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
        }

        let (status, body) = shop
            .app
            .post(
                "/api/v1/machines",
                json!({
                    "company_id": company_id,
                    "machine_name": "Flexo Line 1",
                    "machine_code": "FL-01",
                    "capacity_per_hour": "1200",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        Self {
            machine_id: id_of(&body["data"]),
            ..shop
        }
    }

    async fn add_field(&self, field: Value) -> (StatusCode, Value) {
        self.app
            .post(&format!("/api/v1/processes/{}/fields", self.process_id), field)
            .await
    }

    fn assignment_uri(&self) -> String {
        format!(
            "/api/v1/machines/{}/processes/{}",
            self.machine_id, self.process_id
        )
    }

    async fn assign(&self, values: Value) -> (StatusCode, Value) {
        self.app
            .put(&self.assignment_uri(), json!({ "field_values": values }))
            .await
    }

    async fn stored_values(&self) -> Value {
        let (status, body) = self
            .app
            .get(&format!("/api/v1/machines/{}", self.machine_id))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["processes"]
            .as_array()
            .and_then(|processes| {
                processes
                    .iter()
                    .find(|p| p["process_id"] == json!(self.process_id))
            })
            .map(|p| p["field_values"].clone())
            .unwrap_or(Value::Null)
    }
}

#[tokio::test]
async fn process_lists_its_fields_in_position_order() {
    let shop = Shop::new().await;
    let (status, body) = shop
        .app
        .get(&format!("/api/v1/processes/{}", shop.process_id))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["process_name"], "Flexo Printing");
    let keys: Vec<&str> = body["data"]["fields"]
        .as_array()
        .expect("fields")
        .iter()
        .map(|f| f["field_key"].as_str().expect("key"))
        .collect();
    assert_eq!(keys, vec!["ink_colour", "speed_mpm"]);
}

#[tokio::test]
async fn process_names_are_unique_per_company() {
    let shop = Shop::new().await;
    let (status, _) = shop
        .app
        .post(
            "/api/v1/processes",
            json!({ "company_id": shop.company_id, "process_name": "Flexo Printing" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let other = shop.app.create_company("Other Printers").await;
    let (status, _) = shop
        .app
        .post(
            "/api/v1/processes",
            json!({ "company_id": other, "process_name": "Flexo Printing" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn field_definitions_are_validated() {
    let shop = Shop::new().await;

    let (status, _) = shop
        .add_field(json!({ "field_key": "Bad Key", "label": "x", "field_type": "text" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = shop
        .add_field(json!({ "field_key": "flute", "label": "Flute", "field_type": "select" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = shop
        .add_field(json!({ "field_key": "speed_mpm", "label": "Again", "field_type": "number" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn machine_values_must_match_field_types() {
    let shop = Shop::new().await;

    let (status, body) = shop.assign(json!({ "ink_colour": "green" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = shop.assign(json!({ "speed_mpm": 150 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = shop
        .assign(json!({ "ink_colour": "red", "speed_mpm": "fast" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = shop
        .assign(json!({ "ink_colour": "red", "operator": "Suresh" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = shop
        .assign(json!({ "ink_colour": "red", "speed_mpm": 150 }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(
        shop.stored_values().await,
        json!({ "ink_colour": "red", "speed_mpm": 150 })
    );
}

#[tokio::test]
async fn patching_values_needs_an_existing_assignment() {
    let shop = Shop::new().await;
    let uri = shop.assignment_uri();

    let (status, _) = shop
        .app
        .request(
            axum::http::Method::PATCH,
            &uri,
            Some(json!({ "field_values": { "ink_colour": "blue" } })),
            Some(shop.app.token()),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    shop.assign(json!({ "ink_colour": "red" })).await;
    let (status, body) = shop
        .app
        .request(
            axum::http::Method::PATCH,
            &uri,
            Some(json!({ "field_values": { "ink_colour": "blue" } })),
            Some(shop.app.token()),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(shop.stored_values().await["ink_colour"], "blue");

    let (status, _) = shop.app.delete(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shop.stored_values().await, Value::Null);
}

#[tokio::test]
async fn required_field_on_a_process_in_use_needs_a_default() {
    let shop = Shop::new().await;
    shop.assign(json!({ "ink_colour": "black" })).await;

    let (status, body) = shop
        .add_field(json!({
            "field_key": "plate_ref",
            "label": "Plate reference",
            "field_type": "text",
            "required": true,
        }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = shop
        .add_field(json!({
            "field_key": "plate_ref",
            "label": "Plate reference",
            "field_type": "text",
            "required": true,
            "default_value": "PL-000",
        }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(shop.stored_values().await["plate_ref"], "PL-000");
}

#[tokio::test]
async fn optional_field_cannot_become_required_while_machines_lack_it() {
    let shop = Shop::new().await;
    shop.assign(json!({ "ink_colour": "black" })).await;

    let (_, body) = shop
        .app
        .get(&format!("/api/v1/processes/{}", shop.process_id))
        .await;
    let speed_field = body["data"]["fields"]
        .as_array()
        .expect("fields")
        .iter()
        .find(|f| f["field_key"] == "speed_mpm")
        .map(id_of)
        .expect("speed field");

    let (status, body) = shop
        .app
        .put(
            &format!(
                "/api/v1/processes/{}/fields/{}",
                shop.process_id, speed_field
            ),
            json!({ "required": true }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = shop
        .app
        .put(
            &format!(
                "/api/v1/processes/{}/fields/{}",
                shop.process_id, speed_field
            ),
            json!({ "label": "Line speed" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["label"], "Line speed");
}

#[tokio::test]
async fn removing_a_field_strips_it_from_machines() {
    let shop = Shop::new().await;
    shop.assign(json!({ "ink_colour": "blue", "speed_mpm": 90 }))
        .await;

    let (_, body) = shop
        .app
        .get(&format!("/api/v1/processes/{}", shop.process_id))
        .await;
    let speed_field = body["data"]["fields"]
        .as_array()
        .expect("fields")
        .iter()
        .find(|f| f["field_key"] == "speed_mpm")
        .map(id_of)
        .expect("speed field");

    let (status, body) = shop
        .app
        .delete(&format!(
            "/api/v1/processes/{}/fields/{}",
            shop.process_id, speed_field
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(shop.stored_values().await, json!({ "ink_colour": "blue" }));
}

#[tokio::test]
async fn process_from_another_company_cannot_be_assigned() {
    let shop = Shop::new().await;
    let other = shop.app.create_company("Elsewhere Boxes").await;
    let (status, body) = shop
        .app
        .post(
            "/api/v1/machines",
            json!({ "company_id": other, "machine_name": "Die Cutter" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let foreign_machine = id_of(&body["data"]);

    let (status, _) = shop
        .app
        .put(
            &format!(
                "/api/v1/machines/{}/processes/{}",
                foreign_machine, shop.process_id
            ),
            json!({ "field_values": { "ink_colour": "red" } }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn select_options_cannot_drop_a_value_in_use() {
    let shop = Shop::new().await;
    shop.assign(json!({ "ink_colour": "blue" })).await;

    let (_, body) = shop
        .app
        .get(&format!("/api/v1/processes/{}", shop.process_id))
        .await;
    let ink_field = body["data"]["fields"]
        .as_array()
        .expect("fields")
        .iter()
        .find(|f| f["field_key"] == "ink_colour")
        .map(id_of)
        .expect("ink field");
    let uri = format!("/api/v1/processes/{}/fields/{}", shop.process_id, ink_field);

    let (status, body) = shop
        .app
        .put(&uri, json!({ "options": ["red", "black"] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = shop
        .app
        .put(&uri, json!({ "options": ["blue", "green"] }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["options"], json!(["blue", "green"]));
    assert_eq!(shop.stored_values().await, json!({ "ink_colour": "blue" }));
}
