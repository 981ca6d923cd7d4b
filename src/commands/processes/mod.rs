//! Dynamic process fields and the per-machine values stored against them.
//!
//! A machine's `field_values` must stay valid against the current field
//! definitions of the process, so every definition change is checked
//! against (or applied to) the stored values in the same transaction.

use std::collections::HashSet;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    models::{machine_process, process_field, process_name, FieldType, RecordStatus},
};

mod add_process_field_command;
mod remove_process_field_command;
mod update_process_field_command;

pub use add_process_field_command::AddProcessFieldCommand;
pub use remove_process_field_command::RemoveProcessFieldCommand;
pub use update_process_field_command::UpdateProcessFieldCommand;

/// Checks one stored or submitted value against its field definition.
pub fn check_field_value(
    field_type: FieldType,
    options: &[String],
    value: &Value,
) -> Result<(), String> {
    match (field_type, value) {
        (FieldType::Text, Value::String(_)) => Ok(()),
        (FieldType::Number, Value::Number(_)) => Ok(()),
        (FieldType::Boolean, Value::Bool(_)) => Ok(()),
        (FieldType::Select, Value::String(choice)) if options.contains(choice) => Ok(()),
        (FieldType::Select, Value::String(choice)) => Err(format!(
            "'{}' is not one of [{}]",
            choice,
            options.join(", ")
        )),
        (expected, _) => Err(format!("expected a {} value", expected)),
    }
}

/// Validates a machine's values for a process: no unknown keys, every
/// required key present and each value of the declared type.
pub fn validate_field_values(
    fields: &[process_field::Model],
    values: &Map<String, Value>,
) -> Result<(), ServiceError> {
    let mut problems = Vec::new();

    for key in values.keys() {
        if !fields.iter().any(|f| &f.field_key == key) {
            problems.push(format!("{}: unknown field", key));
        }
    }
    for field in fields {
        match values.get(&field.field_key) {
            None | Some(Value::Null) if field.required => {
                problems.push(format!("{}: is required", field.field_key));
            }
            None | Some(Value::Null) => {}
            Some(value) => {
                if let Err(msg) = check_field_value(field.field_type, &field.option_list(), value) {
                    problems.push(format!("{}: {}", field.field_key, msg));
                }
            }
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::ValidationError(problems.join("; ")))
    }
}

/// Select fields need a non-empty list of distinct, non-blank options;
/// other types take none.
pub fn normalize_options(
    field_type: FieldType,
    options: Option<Vec<String>>,
) -> Result<Option<Value>, ServiceError> {
    match (field_type, options) {
        (FieldType::Select, Some(options)) => {
            let options: Vec<String> = options.into_iter().map(|o| o.trim().to_string()).collect();
            let distinct: HashSet<&String> = options.iter().collect();
            if options.is_empty() || options.iter().any(String::is_empty) {
                return Err(ServiceError::ValidationError(
                    "select fields need at least one non-blank option".to_string(),
                ));
            }
            if distinct.len() != options.len() {
                return Err(ServiceError::ValidationError(
                    "select options must be unique".to_string(),
                ));
            }
            Ok(Some(Value::from(options)))
        }
        (FieldType::Select, None) => Err(ServiceError::ValidationError(
            "select fields need options".to_string(),
        )),
        (_, Some(_)) => Err(ServiceError::ValidationError(format!(
            "options are only allowed on select fields, not {}",
            field_type
        ))),
        (_, None) => Ok(None),
    }
}

/// The strings of a stored `options` array.
pub fn option_strings(options: Option<&Value>) -> Vec<String> {
    options
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub async fn active_process<C: ConnectionTrait>(
    conn: &C,
    process_id: Uuid,
) -> Result<process_name::Model, ServiceError> {
    process_name::Entity::find_by_id(process_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .filter(|p| p.status == RecordStatus::Active)
        .ok_or_else(|| ServiceError::not_found("Process", process_id))
}

/// Like [`active_process`], but holds a row lock until the transaction ends.
/// Field definition changes and machine value writes both take it, so a
/// value write never validates against definitions that are being changed.
pub async fn lock_process<C: ConnectionTrait>(
    conn: &C,
    process_id: Uuid,
) -> Result<process_name::Model, ServiceError> {
    process_name::Entity::find_by_id(process_id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .filter(|p| p.status == RecordStatus::Active)
        .ok_or_else(|| ServiceError::not_found("Process", process_id))
}

pub async fn process_fields<C: ConnectionTrait>(
    conn: &C,
    process_id: Uuid,
) -> Result<Vec<process_field::Model>, ServiceError> {
    process_field::Entity::find()
        .filter(process_field::Column::ProcessId.eq(process_id))
        .order_by_asc(process_field::Column::Position)
        .order_by_asc(process_field::Column::FieldKey)
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// The field of `process_id` with id `field_id`.
pub async fn process_field<C: ConnectionTrait>(
    conn: &C,
    process_id: Uuid,
    field_id: Uuid,
) -> Result<process_field::Model, ServiceError> {
    process_field::Entity::find_by_id(field_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .filter(|f| f.process_id == process_id)
        .ok_or_else(|| ServiceError::not_found("Process field", field_id))
}

pub async fn assignments<C: ConnectionTrait>(
    conn: &C,
    process_id: Uuid,
) -> Result<Vec<machine_process::Model>, ServiceError> {
    machine_process::Entity::find()
        .filter(machine_process::Column::ProcessId.eq(process_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)
}

/// The stored values of an assignment as a JSON object.
pub fn stored_values(assignment: &machine_process::Model) -> Map<String, Value> {
    assignment
        .field_values
        .as_object()
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::json;

    fn field(key: &str, field_type: FieldType, required: bool, options: Option<Value>) -> process_field::Model {
        process_field::Model {
            id: Uuid::new_v4(),
            process_id: Uuid::nil(),
            field_key: key.to_string(),
            label: key.to_string(),
            field_type,
            options,
            required,
            position: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn printing_fields() -> Vec<process_field::Model> {
        vec![
            field("colours", FieldType::Number, true, None),
            field("ink", FieldType::Select, false, Some(json!(["water", "uv"]))),
            field("varnish", FieldType::Boolean, false, None),
            field("operator_note", FieldType::Text, false, None),
        ]
    }

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[rstest]
    #[case(json!({"colours": 4, "ink": "uv", "varnish": true, "operator_note": "ok"}), true)]
    #[case(json!({"colours": 2}), true)]
    #[case(json!({"colours": null}), false)]
    #[case(json!({"ink": "water"}), false)]
    #[case(json!({"colours": "4"}), false)]
    #[case(json!({"colours": 4, "ink": "solvent"}), false)]
    #[case(json!({"colours": 4, "varnish": "yes"}), false)]
    #[case(json!({"colours": 4, "speed": 10}), false)]
    fn machine_values(#[case] values: Value, #[case] ok: bool) {
        let result = validate_field_values(&printing_fields(), &as_map(values));
        assert_eq!(result.is_ok(), ok, "{:?}", result);
    }

    #[test]
    fn every_problem_is_reported() {
        let err = validate_field_values(&printing_fields(), &as_map(json!({"ink": 1, "speed": 3})))
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("speed: unknown field"));
        assert!(msg.contains("colours: is required"));
        assert!(msg.contains("ink: expected a select value"));
    }

    #[test]
    fn select_options_are_checked() {
        assert!(normalize_options(FieldType::Select, None).is_err());
        assert!(normalize_options(FieldType::Select, Some(vec![])).is_err());
        assert!(normalize_options(FieldType::Select, Some(vec!["a".into(), "a".into()])).is_err());
        assert!(normalize_options(FieldType::Number, Some(vec!["a".into()])).is_err());
        assert_eq!(
            normalize_options(FieldType::Select, Some(vec![" a ".into(), "b".into()])).unwrap(),
            Some(json!(["a", "b"]))
        );
        assert_eq!(normalize_options(FieldType::Text, None).unwrap(), None);
    }
}
