use crate::{
    commands::{
        processes::{
            assignments, check_field_value, lock_process, normalize_options, option_strings,
            stored_values,
        },
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender, FieldChange},
    metrics,
    models::{machine_process, process_field, FieldType},
    validation::field_key,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Adds a field definition to a process. A `default_value` is written to
/// every machine that already runs the process.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddProcessFieldCommand {
    #[serde(skip)]
    pub process_id: Uuid,
    #[validate(custom = "field_key")]
    pub field_key: String,
    #[validate(length(min = 1, max = 255))]
    pub label: String,
    pub field_type: FieldType,
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
    pub position: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub default_value: Option<Value>,
}

#[async_trait::async_trait]
impl Command for AddProcessFieldCommand {
    type Result = process_field::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(process_id = %self.process_id, field_key = %self.field_key))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let (field, machines_touched) = self.add_in_db(db_pool.as_ref()).await.map_err(|e| {
            metrics::record_failure("add_process_field", &e);
            e
        })?;

        info!(field_id = %field.id, machines_touched, "process field added");
        event_sender
            .send_or_log(Event::ProcessFieldChanged {
                process_id: field.process_id,
                field_key: field.field_key.clone(),
                change: FieldChange::Added,
                machines_touched,
            })
            .await;

        Ok(field)
    }
}

impl AddProcessFieldCommand {
    async fn add_in_db(&self, db: &DbPool) -> Result<(process_field::Model, usize), ServiceError> {
        self.validate()?;
        let options = normalize_options(self.field_type, self.options.clone())?;
        let default_value = self.default_value.clone().filter(|v| !v.is_null());
        if let Some(value) = &default_value {
            let allowed = option_strings(options.as_ref());
            check_field_value(self.field_type, &allowed, value).map_err(|msg| {
                ServiceError::ValidationError(format!("default_value: {}", msg))
            })?;
        }

        let command = self.clone();
        db.transaction::<_, (process_field::Model, usize), ServiceError>(|txn| {
            Box::pin(async move {
                let process = lock_process(txn, command.process_id).await?;

                let taken = process_field::Entity::find()
                    .filter(process_field::Column::ProcessId.eq(process.id))
                    .filter(process_field::Column::FieldKey.eq(command.field_key.as_str()))
                    .count(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                if taken > 0 {
                    return Err(ServiceError::Conflict(format!(
                        "process {} already has a field '{}'",
                        process.process_name, command.field_key
                    )));
                }

                let assigned = assignments(txn, process.id).await?;
                if command.required && !assigned.is_empty() && default_value.is_none() {
                    return Err(ServiceError::InvalidOperation(format!(
                        "{} machine(s) already run {}; a required field needs a default_value",
                        assigned.len(),
                        process.process_name
                    )));
                }

                let position = match command.position {
                    Some(position) => position,
                    None => process_field::Entity::find()
                        .filter(process_field::Column::ProcessId.eq(process.id))
                        .count(txn)
                        .await
                        .map_err(ServiceError::db_error)? as i32,
                };

                let now = Utc::now();
                let field = process_field::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    process_id: Set(process.id),
                    field_key: Set(command.field_key.clone()),
                    label: Set(command.label.trim().to_string()),
                    field_type: Set(command.field_type),
                    options: Set(options),
                    required: Set(command.required),
                    position: Set(position),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await
                .map_err(ServiceError::db_error)?;

                let mut touched = 0;
                if let Some(value) = default_value {
                    for assignment in assigned {
                        let mut values = stored_values(&assignment);
                        values.insert(field.field_key.clone(), value.clone());
                        let mut active: machine_process::ActiveModel = assignment.into();
                        active.field_values = Set(Value::Object(values));
                        active.updated_at = Set(now);
                        active.update(txn).await.map_err(ServiceError::db_error)?;
                        touched += 1;
                    }
                }

                Ok((field, touched))
            })
        })
        .await
        .map_err(ServiceError::from)
    }
}
