use crate::{
    commands::{
        processes::{
            assignments, check_field_value, lock_process, normalize_options, option_strings,
            process_field, stored_values,
        },
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender, FieldChange},
    metrics,
    models::{process_field as field_entity, FieldType},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Changes the label, required flag, options or position of a field.
/// The key and type are fixed once created.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProcessFieldCommand {
    #[serde(skip)]
    pub process_id: Uuid,
    #[serde(skip)]
    pub field_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub label: Option<String>,
    pub required: Option<bool>,
    pub options: Option<Vec<String>>,
    pub position: Option<i32>,
}

#[async_trait::async_trait]
impl Command for UpdateProcessFieldCommand {
    type Result = field_entity::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(process_id = %self.process_id, field_id = %self.field_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let field = self.update_in_db(db_pool.as_ref()).await.map_err(|e| {
            metrics::record_failure("update_process_field", &e);
            e
        })?;

        info!(field_key = %field.field_key, "process field updated");
        event_sender
            .send_or_log(Event::ProcessFieldChanged {
                process_id: field.process_id,
                field_key: field.field_key.clone(),
                change: FieldChange::Updated,
                machines_touched: 0,
            })
            .await;

        Ok(field)
    }
}

impl UpdateProcessFieldCommand {
    async fn update_in_db(&self, db: &DbPool) -> Result<field_entity::Model, ServiceError> {
        self.validate()?;

        let command = self.clone();
        db.transaction::<_, field_entity::Model, ServiceError>(|txn| {
            Box::pin(async move {
                let process = lock_process(txn, command.process_id).await?;
                let field = process_field(txn, process.id, command.field_id).await?;
                let assigned = assignments(txn, process.id).await?;

                let options = match command.options.clone() {
                    Some(options) => {
                        if field.field_type != FieldType::Select {
                            return Err(ServiceError::ValidationError(format!(
                                "options are only allowed on select fields, not {}",
                                field.field_type
                            )));
                        }
                        normalize_options(FieldType::Select, Some(options))?
                    }
                    None => field.options.clone(),
                };
                let option_list = option_strings(options.as_ref());
                let required = command.required.unwrap_or(field.required);

                for assignment in &assigned {
                    let values = stored_values(assignment);
                    match values.get(&field.field_key) {
                        None | Some(Value::Null) if required && !field.required => {
                            return Err(ServiceError::InvalidOperation(format!(
                                "machine {} has no value for '{}'; it cannot become required",
                                assignment.machine_id, field.field_key
                            )));
                        }
                        Some(value) if command.options.is_some() && !value.is_null() => {
                            check_field_value(field.field_type, &option_list, value).map_err(
                                |msg| {
                                    ServiceError::InvalidOperation(format!(
                                        "machine {} stores a value for '{}' outside the new options: {}",
                                        assignment.machine_id, field.field_key, msg
                                    ))
                                },
                            )?;
                        }
                        _ => {}
                    }
                }

                let mut active: field_entity::ActiveModel = field.into();
                if let Some(label) = &command.label {
                    active.label = Set(label.trim().to_string());
                }
                if let Some(position) = command.position {
                    active.position = Set(position);
                }
                active.required = Set(required);
                active.options = Set(options);
                active.updated_at = Set(Utc::now());
                active.update(txn).await.map_err(ServiceError::db_error)
            })
        })
        .await
        .map_err(ServiceError::from)
    }
}
