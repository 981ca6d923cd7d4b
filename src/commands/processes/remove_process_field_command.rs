use crate::{
    commands::{
        processes::{assignments, lock_process, process_field, stored_values},
        Command,
    },
    db::DbPool,
    errors::ServiceError,
    events::{Event, EventSender, FieldChange},
    metrics,
    models::{machine_process, process_field as field_entity},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ModelTrait, Set, TransactionTrait};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Deletes a field definition and strips its key from every machine.
#[derive(Debug, Clone)]
pub struct RemoveProcessFieldCommand {
    pub process_id: Uuid,
    pub field_id: Uuid,
}

#[async_trait::async_trait]
impl Command for RemoveProcessFieldCommand {
    type Result = field_entity::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(process_id = %self.process_id, field_id = %self.field_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let (field, machines_touched) =
            self.remove_in_db(db_pool.as_ref()).await.map_err(|e| {
                metrics::record_failure("remove_process_field", &e);
                e
            })?;

        info!(field_key = %field.field_key, machines_touched, "process field removed");
        event_sender
            .send_or_log(Event::ProcessFieldChanged {
                process_id: field.process_id,
                field_key: field.field_key.clone(),
                change: FieldChange::Removed,
                machines_touched,
            })
            .await;

        Ok(field)
    }
}

impl RemoveProcessFieldCommand {
    async fn remove_in_db(&self, db: &DbPool) -> Result<(field_entity::Model, usize), ServiceError> {
        let process_id = self.process_id;
        let field_id = self.field_id;

        db.transaction::<_, (field_entity::Model, usize), ServiceError>(|txn| {
            Box::pin(async move {
                let process = lock_process(txn, process_id).await?;
                let field = process_field(txn, process.id, field_id).await?;

                let now = Utc::now();
                let mut touched = 0;
                for assignment in assignments(txn, process.id).await? {
                    let mut values = stored_values(&assignment);
                    if values.remove(&field.field_key).is_none() {
                        continue;
                    }
                    let mut active: machine_process::ActiveModel = assignment.into();
                    active.field_values = Set(Value::Object(values));
                    active.updated_at = Set(now);
                    active.update(txn).await.map_err(ServiceError::db_error)?;
                    touched += 1;
                }

                field
                    .clone()
                    .delete(txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                Ok((field, touched))
            })
        })
        .await
        .map_err(ServiceError::from)
    }
}
