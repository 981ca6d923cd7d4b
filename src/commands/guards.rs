//! Existence checks shared by commands and services. Each one loads the row
//! on the caller's connection or transaction and rejects missing or
//! soft-deleted records with `NotFound`.

use sea_orm::{ConnectionTrait, EntityTrait};
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    models::{client, company, sku, RecordStatus},
};

pub async fn active_company<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
) -> Result<company::Model, ServiceError> {
    company::Entity::find_by_id(company_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .filter(|c| c.status == RecordStatus::Active)
        .ok_or_else(|| ServiceError::not_found("Company", company_id))
}

pub async fn active_client<C: ConnectionTrait>(
    conn: &C,
    client_id: Uuid,
) -> Result<client::Model, ServiceError> {
    client::Entity::find_by_id(client_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .filter(|c| c.status == RecordStatus::Active)
        .ok_or_else(|| ServiceError::not_found("Client", client_id))
}

/// An active SKU that belongs to `company_id`.
pub async fn company_sku<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    sku_id: Uuid,
) -> Result<sku::Model, ServiceError> {
    let sku = sku::Entity::find_by_id(sku_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .filter(|s| s.status == RecordStatus::Active)
        .ok_or_else(|| ServiceError::not_found("SKU", sku_id))?;

    if sku.company_id != company_id {
        return Err(ServiceError::ValidationError(format!(
            "SKU {} does not belong to company {}",
            sku_id, company_id
        )));
    }
    Ok(sku)
}

/// An active client that belongs to `company_id`.
pub async fn company_client<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    client_id: Uuid,
) -> Result<client::Model, ServiceError> {
    let client = active_client(conn, client_id).await?;
    if client.company_id != company_id {
        return Err(ServiceError::ValidationError(format!(
            "client {} does not belong to company {}",
            client_id, company_id
        )));
    }
    Ok(client)
}
