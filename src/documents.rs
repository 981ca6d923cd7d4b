//! Per-company document numbering (`PO-00001`, `INV-00042`, ...).

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
};
use uuid::Uuid;

use crate::{errors::ServiceError, models::id_sequence};

/// Prefixes of the numbered documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr, strum::EnumIter)]
pub enum DocumentPrefix {
    #[strum(serialize = "CLI")]
    Client,
    #[strum(serialize = "SKU")]
    Sku,
    #[strum(serialize = "PO")]
    PurchaseOrder,
    #[strum(serialize = "GRN")]
    Grn,
    #[strum(serialize = "INV")]
    Invoice,
    #[strum(serialize = "CN")]
    CreditNote,
}

pub fn format_document_number(prefix: DocumentPrefix, value: i64, width: usize) -> String {
    format!("{}-{:0width$}", prefix, value, width = width)
}

/// Claims the next number for `(company_id, prefix)`.
///
/// Must run on the caller's transaction: the counter row is bumped with a
/// single `UPDATE ... SET next_value = next_value + 1`, which holds the row
/// lock until commit, and a rollback returns the number.
pub async fn next_document_number<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    prefix: DocumentPrefix,
    width: usize,
) -> Result<String, ServiceError> {
    let bumped = id_sequence::Entity::update_many()
        .col_expr(
            id_sequence::Column::NextValue,
            Expr::col(id_sequence::Column::NextValue).add(1),
        )
        .col_expr(id_sequence::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(id_sequence::Column::CompanyId.eq(company_id))
        .filter(id_sequence::Column::Prefix.eq(prefix.as_ref()))
        .exec(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let value = if bumped.rows_affected == 0 {
        id_sequence::Entity::insert(id_sequence::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company_id),
            prefix: Set(prefix.to_string()),
            next_value: Set(2),
            updated_at: Set(Utc::now()),
        })
        .exec_without_returning(conn)
        .await
        .map_err(ServiceError::db_error)?;
        1
    } else {
        let row = id_sequence::Entity::find()
            .filter(id_sequence::Column::CompanyId.eq(company_id))
            .filter(id_sequence::Column::Prefix.eq(prefix.as_ref()))
            .one(conn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("sequence {} vanished", prefix))
            })?;
        row.next_value - 1
    };

    Ok(format_document_number(prefix, value, width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DocumentPrefix::PurchaseOrder, 1, 5, "PO-00001")]
    #[case(DocumentPrefix::Invoice, 42, 5, "INV-00042")]
    #[case(DocumentPrefix::CreditNote, 7, 3, "CN-007")]
    #[case(DocumentPrefix::Grn, 123456, 5, "GRN-123456")]
    #[case(DocumentPrefix::Client, 9, 4, "CLI-0009")]
    #[case(DocumentPrefix::Sku, 10, 5, "SKU-00010")]
    fn formats_zero_padded_numbers(
        #[case] prefix: DocumentPrefix,
        #[case] value: i64,
        #[case] width: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(format_document_number(prefix, value, width), expected);
    }
}
