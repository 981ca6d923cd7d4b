//! Business services used by the HTTP handlers.
//!
//! Plain CRUD lives here; anything that has to change several tables
//! atomically is delegated to a [`crate::commands::Command`].

use sea_orm::{
    sea_query::{Expr, Func, IntoColumnRef, SimpleExpr},
    EntityTrait, FromQueryResult, PaginatorTrait, Select,
};
use serde::Serialize;

use crate::{db::DbPool, errors::ServiceError};

pub mod clients;
pub mod companies;
pub mod credit_notes;
pub mod grns;
pub mod inventory;
pub mod invoices;
pub mod machines;
pub mod payments;
pub mod processes;
pub mod purchase_orders;
pub mod skus;
pub mod users;

/// One page of a list query.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            0
        } else {
            (self.total + self.limit - 1) / self.limit
        }
    }
}

/// Runs `query` through sea-orm's paginator. `page` is 1-based.
pub(crate) async fn fetch_page<E>(
    db: &DbPool,
    query: Select<E>,
    page: u64,
    limit: u64,
) -> Result<Page<E::Model>, ServiceError>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Sized + Send + Sync,
{
    let page = page.max(1);
    let limit = limit.max(1);
    let paginator = query.paginate(db, limit);
    let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
    let items = paginator
        .fetch_page(page - 1)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(Page {
        items,
        total,
        page,
        limit,
    })
}

/// Case-insensitive substring match on `column`.
pub(crate) fn contains_ci<C: IntoColumnRef>(column: C, term: &str) -> SimpleExpr {
    let pattern = format!("%{}%", term.trim().to_lowercase());
    Expr::expr(Func::lower(Expr::col(column))).like(pattern)
}

/// `Some(trimmed)` unless the value is blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let page = Page::<u8> {
            items: vec![],
            total: 41,
            page: 1,
            limit: 20,
        };
        assert_eq!(page.total_pages(), 3);
        assert_eq!(Page::<u8> { total: 0, ..page }.total_pages(), 0);
    }

    #[test]
    fn blank_strings_become_none() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" GST ".into())), Some("GST".into()));
        assert_eq!(non_blank(None), None);
    }
}
