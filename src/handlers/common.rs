use crate::{
    config::AppConfig, errors::ApiError, errors::ServiceError, services::Page, ApiResponse,
    PaginatedResponse,
};
use axum::{extract::FromRequest, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::IntoParams;

/// JSON body extractor whose rejections use the standard error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Result of a create endpoint: 201 plus the usual envelope.
pub type CreatedResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ServiceError>;

pub fn created<T>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// Pagination parameters for list operations
#[derive(Debug, Default, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number (1-indexed)
    pub page: Option<u64>,
    /// Page size, capped by `api_max_page_size`
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn resolve(self, config: &AppConfig) -> (u64, u64) {
        (self.page.unwrap_or(1).max(1), config.page_size(self.limit))
    }
}

impl<T> From<Page<T>> for PaginatedResponse<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "x".repeat(32),
            3600,
            "127.0.0.1".into(),
            8080,
            "development".into(),
        )
    }

    #[test]
    fn page_query_defaults_and_clamps() {
        let cfg = config();
        assert_eq!(PageQuery::default().resolve(&cfg), (1, 20));
        let q = PageQuery {
            page: Some(0),
            limit: Some(10_000),
        };
        assert_eq!(q.resolve(&cfg), (1, 100));
    }

    #[test]
    fn page_converts_to_paginated_response() {
        let page = Page {
            items: vec![1, 2, 3],
            total: 45,
            page: 2,
            limit: 20,
        };
        let resp: PaginatedResponse<i32> = page.into();
        assert_eq!(resp.total_pages, 3);
        assert_eq!(resp.items, vec![1, 2, 3]);
    }
}
