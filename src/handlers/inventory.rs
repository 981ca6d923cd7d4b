use crate::{
    auth::AuthUser,
    commands::inventory::{AdjustInventoryCommand, AdjustInventoryResult},
    handlers::common::{AppJson, PageQuery},
    models::{inventory, inventory_transaction},
    services::inventory::{InventoryFilter, SetReorderLevelRequest},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockQuery {
    pub company_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(PageQuery, InventoryFilter),
    responses((status = 200, description = "Page of stock records")),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(filter): Query<InventoryFilter>,
) -> ApiResult<PaginatedResponse<inventory::Model>> {
    let (page, limit) = paging.resolve(&state.config);
    let records = state
        .services
        .inventory
        .list_inventory(filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(records.into())))
}

/// Records at or below their reorder level.
#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    params(LowStockQuery),
    responses((status = 200, description = "Low stock records")),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<LowStockQuery>,
) -> ApiResult<Vec<inventory::Model>> {
    let records = state.services.inventory.low_stock(query.company_id).await?;
    Ok(Json(ApiResponse::success(records)))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    params(("id" = Uuid, Path, description = "Inventory record id")),
    responses(
        (status = 200, description = "Stock record"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<inventory::Model> {
    let record = state.services.inventory.get_inventory(id).await?;
    Ok(Json(ApiResponse::success(record)))
}

/// Ledger of stock movements, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}/history",
    params(("id" = Uuid, Path, description = "Inventory record id"), PageQuery),
    responses((status = 200, description = "Page of stock movements")),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn inventory_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(paging): Query<PageQuery>,
) -> ApiResult<PaginatedResponse<inventory_transaction::Model>> {
    let (page, limit) = paging.resolve(&state.config);
    let history = state.services.inventory.history(id, page, limit).await?;
    Ok(Json(ApiResponse::success(history.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/adjust",
    request_body = AdjustInventoryCommand,
    responses(
        (status = 200, description = "Stock adjusted", body = AdjustInventoryResult),
        (status = 422, description = "Adjustment would make stock negative", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<AdjustInventoryCommand>,
) -> ApiResult<AdjustInventoryResult> {
    let result = state
        .services
        .inventory
        .adjust_inventory(payload, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

#[utoipa::path(
    put,
    path = "/api/v1/inventory/{id}/reorder-level",
    params(("id" = Uuid, Path, description = "Inventory record id")),
    request_body = SetReorderLevelRequest,
    responses((status = 200, description = "Reorder level updated")),
    security(("bearer_auth" = [])),
    tag = "inventory"
)]
pub async fn set_reorder_level(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<SetReorderLevelRequest>,
) -> ApiResult<inventory::Model> {
    let record = state
        .services
        .inventory
        .set_reorder_level(id, payload)
        .await?;
    Ok(Json(ApiResponse::success(record)))
}
