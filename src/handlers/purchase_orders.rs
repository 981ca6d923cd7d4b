use crate::{
    auth::AuthUser,
    commands::purchaseorders::{CreatePurchaseOrderCommand, PurchaseOrderWithItems},
    handlers::common::{created, AppJson, CreatedResult, PageQuery},
    models::purchase_order,
    services::purchase_orders::{PurchaseOrderFilter, ReceiptSummary, UpdatePurchaseOrderRequest},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders",
    params(PageQuery, PurchaseOrderFilter),
    responses((status = 200, description = "Page of purchase orders")),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(filter): Query<PurchaseOrderFilter>,
) -> ApiResult<PaginatedResponse<purchase_order::Model>> {
    let (page, limit) = paging.resolve(&state.config);
    let orders = state
        .services
        .purchase_orders
        .list_purchase_orders(filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(orders.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    request_body = CreatePurchaseOrderCommand,
    responses(
        (status = 201, description = "Purchase order created", body = PurchaseOrderWithItems),
        (status = 400, description = "Invalid lines or foreign SKU", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreatePurchaseOrderCommand>,
) -> CreatedResult<PurchaseOrderWithItems> {
    let order = state
        .services
        .purchase_orders
        .create_purchase_order(payload, Some(user.user_id))
        .await?;
    Ok(created(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Purchase order with items", body = PurchaseOrderWithItems),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<PurchaseOrderWithItems> {
    let order = state.services.purchase_orders.get_purchase_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    put,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    request_body = UpdatePurchaseOrderRequest,
    responses(
        (status = 200, description = "Header updated"),
        (status = 400, description = "Order is no longer open", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn update_purchase_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdatePurchaseOrderRequest>,
) -> ApiResult<purchase_order::Model> {
    let order = state
        .services
        .purchase_orders
        .update_purchase_order(id, payload, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Purchase order deactivated"),
        (status = 400, description = "Active GRNs exist", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn deactivate_purchase_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<purchase_order::Model> {
    let order = state
        .services
        .purchase_orders
        .deactivate_purchase_order(id, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Purchase order cancelled"),
        (status = 400, description = "Active GRNs exist", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn cancel_purchase_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<purchase_order::Model> {
    let order = state
        .services
        .purchase_orders
        .cancel_purchase_order(id, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Ordered, accepted and pending quantity per line.
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}/receipt-summary",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses((status = 200, description = "Receipt summary", body = ReceiptSummary)),
    security(("bearer_auth" = [])),
    tag = "purchase-orders"
)]
pub async fn receipt_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ReceiptSummary> {
    let summary = state.services.purchase_orders.receipt_summary(id).await?;
    Ok(Json(ApiResponse::success(summary)))
}
