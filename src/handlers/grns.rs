use crate::{
    auth::AuthUser,
    commands::grns::{CreateGrnCommand, GrnWithItems, UpdateGrnItemsCommand},
    handlers::common::{created, AppJson, CreatedResult, PageQuery},
    models::grn,
    services::grns::GrnFilter,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v1/grns",
    params(PageQuery, GrnFilter),
    responses((status = 200, description = "Page of GRNs")),
    security(("bearer_auth" = [])),
    tag = "grns"
)]
pub async fn list_grns(
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(filter): Query<GrnFilter>,
) -> ApiResult<PaginatedResponse<grn::Model>> {
    let (page, limit) = paging.resolve(&state.config);
    let grns = state.services.grns.list_grns(filter, page, limit).await?;
    Ok(Json(ApiResponse::success(grns.into())))
}

/// Post a GRN. Accepted quantities go straight into stock.
#[utoipa::path(
    post,
    path = "/api/v1/grns",
    request_body = CreateGrnCommand,
    responses(
        (status = 201, description = "GRN posted", body = GrnWithItems),
        (status = 400, description = "Invalid lines or purchase order not receivable", body = crate::errors::ErrorResponse),
        (status = 409, description = "Accepted quantity would exceed the ordered quantity", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "grns"
)]
pub async fn create_grn(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateGrnCommand>,
) -> CreatedResult<GrnWithItems> {
    let grn = state
        .services
        .grns
        .create_grn(payload, Some(user.user_id))
        .await?;
    Ok(created(grn))
}

#[utoipa::path(
    get,
    path = "/api/v1/grns/{id}",
    params(("id" = Uuid, Path, description = "GRN id")),
    responses(
        (status = 200, description = "GRN with items", body = GrnWithItems),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "grns"
)]
pub async fn get_grn(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<GrnWithItems> {
    let grn = state.services.grns.get_grn(id).await?;
    Ok(Json(ApiResponse::success(grn)))
}

/// Replace the GRN lines; stock moves by the per-SKU difference.
#[utoipa::path(
    put,
    path = "/api/v1/grns/{id}/items",
    params(("id" = Uuid, Path, description = "GRN id")),
    request_body = UpdateGrnItemsCommand,
    responses(
        (status = 200, description = "GRN lines replaced", body = GrnWithItems),
        (status = 409, description = "Accepted quantity would exceed the ordered quantity", body = crate::errors::ErrorResponse),
        (status = 422, description = "Received stock was already consumed", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "grns"
)]
pub async fn update_grn_items(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateGrnItemsCommand>,
) -> ApiResult<GrnWithItems> {
    let grn = state
        .services
        .grns
        .update_grn_items(id, payload, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(grn)))
}

/// Cancel a GRN and take its accepted goods back out of stock.
#[utoipa::path(
    delete,
    path = "/api/v1/grns/{id}",
    params(("id" = Uuid, Path, description = "GRN id")),
    responses(
        (status = 200, description = "GRN cancelled"),
        (status = 422, description = "Received stock was already consumed", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "grns"
)]
pub async fn cancel_grn(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<grn::Model> {
    let grn = state
        .services
        .grns
        .cancel_grn(id, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(grn)))
}
