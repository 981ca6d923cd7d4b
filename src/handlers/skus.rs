use crate::{
    auth::AuthUser,
    handlers::common::{created, AppJson, CreatedResult, PageQuery},
    models::sku,
    services::skus::{CreateSkuRequest, SkuFilter, UpdateSkuRequest},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v1/skus",
    params(PageQuery, SkuFilter),
    responses((status = 200, description = "Page of SKUs")),
    security(("bearer_auth" = [])),
    tag = "skus"
)]
pub async fn list_skus(
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(filter): Query<SkuFilter>,
) -> ApiResult<PaginatedResponse<sku::Model>> {
    let (page, limit) = paging.resolve(&state.config);
    let skus = state.services.skus.list_skus(filter, page, limit).await?;
    Ok(Json(ApiResponse::success(skus.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/skus",
    request_body = CreateSkuRequest,
    responses(
        (status = 201, description = "SKU created"),
        (status = 400, description = "Invalid dimensions or foreign client", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "skus"
)]
pub async fn create_sku(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateSkuRequest>,
) -> CreatedResult<sku::Model> {
    let sku = state
        .services
        .skus
        .create_sku(payload, Some(user.user_id))
        .await?;
    Ok(created(sku))
}

#[utoipa::path(
    get,
    path = "/api/v1/skus/{id}",
    params(("id" = Uuid, Path, description = "SKU id")),
    responses(
        (status = 200, description = "SKU"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "skus"
)]
pub async fn get_sku(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<sku::Model> {
    let sku = state.services.skus.get_sku(id).await?;
    Ok(Json(ApiResponse::success(sku)))
}

#[utoipa::path(
    put,
    path = "/api/v1/skus/{id}",
    params(("id" = Uuid, Path, description = "SKU id")),
    request_body = UpdateSkuRequest,
    responses((status = 200, description = "SKU updated")),
    security(("bearer_auth" = [])),
    tag = "skus"
)]
pub async fn update_sku(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateSkuRequest>,
) -> ApiResult<sku::Model> {
    let sku = state
        .services
        .skus
        .update_sku(id, payload, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(sku)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/skus/{id}",
    params(("id" = Uuid, Path, description = "SKU id")),
    responses((status = 200, description = "SKU deactivated")),
    security(("bearer_auth" = [])),
    tag = "skus"
)]
pub async fn deactivate_sku(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<sku::Model> {
    let sku = state
        .services
        .skus
        .deactivate_sku(id, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(sku)))
}
