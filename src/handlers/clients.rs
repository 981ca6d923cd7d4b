use crate::{
    auth::AuthUser,
    handlers::common::{created, AppJson, CreatedResult, PageQuery},
    models::client,
    services::{
        clients::{ClientFilter, CreateClientRequest, UpdateClientRequest},
        invoices::ClientStatement,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v1/clients",
    params(PageQuery, ClientFilter),
    responses((status = 200, description = "Page of clients")),
    security(("bearer_auth" = [])),
    tag = "clients"
)]
pub async fn list_clients(
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(filter): Query<ClientFilter>,
) -> ApiResult<PaginatedResponse<client::Model>> {
    let (page, limit) = paging.resolve(&state.config);
    let clients = state
        .services
        .clients
        .list_clients(filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(clients.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created with its CLI number"),
        (status = 400, description = "Invalid input or inactive company", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "clients"
)]
pub async fn create_client(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateClientRequest>,
) -> CreatedResult<client::Model> {
    let client = state
        .services
        .clients
        .create_client(payload, Some(user.user_id))
        .await?;
    Ok(created(client))
}

#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "clients"
)]
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<client::Model> {
    let client = state.services.clients.get_client(id).await?;
    Ok(Json(ApiResponse::success(client)))
}

#[utoipa::path(
    put,
    path = "/api/v1/clients/{id}",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = UpdateClientRequest,
    responses((status = 200, description = "Client updated")),
    security(("bearer_auth" = [])),
    tag = "clients"
)]
pub async fn update_client(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateClientRequest>,
) -> ApiResult<client::Model> {
    let client = state
        .services
        .clients
        .update_client(id, payload, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(client)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/clients/{id}",
    params(("id" = Uuid, Path, description = "Client id")),
    responses((status = 200, description = "Client deactivated")),
    security(("bearer_auth" = [])),
    tag = "clients"
)]
pub async fn deactivate_client(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<client::Model> {
    let client = state
        .services
        .clients
        .deactivate_client(id, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(client)))
}

#[utoipa::path(
    post,
    path = "/api/v1/clients/{id}/activate",
    params(("id" = Uuid, Path, description = "Client id")),
    responses((status = 200, description = "Client reactivated")),
    security(("bearer_auth" = [])),
    tag = "clients"
)]
pub async fn activate_client(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<client::Model> {
    let client = state
        .services
        .clients
        .activate_client(id, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(client)))
}

/// Invoiced, paid, credited and outstanding totals for one client.
#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}/statement",
    params(("id" = Uuid, Path, description = "Client id")),
    responses((status = 200, description = "Account statement", body = ClientStatement)),
    security(("bearer_auth" = [])),
    tag = "clients"
)]
pub async fn client_statement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ClientStatement> {
    let statement = state
        .services
        .invoices
        .client_statement(id, &state.config.default_currency)
        .await?;
    Ok(Json(ApiResponse::success(statement)))
}
