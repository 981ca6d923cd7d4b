use crate::{
    auth::AuthUser,
    commands::processes::{AddProcessFieldCommand, UpdateProcessFieldCommand},
    handlers::common::{created, AppJson, CreatedResult, PageQuery},
    models::{process_field, process_name},
    services::processes::{
        CreateProcessRequest, ProcessFilter, ProcessWithFields, UpdateProcessRequest,
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
    path = "/api/v1/processes",
    params(PageQuery, ProcessFilter),
    responses((status = 200, description = "Page of processes")),
    security(("bearer_auth" = [])),
    tag = "processes"
)]
pub async fn list_processes(
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(filter): Query<ProcessFilter>,
) -> ApiResult<PaginatedResponse<process_name::Model>> {
    let (page, limit) = paging.resolve(&state.config);
    let processes = state
        .services
        .processes
        .list_processes(filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(processes.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/processes",
    request_body = CreateProcessRequest,
    responses(
        (status = 201, description = "Process created"),
        (status = 409, description = "Name already used in the company", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "processes"
)]
pub async fn create_process(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateProcessRequest>,
) -> CreatedResult<process_name::Model> {
    let process = state
        .services
        .processes
        .create_process(payload, Some(user.user_id))
        .await?;
    Ok(created(process))
}

#[utoipa::path(
    get,
    path = "/api/v1/processes/{id}",
    params(("id" = Uuid, Path, description = "Process id")),
    responses(
        (status = 200, description = "Process with its field definitions", body = ProcessWithFields),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "processes"
)]
pub async fn get_process(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProcessWithFields> {
    let process = state.services.processes.get_process(id).await?;
    Ok(Json(ApiResponse::success(process)))
}

#[utoipa::path(
    put,
    path = "/api/v1/processes/{id}",
    params(("id" = Uuid, Path, description = "Process id")),
    request_body = UpdateProcessRequest,
    responses((status = 200, description = "Process updated")),
    security(("bearer_auth" = [])),
    tag = "processes"
)]
pub async fn update_process(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateProcessRequest>,
) -> ApiResult<process_name::Model> {
    let process = state
        .services
        .processes
        .update_process(id, payload, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(process)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/processes/{id}",
    params(("id" = Uuid, Path, description = "Process id")),
    responses((status = 200, description = "Process deactivated")),
    security(("bearer_auth" = [])),
    tag = "processes"
)]
pub async fn deactivate_process(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<process_name::Model> {
    let process = state
        .services
        .processes
        .deactivate_process(id, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(process)))
}

/// Add a field definition. Machines already running the process get the
/// default value, if one is given.
#[utoipa::path(
    post,
    path = "/api/v1/processes/{id}/fields",
    params(("id" = Uuid, Path, description = "Process id")),
    request_body = AddProcessFieldCommand,
    responses(
        (status = 201, description = "Field added"),
        (status = 400, description = "Required field without a default on a process in use", body = crate::errors::ErrorResponse),
        (status = 409, description = "Field key already defined", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "processes"
)]
pub async fn add_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<AddProcessFieldCommand>,
) -> CreatedResult<process_field::Model> {
    let field = state.services.processes.add_field(id, payload).await?;
    Ok(created(field))
}

#[utoipa::path(
    put,
    path = "/api/v1/processes/{id}/fields/{field_id}",
    params(
        ("id" = Uuid, Path, description = "Process id"),
        ("field_id" = Uuid, Path, description = "Field id"),
    ),
    request_body = UpdateProcessFieldCommand,
    responses(
        (status = 200, description = "Field updated"),
        (status = 400, description = "Stored machine values no longer fit", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "processes"
)]
pub async fn update_field(
    State(state): State<AppState>,
    Path((id, field_id)): Path<(Uuid, Uuid)>,
    AppJson(payload): AppJson<UpdateProcessFieldCommand>,
) -> ApiResult<process_field::Model> {
    let field = state
        .services
        .processes
        .update_field(id, field_id, payload)
        .await?;
    Ok(Json(ApiResponse::success(field)))
}

/// Remove a field definition and strip its key from every machine.
#[utoipa::path(
    delete,
    path = "/api/v1/processes/{id}/fields/{field_id}",
    params(
        ("id" = Uuid, Path, description = "Process id"),
        ("field_id" = Uuid, Path, description = "Field id"),
    ),
    responses((status = 200, description = "Field removed")),
    security(("bearer_auth" = [])),
    tag = "processes"
)]
pub async fn remove_field(
    State(state): State<AppState>,
    Path((id, field_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<process_field::Model> {
    let field = state.services.processes.remove_field(id, field_id).await?;
    Ok(Json(ApiResponse::success(field)))
}
