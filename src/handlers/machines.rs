use crate::{
    auth::AuthUser,
    handlers::common::{created, AppJson, CreatedResult, PageQuery},
    models::{machine, machine_process},
    services::machines::{
        CreateMachineRequest, MachineFilter, MachineWithProcesses, ProcessValuesRequest,
        UpdateMachineRequest,
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
    path = "/api/v1/machines",
    params(PageQuery, MachineFilter),
    responses((status = 200, description = "Page of machines")),
    security(("bearer_auth" = [])),
    tag = "machines"
)]
pub async fn list_machines(
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(filter): Query<MachineFilter>,
) -> ApiResult<PaginatedResponse<machine::Model>> {
    let (page, limit) = paging.resolve(&state.config);
    let machines = state
        .services
        .machines
        .list_machines(filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(machines.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/machines",
    request_body = CreateMachineRequest,
    responses((status = 201, description = "Machine created")),
    security(("bearer_auth" = [])),
    tag = "machines"
)]
pub async fn create_machine(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateMachineRequest>,
) -> CreatedResult<machine::Model> {
    let machine = state
        .services
        .machines
        .create_machine(payload, Some(user.user_id))
        .await?;
    Ok(created(machine))
}

#[utoipa::path(
    get,
    path = "/api/v1/machines/{id}",
    params(("id" = Uuid, Path, description = "Machine id")),
    responses(
        (status = 200, description = "Machine with its processes", body = MachineWithProcesses),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "machines"
)]
pub async fn get_machine(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<MachineWithProcesses> {
    let machine = state.services.machines.get_machine(id).await?;
    Ok(Json(ApiResponse::success(machine)))
}

#[utoipa::path(
    put,
    path = "/api/v1/machines/{id}",
    params(("id" = Uuid, Path, description = "Machine id")),
    request_body = UpdateMachineRequest,
    responses((status = 200, description = "Machine updated")),
    security(("bearer_auth" = [])),
    tag = "machines"
)]
pub async fn update_machine(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateMachineRequest>,
) -> ApiResult<machine::Model> {
    let machine = state
        .services
        .machines
        .update_machine(id, payload, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(machine)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/machines/{id}",
    params(("id" = Uuid, Path, description = "Machine id")),
    responses((status = 200, description = "Machine deactivated")),
    security(("bearer_auth" = [])),
    tag = "machines"
)]
pub async fn deactivate_machine(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<machine::Model> {
    let machine = state
        .services
        .machines
        .deactivate_machine(id, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(machine)))
}

/// Assign a process to a machine, or replace its field values.
#[utoipa::path(
    put,
    path = "/api/v1/machines/{id}/processes/{process_id}",
    params(
        ("id" = Uuid, Path, description = "Machine id"),
        ("process_id" = Uuid, Path, description = "Process id"),
    ),
    request_body = ProcessValuesRequest,
    responses(
        (status = 200, description = "Process assigned"),
        (status = 400, description = "Field values do not match the process definition", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "machines"
)]
pub async fn assign_process(
    State(state): State<AppState>,
    Path((id, process_id)): Path<(Uuid, Uuid)>,
    AppJson(payload): AppJson<ProcessValuesRequest>,
) -> ApiResult<machine_process::Model> {
    let assignment = state
        .services
        .machines
        .assign_process(id, process_id, payload)
        .await?;
    Ok(Json(ApiResponse::success(assignment)))
}

/// Change the field values of an existing assignment.
#[utoipa::path(
    patch,
    path = "/api/v1/machines/{id}/processes/{process_id}",
    params(
        ("id" = Uuid, Path, description = "Machine id"),
        ("process_id" = Uuid, Path, description = "Process id"),
    ),
    request_body = ProcessValuesRequest,
    responses(
        (status = 200, description = "Field values updated"),
        (status = 404, description = "Process is not assigned to the machine", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "machines"
)]
pub async fn update_process_values(
    State(state): State<AppState>,
    Path((id, process_id)): Path<(Uuid, Uuid)>,
    AppJson(payload): AppJson<ProcessValuesRequest>,
) -> ApiResult<machine_process::Model> {
    let assignment = state
        .services
        .machines
        .update_process_values(id, process_id, payload)
        .await?;
    Ok(Json(ApiResponse::success(assignment)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/machines/{id}/processes/{process_id}",
    params(
        ("id" = Uuid, Path, description = "Machine id"),
        ("process_id" = Uuid, Path, description = "Process id"),
    ),
    responses((status = 200, description = "Process unassigned")),
    security(("bearer_auth" = [])),
    tag = "machines"
)]
pub async fn unassign_process(
    State(state): State<AppState>,
    Path((id, process_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<machine_process::Model> {
    let assignment = state
        .services
        .machines
        .unassign_process(id, process_id)
        .await?;
    Ok(Json(ApiResponse::success(assignment)))
}
