use crate::{
    auth::AuthUser,
    handlers::common::{created, AppJson, CreatedResult, PageQuery},
    models::user,
    services::users::{CreateUserRequest, UserFilter},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PageQuery, UserFilter),
    responses((status = 200, description = "Page of users")),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(filter): Query<UserFilter>,
) -> ApiResult<PaginatedResponse<user::Model>> {
    let (page, limit) = paging.resolve(&state.config);
    let users = state.services.users.list_users(filter, page, limit).await?;
    Ok(Json(ApiResponse::success(users.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    admin: AuthUser,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> CreatedResult<user::Model> {
    let user = state
        .services
        .users
        .create_user(payload, Some(admin.user_id))
        .await?;
    Ok(created(user))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deactivated"),
        (status = 400, description = "Cannot deactivate yourself", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn deactivate_user(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<user::Model> {
    let user = state
        .services
        .users
        .deactivate_user(id, Some(admin.user_id))
        .await?;
    Ok(Json(ApiResponse::success(user)))
}
