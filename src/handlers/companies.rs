use crate::{
    auth::AuthUser,
    handlers::common::{created, AppJson, CreatedResult, PageQuery},
    models::company,
    services::companies::{CompanyFilter, CreateCompanyRequest, UpdateCompanyRequest},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v1/companies",
    params(PageQuery, CompanyFilter),
    responses((status = 200, description = "Page of companies")),
    security(("bearer_auth" = [])),
    tag = "companies"
)]
pub async fn list_companies(
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(filter): Query<CompanyFilter>,
) -> ApiResult<PaginatedResponse<company::Model>> {
    let (page, limit) = paging.resolve(&state.config);
    let companies = state
        .services
        .companies
        .list_companies(filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(companies.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "companies"
)]
pub async fn create_company(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateCompanyRequest>,
) -> CreatedResult<company::Model> {
    let company = state
        .services
        .companies
        .create_company(payload, Some(user.user_id))
        .await?;
    Ok(created(company))
}

#[utoipa::path(
    get,
    path = "/api/v1/companies/{id}",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "companies"
)]
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<company::Model> {
    let company = state.services.companies.get_company(id).await?;
    Ok(Json(ApiResponse::success(company)))
}

#[utoipa::path(
    put,
    path = "/api/v1/companies/{id}",
    params(("id" = Uuid, Path, description = "Company id")),
    request_body = UpdateCompanyRequest,
    responses((status = 200, description = "Company updated")),
    security(("bearer_auth" = [])),
    tag = "companies"
)]
pub async fn update_company(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateCompanyRequest>,
) -> ApiResult<company::Model> {
    let company = state
        .services
        .companies
        .update_company(id, payload, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(company)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/companies/{id}",
    params(("id" = Uuid, Path, description = "Company id")),
    responses((status = 200, description = "Company deactivated")),
    security(("bearer_auth" = [])),
    tag = "companies"
)]
pub async fn deactivate_company(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<company::Model> {
    let company = state
        .services
        .companies
        .deactivate_company(id, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(company)))
}

#[utoipa::path(
    post,
    path = "/api/v1/companies/{id}/activate",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company reactivated"),
        (status = 409, description = "An active company already uses the name", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "companies"
)]
pub async fn activate_company(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<company::Model> {
    let company = state
        .services
        .companies
        .activate_company(id, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(company)))
}
