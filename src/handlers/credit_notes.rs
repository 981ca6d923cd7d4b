use crate::{
    auth::AuthUser,
    commands::credit_notes::{CreditNoteWithInvoice, IssueCreditNoteCommand},
    handlers::common::{created, AppJson, CreatedResult, PageQuery},
    models::credit_note,
    services::credit_notes::CreditNoteFilter,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v1/credit-notes",
    params(PageQuery, CreditNoteFilter),
    responses((status = 200, description = "Page of credit notes")),
    security(("bearer_auth" = [])),
    tag = "credit-notes"
)]
pub async fn list_credit_notes(
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(filter): Query<CreditNoteFilter>,
) -> ApiResult<PaginatedResponse<credit_note::Model>> {
    let (page, limit) = paging.resolve(&state.config);
    let notes = state
        .services
        .credit_notes
        .list_credit_notes(filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(notes.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/credit-notes",
    request_body = IssueCreditNoteCommand,
    responses(
        (status = 201, description = "Credit note issued", body = CreditNoteWithInvoice),
        (status = 400, description = "Amount exceeds the outstanding balance", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "credit-notes"
)]
pub async fn issue_credit_note(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<IssueCreditNoteCommand>,
) -> CreatedResult<CreditNoteWithInvoice> {
    let note = state
        .services
        .credit_notes
        .issue_credit_note(payload, Some(user.user_id))
        .await?;
    Ok(created(note))
}

#[utoipa::path(
    get,
    path = "/api/v1/credit-notes/{id}",
    params(("id" = Uuid, Path, description = "Credit note id")),
    responses(
        (status = 200, description = "Credit note"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "credit-notes"
)]
pub async fn get_credit_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<credit_note::Model> {
    let note = state.services.credit_notes.get_credit_note(id).await?;
    Ok(Json(ApiResponse::success(note)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/credit-notes/{id}",
    params(("id" = Uuid, Path, description = "Credit note id")),
    responses((status = 200, description = "Credit note cancelled", body = CreditNoteWithInvoice)),
    security(("bearer_auth" = [])),
    tag = "credit-notes"
)]
pub async fn cancel_credit_note(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<CreditNoteWithInvoice> {
    let note = state
        .services
        .credit_notes
        .cancel_credit_note(id, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(note)))
}
