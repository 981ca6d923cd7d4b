use crate::{
    auth::AuthUser,
    commands::{
        invoices::{CreateInvoiceCommand, InvoiceWithItems},
        payments::{PaymentWithInvoice, RecordPaymentCommand},
    },
    handlers::common::{created, AppJson, CreatedResult, PageQuery},
    models::{partial_payment, work_order_invoice},
    services::invoices::InvoiceFilter,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    params(PageQuery, InvoiceFilter),
    responses((status = 200, description = "Page of invoices")),
    security(("bearer_auth" = [])),
    tag = "invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(paging): Query<PageQuery>,
    Query(filter): Query<InvoiceFilter>,
) -> ApiResult<PaginatedResponse<work_order_invoice::Model>> {
    let (page, limit) = paging.resolve(&state.config);
    let invoices = state
        .services
        .invoices
        .list_invoices(filter, page, limit)
        .await?;
    Ok(Json(ApiResponse::success(invoices.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    request_body = CreateInvoiceCommand,
    responses(
        (status = 201, description = "Invoice created", body = InvoiceWithItems),
        (status = 400, description = "Invalid lines, dates or client", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateInvoiceCommand>,
) -> CreatedResult<InvoiceWithItems> {
    let invoice = state
        .services
        .invoices
        .create_invoice(payload, Some(user.user_id))
        .await?;
    Ok(created(invoice))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice with lines, payments and credit notes", body = InvoiceWithItems),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<InvoiceWithItems> {
    let invoice = state.services.invoices.get_invoice(id).await?;
    Ok(Json(ApiResponse::success(invoice)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice cancelled"),
        (status = 400, description = "Invoice has active payments", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "invoices"
)]
pub async fn cancel_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<work_order_invoice::Model> {
    let invoice = state
        .services
        .invoices
        .cancel_invoice(id, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(invoice)))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}/payments",
    params(("id" = Uuid, Path, description = "Invoice id")),
    responses((status = 200, description = "Payments against the invoice")),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn list_payments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<partial_payment::Model>> {
    let payments = state.services.payments.list_for_invoice(id).await?;
    Ok(Json(ApiResponse::success(payments)))
}

#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/payments",
    params(("id" = Uuid, Path, description = "Invoice id")),
    request_body = RecordPaymentCommand,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentWithInvoice),
        (status = 400, description = "Amount exceeds the outstanding balance", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<RecordPaymentCommand>,
) -> CreatedResult<PaymentWithInvoice> {
    let payment = state
        .services
        .payments
        .record_payment(id, payload, Some(user.user_id))
        .await?;
    Ok(created(payment))
}

#[utoipa::path(
    delete,
    path = "/api/v1/payments/{id}",
    params(("id" = Uuid, Path, description = "Payment id")),
    responses((status = 200, description = "Payment reversed", body = PaymentWithInvoice)),
    security(("bearer_auth" = [])),
    tag = "payments"
)]
pub async fn reverse_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<PaymentWithInvoice> {
    let payment = state
        .services
        .payments
        .reverse_payment(id, Some(user.user_id))
        .await?;
    Ok(Json(ApiResponse::success(payment)))
}
