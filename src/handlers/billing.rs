// src/handlers/billing.rs

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::{DataResponse, ListResponse, PageQuery},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        extract::{AppJson, AppPath, AppQuery},
        i18n::Locale,
        rbac::{Managers, RequireRole, Staff},
        tenancy::TenantContext,
    },
    models::billing::{BillingFilter, CreateBillingPayload, GeneralBilling, UpdateBillingPayload},
};

// GET /api/a/billings
#[utoipa::path(
    get,
    path = "/api/a/billings",
    tag = "Billing",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), PageQuery, BillingFilter),
    responses((status = 200, description = "Cobranças (até 200 por página)", body = Vec<GeneralBilling>)),
    security(("api_jwt" = []))
)]
pub async fn list_billings(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Staff>,
    AppQuery(page): AppQuery<PageQuery>,
    AppQuery(filter): AppQuery<BillingFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, request) = app_state
        .billing_service
        .list(tenant.0.masjid_id, &filter, &page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(ListResponse::new(message, items, request)))
}

// POST /api/a/billings
#[utoipa::path(
    post,
    path = "/api/a/billings",
    tag = "Billing",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid")),
    request_body = CreateBillingPayload,
    responses(
        (status = 201, description = "Cobrança criada (unpaid)", body = GeneralBilling),
        (status = 400, description = "Dados inválidos ou turma inexistente"),
        (status = 409, description = "Código já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_billing(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppJson(payload): AppJson<CreateBillingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let billing = app_state
        .billing_service
        .create(tenant.0.masjid_id, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(message, billing))))
}

// GET /api/a/billings/{id}
#[utoipa::path(
    get,
    path = "/api/a/billings/{id}",
    tag = "Billing",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), ("id" = Uuid, Path)),
    responses(
        (status = 200, description = "Cobrança", body = GeneralBilling),
        (status = 404, description = "Não encontrada neste masjid")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_billing(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Staff>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let billing = app_state
        .billing_service
        .get(tenant.0.masjid_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(DataResponse::new(message, billing)))
}

// PATCH /api/a/billings/{id}
#[utoipa::path(
    patch,
    path = "/api/a/billings/{id}",
    tag = "Billing",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), ("id" = Uuid, Path)),
    request_body = UpdateBillingPayload,
    responses(
        (status = 200, description = "Cobrança atualizada", body = GeneralBilling),
        (status = 400, description = "Transição de status inválida ou `null` em campo obrigatório")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_billing(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateBillingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let billing = app_state
        .billing_service
        .update(tenant.0.masjid_id, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.updated");
    Ok(Json(DataResponse::new(message, billing)))
}

// DELETE /api/a/billings/{id}
#[utoipa::path(
    delete,
    path = "/api/a/billings/{id}",
    tag = "Billing",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), ("id" = Uuid, Path)),
    responses((status = 200, description = "Cobrança removida (soft delete)")),
    security(("api_jwt" = []))
)]
pub async fn delete_billing(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .billing_service
        .delete(tenant.0.masjid_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.deleted");
    Ok(Json(DataResponse::new(message, id)))
}
