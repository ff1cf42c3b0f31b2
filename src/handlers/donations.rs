// src/handlers/donations.rs
// Visão administrativa das doações do masjid. O checkout e o webhook ficam em `public`.

use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        error::ApiError,
        pagination::{DataResponse, ListResponse, PageQuery},
    },
    config::AppState,
    middleware::{
        extract::{AppPath, AppQuery},
        i18n::Locale,
        rbac::{Managers, RequireRole, Staff},
        tenancy::TenantContext,
    },
    models::donation::{Donation, DonationFilter},
};

// GET /api/a/donations
#[utoipa::path(
    get,
    path = "/api/a/donations",
    tag = "Donations",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), PageQuery, DonationFilter),
    responses((status = 200, description = "Doações do masjid", body = Vec<Donation>)),
    security(("api_jwt" = []))
)]
pub async fn list_donations(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Staff>,
    AppQuery(page): AppQuery<PageQuery>,
    AppQuery(filter): AppQuery<DonationFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, request) = app_state
        .donation_service
        .list(tenant.0.masjid_id, &filter, &page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(ListResponse::new(message, items, request)))
}

// GET /api/a/donations/{id}
#[utoipa::path(
    get,
    path = "/api/a/donations/{id}",
    tag = "Donations",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), ("id" = Uuid, Path)),
    responses(
        (status = 200, description = "Doação", body = Donation),
        (status = 404, description = "Não encontrada neste masjid")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_donation(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Staff>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let donation = app_state
        .donation_service
        .get(tenant.0.masjid_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(DataResponse::new(message, donation)))
}

// DELETE /api/a/donations/{id}
#[utoipa::path(
    delete,
    path = "/api/a/donations/{id}",
    tag = "Donations",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), ("id" = Uuid, Path)),
    responses((status = 200, description = "Doação removida (soft delete)")),
    security(("api_jwt" = []))
)]
pub async fn delete_donation(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .donation_service
        .delete(tenant.0.masjid_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.deleted");
    Ok(Json(DataResponse::new(message, id)))
}
