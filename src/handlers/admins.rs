// src/handlers/admins.rs

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
        rbac::{AnyMember, Managers, RequireRole},
        tenancy::TenantContext,
    },
    models::membership::{AddAdminPayload, AdminFilter, MasjidAdmin, UpdateAdminPayload},
};

// GET /api/a/admins
#[utoipa::path(
    get,
    path = "/api/a/admins",
    tag = "Admins",
    params(
        ("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"),
        PageQuery,
        AdminFilter
    ),
    responses(
        (status = 200, description = "Membros do masjid", body = Vec<MasjidAdmin>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_admins(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<AnyMember>,
    AppQuery(page): AppQuery<PageQuery>,
    AppQuery(filter): AppQuery<AdminFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, request) = app_state
        .masjid_service
        .list_admins(tenant.0.masjid_id, &filter, &page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(ListResponse::new(message, items, request)))
}

// POST /api/a/admins
#[utoipa::path(
    post,
    path = "/api/a/admins",
    tag = "Admins",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid")),
    request_body = AddAdminPayload,
    responses(
        (status = 201, description = "Membro adicionado", body = MasjidAdmin),
        (status = 403, description = "Cargo insuficiente (só owner concede owner)"),
        (status = 404, description = "Usuário não encontrado"),
        (status = 409, description = "Já é membro")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_admin(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppJson(payload): AppJson<AddAdminPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let admin = app_state
        .masjid_service
        .add_admin(tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(message, admin))))
}

// PATCH /api/a/admins/{id}
#[utoipa::path(
    patch,
    path = "/api/a/admins/{id}",
    tag = "Admins",
    params(
        ("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"),
        ("id" = Uuid, Path, description = "ID do vínculo")
    ),
    request_body = UpdateAdminPayload,
    responses(
        (status = 200, description = "Cargo alterado", body = MasjidAdmin),
        (status = 403, description = "Cargo insuficiente ou alteração do próprio cargo"),
        (status = 404, description = "Vínculo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_admin_role(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateAdminPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = app_state
        .masjid_service
        .update_admin_role(tenant.0, user.id, id, payload.role)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.updated");
    Ok(Json(DataResponse::new(message, admin)))
}

// POST /api/a/admins/{id}/toggle-active
#[utoipa::path(
    post,
    path = "/api/a/admins/{id}/toggle-active",
    tag = "Admins",
    params(
        ("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"),
        ("id" = Uuid, Path, description = "ID do vínculo")
    ),
    responses(
        (status = 200, description = "is_active invertido", body = MasjidAdmin),
        (status = 403, description = "Owner não pode ser desativado; ninguém desativa a si mesmo")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_admin_active(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = app_state
        .masjid_service
        .toggle_admin_active(tenant.0, user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.updated");
    Ok(Json(DataResponse::new(message, admin)))
}

// DELETE /api/a/admins/{id}
#[utoipa::path(
    delete,
    path = "/api/a/admins/{id}",
    tag = "Admins",
    params(
        ("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"),
        ("id" = Uuid, Path, description = "ID do vínculo")
    ),
    responses(
        (status = 200, description = "Vínculo removido (soft delete)"),
        (status = 403, description = "Owners não podem ser removidos"),
        (status = 404, description = "Vínculo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_admin(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .masjid_service
        .remove_admin(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.deleted");
    Ok(Json(DataResponse::new(message, id)))
}
