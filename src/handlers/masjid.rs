// src/handlers/masjid.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        pagination::DataResponse,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        extract::AppJson,
        i18n::Locale,
        rbac::{AnyMember, Managers, OwnerOnly, RequireRole},
        tenancy::TenantContext,
    },
    models::masjid::{CreateMasjidPayload, Masjid, MyMasjid, UpdateMasjidPayload},
};

// POST /api/u/masjids
#[utoipa::path(
    post,
    path = "/api/u/masjids",
    tag = "Masjid",
    request_body = CreateMasjidPayload,
    responses(
        (status = 201, description = "Masjid criado; o usuário vira owner", body = Masjid),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Slug ou domínio já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_masjid(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppJson(payload): AppJson<CreateMasjidPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let masjid = app_state
        .masjid_service
        .create_masjid(user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(message, masjid))))
}

// GET /api/u/masjids
#[utoipa::path(
    get,
    path = "/api/u/masjids",
    tag = "Masjid",
    responses(
        (status = 200, description = "Masjids em que o usuário é membro ativo", body = Vec<MyMasjid>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_masjids(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let masjids = app_state
        .masjid_service
        .list_my_masjids(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(DataResponse::new(message, masjids)))
}

// GET /api/a/masjid
#[utoipa::path(
    get,
    path = "/api/a/masjid",
    tag = "Masjid",
    params(
        ("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"),
        ("x-masjid-slug" = Option<String>, Header, description = "Slug do masjid (alternativa ao ID)")
    ),
    responses(
        (status = 200, description = "Masjid atual", body = Masjid),
        (status = 403, description = "Não é membro")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_current_masjid(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<AnyMember>,
) -> Result<impl IntoResponse, ApiError> {
    let masjid = app_state
        .masjid_service
        .get_masjid(tenant.0.masjid_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(DataResponse::new(message, masjid)))
}

// PATCH /api/a/masjid
#[utoipa::path(
    patch,
    path = "/api/a/masjid",
    tag = "Masjid",
    request_body = UpdateMasjidPayload,
    params(
        ("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"),
        ("x-masjid-slug" = Option<String>, Header, description = "Slug do masjid (alternativa ao ID)")
    ),
    responses(
        (status = 200, description = "Masjid atualizado", body = Masjid),
        (status = 400, description = "`null` em campo obrigatório"),
        (status = 403, description = "Cargo insuficiente"),
        (status = 409, description = "Slug ou domínio já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_current_masjid(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppJson(payload): AppJson<UpdateMasjidPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let masjid = app_state
        .masjid_service
        .update_masjid(tenant.0.masjid_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.updated");
    Ok(Json(DataResponse::new(message, masjid)))
}

// DELETE /api/a/masjid
#[utoipa::path(
    delete,
    path = "/api/a/masjid",
    tag = "Masjid",
    params(
        ("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"),
        ("x-masjid-slug" = Option<String>, Header, description = "Slug do masjid (alternativa ao ID)")
    ),
    responses(
        (status = 200, description = "Masjid removido (soft delete)"),
        (status = 403, description = "Somente o owner")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_current_masjid(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<OwnerOnly>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .masjid_service
        .delete_masjid(tenant.0.masjid_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.deleted");
    Ok(Json(DataResponse::new(message, tenant.0.masjid_id)))
}
