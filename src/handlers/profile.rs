// src/handlers/profile.rs

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

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
    },
    models::profile::{ProfileDocument, UpdateProfilePayload, UserProfile},
    services::profile_service::DocumentUpload,
};

// GET /api/u/profile
#[utoipa::path(
    get,
    path = "/api/u/profile",
    tag = "Users",
    responses((status = 200, description = "Perfil (vazio se nunca preenchido)", body = UserProfile)),
    security(("api_jwt" = []))
)]
pub async fn get_profile(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let profile = app_state
        .profile_service
        .get_profile(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(DataResponse::new(message, profile)))
}

// PATCH /api/u/profile
#[utoipa::path(
    patch,
    path = "/api/u/profile",
    tag = "Users",
    request_body = UpdateProfilePayload,
    responses((status = 200, description = "Perfil gravado (upsert)", body = UserProfile)),
    security(("api_jwt" = []))
)]
pub async fn update_profile(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppJson(payload): AppJson<UpdateProfilePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = app_state
        .profile_service
        .update_profile(user.id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.updated");
    Ok(Json(DataResponse::new(message, profile)))
}

// GET /api/u/profile/documents
#[utoipa::path(
    get,
    path = "/api/u/profile/documents",
    tag = "Users",
    params(PageQuery),
    responses((status = 200, description = "Documentos do usuário", body = Vec<ProfileDocument>)),
    security(("api_jwt" = []))
)]
pub async fn list_documents(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppQuery(page): AppQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, request) = app_state
        .profile_service
        .list_documents(user.id, &page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(ListResponse::new(message, items, request)))
}

// Lê os campos `doc_type` e `file` do multipart; o resto é ignorado.
async fn read_upload(multipart: &mut Multipart) -> Result<DocumentUpload, AppError> {
    let bad_body = |_: MultipartError| AppError::InvalidParam("file".into());

    let mut doc_type = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_body)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("doc_type") => {
                doc_type = Some(field.text().await.map_err(bad_body)?);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("file").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(bad_body)?;
                file = Some((file_name, content_type, data));
            }
            _ => {}
        }
    }

    let doc_type = doc_type.ok_or_else(|| AppError::InvalidParam("doc_type".into()))?;
    let (file_name, content_type, data) = file.ok_or_else(|| AppError::InvalidParam("file".into()))?;

    Ok(DocumentUpload {
        doc_type,
        file_name,
        content_type,
        data,
    })
}

// POST /api/u/profile/documents
#[utoipa::path(
    post,
    path = "/api/u/profile/documents",
    tag = "Users",
    request_body(content_type = "multipart/form-data", description = "Campos `doc_type` e `file`"),
    responses(
        (status = 201, description = "Documento enviado", body = ProfileDocument),
        (status = 400, description = "Arquivo ausente, vazio ou grande demais")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_document(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_upload(&mut multipart)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let document = app_state
        .profile_service
        .upload_document(user.id, upload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(message, document))))
}

// DELETE /api/u/profile/documents/{id}
#[utoipa::path(
    delete,
    path = "/api/u/profile/documents/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do documento")),
    responses(
        (status = 200, description = "Documento removido (o arquivo é mantido)"),
        (status = 404, description = "Documento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_document(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .profile_service
        .delete_document(user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.deleted");
    Ok(Json(DataResponse::new(message, id)))
}
