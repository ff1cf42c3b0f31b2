// src/handlers/academic.rs

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
    db::academic_repo::Catalog,
    middleware::{
        extract::{AppJson, AppPath, AppQuery},
        i18n::Locale,
        rbac::{AnyMember, Managers, RequireRole},
        tenancy::TenantContext,
    },
    models::academic::{
        CatalogFilter, ClassSection, ClassSectionSubjectTeacher, CreateCatalogEntryPayload,
        CreateCsstPayload, CreateTeacherPayload, CsstFilter, Subject, Teacher, TeacherFilter,
        UpdateCsstPayload, UpdateTeacherPayload,
    },
};

// =============================================================================
//  PROFESSORES
// =============================================================================

// GET /api/a/teachers
#[utoipa::path(
    get,
    path = "/api/a/teachers",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), PageQuery, TeacherFilter),
    responses((status = 200, description = "Professores", body = Vec<Teacher>)),
    security(("api_jwt" = []))
)]
pub async fn list_teachers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<AnyMember>,
    AppQuery(page): AppQuery<PageQuery>,
    AppQuery(filter): AppQuery<TeacherFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, request) = app_state
        .academic_service
        .list_teachers(tenant.0.masjid_id, &filter, &page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(ListResponse::new(message, items, request)))
}

// POST /api/a/teachers
#[utoipa::path(
    post,
    path = "/api/a/teachers",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid")),
    request_body = CreateTeacherPayload,
    responses(
        (status = 201, description = "Professor criado", body = Teacher),
        (status = 409, description = "Código já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_teacher(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppJson(payload): AppJson<CreateTeacherPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let teacher = app_state
        .academic_service
        .create_teacher(tenant.0.masjid_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(message, teacher))))
}

// GET /api/a/teachers/{id}
#[utoipa::path(
    get,
    path = "/api/a/teachers/{id}",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), ("id" = Uuid, Path)),
    responses(
        (status = 200, description = "Professor", body = Teacher),
        (status = 404, description = "Não encontrado neste masjid")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_teacher(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<AnyMember>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let teacher = app_state
        .academic_service
        .get_teacher(tenant.0.masjid_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(DataResponse::new(message, teacher)))
}

// PATCH /api/a/teachers/{id}
#[utoipa::path(
    patch,
    path = "/api/a/teachers/{id}",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), ("id" = Uuid, Path)),
    request_body = UpdateTeacherPayload,
    responses(
        (status = 200, description = "Professor atualizado (snapshots dos CSST junto)", body = Teacher),
        (status = 400, description = "`name: null`")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_teacher(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateTeacherPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let teacher = app_state
        .academic_service
        .update_teacher(tenant.0.masjid_id, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.updated");
    Ok(Json(DataResponse::new(message, teacher)))
}

// DELETE /api/a/teachers/{id}
#[utoipa::path(
    delete,
    path = "/api/a/teachers/{id}",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), ("id" = Uuid, Path)),
    responses((status = 200, description = "Professor removido; atribuições desfeitas")),
    security(("api_jwt" = []))
)]
pub async fn delete_teacher(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .academic_service
        .delete_teacher(tenant.0.masjid_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.deleted");
    Ok(Json(DataResponse::new(message, id)))
}

// =============================================================================
//  TURMAS E DISCIPLINAS
// =============================================================================

// GET /api/a/class-sections
#[utoipa::path(
    get,
    path = "/api/a/class-sections",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), PageQuery, CatalogFilter),
    responses((status = 200, description = "Turmas", body = Vec<ClassSection>)),
    security(("api_jwt" = []))
)]
pub async fn list_class_sections(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<AnyMember>,
    AppQuery(page): AppQuery<PageQuery>,
    AppQuery(filter): AppQuery<CatalogFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, request) = app_state
        .academic_service
        .list_class_sections(tenant.0.masjid_id, &filter, &page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(ListResponse::new(message, items, request)))
}

// POST /api/a/class-sections
#[utoipa::path(
    post,
    path = "/api/a/class-sections",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid")),
    request_body = CreateCatalogEntryPayload,
    responses(
        (status = 201, description = "Turma criada", body = ClassSection),
        (status = 409, description = "Código já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_class_section(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppJson(payload): AppJson<CreateCatalogEntryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let section = app_state
        .academic_service
        .create_class_section(tenant.0.masjid_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(message, section))))
}

// DELETE /api/a/class-sections/{id}
#[utoipa::path(
    delete,
    path = "/api/a/class-sections/{id}",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), ("id" = Uuid, Path)),
    responses((status = 200, description = "Turma removida (soft delete)")),
    security(("api_jwt" = []))
)]
pub async fn delete_class_section(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .academic_service
        .delete_catalog_entry(Catalog::ClassSections, tenant.0.masjid_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.deleted");
    Ok(Json(DataResponse::new(message, id)))
}

// GET /api/a/subjects
#[utoipa::path(
    get,
    path = "/api/a/subjects",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), PageQuery, CatalogFilter),
    responses((status = 200, description = "Disciplinas", body = Vec<Subject>)),
    security(("api_jwt" = []))
)]
pub async fn list_subjects(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<AnyMember>,
    AppQuery(page): AppQuery<PageQuery>,
    AppQuery(filter): AppQuery<CatalogFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, request) = app_state
        .academic_service
        .list_subjects(tenant.0.masjid_id, &filter, &page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(ListResponse::new(message, items, request)))
}

// POST /api/a/subjects
#[utoipa::path(
    post,
    path = "/api/a/subjects",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid")),
    request_body = CreateCatalogEntryPayload,
    responses(
        (status = 201, description = "Disciplina criada", body = Subject),
        (status = 409, description = "Código já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_subject(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppJson(payload): AppJson<CreateCatalogEntryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let subject = app_state
        .academic_service
        .create_subject(tenant.0.masjid_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(message, subject))))
}

// DELETE /api/a/subjects/{id}
#[utoipa::path(
    delete,
    path = "/api/a/subjects/{id}",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), ("id" = Uuid, Path)),
    responses((status = 200, description = "Disciplina removida (soft delete)")),
    security(("api_jwt" = []))
)]
pub async fn delete_subject(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .academic_service
        .delete_catalog_entry(Catalog::Subjects, tenant.0.masjid_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.deleted");
    Ok(Json(DataResponse::new(message, id)))
}

// =============================================================================
//  CSST
// =============================================================================

// GET /api/a/class-section-subject-teachers
#[utoipa::path(
    get,
    path = "/api/a/class-section-subject-teachers",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), PageQuery, CsstFilter),
    responses((status = 200, description = "Atribuições turma x disciplina x professor", body = Vec<ClassSectionSubjectTeacher>)),
    security(("api_jwt" = []))
)]
pub async fn list_csst(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<AnyMember>,
    AppQuery(page): AppQuery<PageQuery>,
    AppQuery(filter): AppQuery<CsstFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, request) = app_state
        .academic_service
        .list_csst(tenant.0.masjid_id, &filter, &page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(ListResponse::new(message, items, request)))
}

// POST /api/a/class-section-subject-teachers
#[utoipa::path(
    post,
    path = "/api/a/class-section-subject-teachers",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid")),
    request_body = CreateCsstPayload,
    responses(
        (status = 201, description = "Atribuição criada com snapshots", body = ClassSectionSubjectTeacher),
        (status = 404, description = "Turma, disciplina ou professor inexistente"),
        (status = 409, description = "Turma x disciplina já atribuída")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_csst(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppJson(payload): AppJson<CreateCsstPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let csst = app_state
        .academic_service
        .create_csst(tenant.0.masjid_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(message, csst))))
}

// GET /api/a/class-section-subject-teachers/{id}
#[utoipa::path(
    get,
    path = "/api/a/class-section-subject-teachers/{id}",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), ("id" = Uuid, Path)),
    responses(
        (status = 200, description = "Atribuição", body = ClassSectionSubjectTeacher),
        (status = 404, description = "Não encontrada neste masjid")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_csst(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<AnyMember>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let csst = app_state
        .academic_service
        .get_csst(tenant.0.masjid_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(DataResponse::new(message, csst)))
}

// PATCH /api/a/class-section-subject-teachers/{id}
#[utoipa::path(
    patch,
    path = "/api/a/class-section-subject-teachers/{id}",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), ("id" = Uuid, Path)),
    request_body = UpdateCsstPayload,
    responses(
        (status = 200, description = "Atribuição atualizada", body = ClassSectionSubjectTeacher),
        (status = 404, description = "Atribuição ou professor inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_csst(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateCsstPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let csst = app_state
        .academic_service
        .update_csst(tenant.0.masjid_id, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.updated");
    Ok(Json(DataResponse::new(message, csst)))
}

// DELETE /api/a/class-section-subject-teachers/{id}
#[utoipa::path(
    delete,
    path = "/api/a/class-section-subject-teachers/{id}",
    tag = "Academic",
    params(("x-masjid-id" = Option<Uuid>, Header, description = "ID do masjid"), ("id" = Uuid, Path)),
    responses((status = 200, description = "Atribuição removida (soft delete)")),
    security(("api_jwt" = []))
)]
pub async fn delete_csst(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<Managers>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .academic_service
        .delete_csst(tenant.0.masjid_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.deleted");
    Ok(Json(DataResponse::new(message, id)))
}
