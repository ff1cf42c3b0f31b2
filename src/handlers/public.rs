// src/handlers/public.rs
// Rotas sem autenticação: vitrine dos masjids, doações e o webhook do Midtrans.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{
        error::ApiError,
        pagination::{DataResponse, ListResponse, PageQuery},
    },
    config::AppState,
    middleware::{extract::{AppJson, AppPath, AppQuery}, i18n::Locale},
    models::{
        donation::{
            CreateDonationPayload, DonationCheckout, MidtransNotification, NotificationResult,
            PublicDonation,
        },
        masjid::{Masjid, MasjidFilter},
    },
};

// GET /public/masjids
#[utoipa::path(
    get,
    path = "/public/masjids",
    tag = "Public",
    params(PageQuery, MasjidFilter),
    responses(
        (status = 200, description = "Masjids ativos, paginados", body = Vec<Masjid>)
    )
)]
pub async fn list_masjids(
    State(app_state): State<AppState>,
    locale: Locale,
    AppQuery(page): AppQuery<PageQuery>,
    AppQuery(filter): AppQuery<MasjidFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, request) = app_state
        .masjid_service
        .list_public(&filter, &page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(ListResponse::new(message, items, request)))
}

// GET /public/masjids/{slug}
#[utoipa::path(
    get,
    path = "/public/masjids/{slug}",
    tag = "Public",
    params(("slug" = String, Path, description = "Slug do masjid")),
    responses(
        (status = 200, description = "Detalhe do masjid", body = Masjid),
        (status = 404, description = "Inexistente, removido ou inativo")
    )
)]
pub async fn get_masjid(
    State(app_state): State<AppState>,
    locale: Locale,
    AppPath(slug): AppPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let masjid = app_state
        .masjid_service
        .get_public(&slug.to_lowercase())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(DataResponse::new(message, masjid)))
}

// POST /public/masjids/{slug}/donations
#[utoipa::path(
    post,
    path = "/public/masjids/{slug}/donations",
    tag = "Public",
    params(("slug" = String, Path, description = "Slug do masjid")),
    request_body = CreateDonationPayload,
    responses(
        (status = 201, description = "Doação pendente + token do Snap", body = DonationCheckout),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Masjid não encontrado"),
        (status = 502, description = "Falha no gateway; a doação fica `failed`")
    )
)]
pub async fn create_donation(
    State(app_state): State<AppState>,
    locale: Locale,
    AppPath(slug): AppPath<String>,
    AppJson(payload): AppJson<CreateDonationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let checkout = app_state
        .donation_service
        .create_public(&slug.to_lowercase(), &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(message, checkout))))
}

// GET /public/masjids/{slug}/donations
#[utoipa::path(
    get,
    path = "/public/masjids/{slug}/donations",
    tag = "Public",
    params(("slug" = String, Path, description = "Slug do masjid"), PageQuery),
    responses(
        (status = 200, description = "Doações concluídas (anônimos como \"Hamba Allah\")", body = Vec<PublicDonation>)
    )
)]
pub async fn list_donations(
    State(app_state): State<AppState>,
    locale: Locale,
    AppPath(slug): AppPath<String>,
    AppQuery(page): AppQuery<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (items, request) = app_state
        .donation_service
        .list_public(&slug.to_lowercase(), &page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state.i18n_store.translate(&locale.0, "message.fetched");
    Ok(Json(ListResponse::new(message, items, request)))
}

// POST /public/payments/midtrans/notification
#[utoipa::path(
    post,
    path = "/public/payments/midtrans/notification",
    tag = "Public",
    request_body = MidtransNotification,
    responses(
        (status = 200, description = "Notificação processada", body = NotificationResult),
        (status = 403, description = "Assinatura inválida"),
        (status = 404, description = "order_id desconhecido")
    )
)]
pub async fn midtrans_notification(
    State(app_state): State<AppState>,
    locale: Locale,
    AppJson(notification): AppJson<MidtransNotification>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .donation_service
        .handle_notification(&notification)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let message = app_state
        .i18n_store
        .translate(&locale.0, "message.notification_processed");
    Ok(Json(DataResponse::new(message, result)))
}
