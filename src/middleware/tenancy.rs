// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::membership::MasjidContext,
    services::masjid_service::TenantSelector,
};

pub const MASJID_ID_HEADER: &str = "x-masjid-id";
pub const MASJID_SLUG_HEADER: &str = "x-masjid-slug";

/// Lê o masjid dos cabeçalhos. O ID tem precedência sobre o slug.
pub fn selector_from_headers(headers: &HeaderMap) -> Result<TenantSelector, AppError> {
    let read = |name: &str| {
        headers
            .get(name)
            .map(|value| {
                value
                    .to_str()
                    .map(|s| s.trim().to_string())
                    .map_err(|_| AppError::InvalidParam(name.to_string()))
            })
            .transpose()
    };

    if let Some(raw_id) = read(MASJID_ID_HEADER)?.filter(|s| !s.is_empty()) {
        let id = Uuid::parse_str(&raw_id)
            .map_err(|_| AppError::InvalidParam(MASJID_ID_HEADER.to_string()))?;
        return Ok(TenantSelector::Id(id));
    }

    match read(MASJID_SLUG_HEADER)?.filter(|s| !s.is_empty()) {
        Some(slug) => Ok(TenantSelector::Slug(slug.to_lowercase())),
        None => Err(AppError::MissingMasjidContext),
    }
}

// Roda depois do auth_guard: resolve o masjid e confere se o usuário é membro ativo.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let user_id = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.id)
        .ok_or_else(|| to_api(AppError::InvalidToken))?;

    let selector = selector_from_headers(request.headers()).map_err(to_api)?;

    let context = app_state
        .masjid_service
        .resolve_context(user_id, &selector)
        .await
        .map_err(to_api)?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

// O extrator usado pelos handlers
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub MasjidContext);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<MasjidContext>() {
            Some(ctx) => Ok(TenantContext(*ctx)),
            None => {
                let app_state = AppState::from_ref(state);
                let locale = Locale::from_headers(&parts.headers);
                Err(AppError::MissingMasjidContext.to_api_error(&locale, &app_state.i18n_store))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn id_header_wins_over_slug() {
        let id = Uuid::new_v4();
        let selector = selector_from_headers(&headers(&[
            (MASJID_ID_HEADER, &id.to_string()),
            (MASJID_SLUG_HEADER, "al-ikhlas"),
        ]))
        .unwrap();
        assert_eq!(selector, TenantSelector::Id(id));
    }

    #[test]
    fn slug_is_lowercased() {
        let selector = selector_from_headers(&headers(&[(MASJID_SLUG_HEADER, " Al-Ikhlas ")])).unwrap();
        assert_eq!(selector, TenantSelector::Slug("al-ikhlas".into()));
    }

    #[test]
    fn rejects_missing_or_malformed_context() {
        assert!(matches!(
            selector_from_headers(&HeaderMap::new()),
            Err(AppError::MissingMasjidContext)
        ));
        assert!(matches!(
            selector_from_headers(&headers(&[(MASJID_ID_HEADER, "not-a-uuid")])),
            Err(AppError::InvalidParam(_))
        ));
    }
}
