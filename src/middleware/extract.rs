// src/middleware/extract.rs
// Json/Query/Path do axum, mas com a rejeição no nosso formato `{"error": ...}`
// (400 traduzido) no lugar do texto puro / 422 padrão.

use axum::{
    extract::{FromRef, FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
};

fn reject<S>(state: &S, locale: &Locale, detail: String) -> ApiError
where
    AppState: FromRef<S>,
{
    let app_state = AppState::from_ref(state);
    tracing::debug!("Requisição rejeitada na extração: {}", detail);
    AppError::InvalidParam(detail).to_api_error(locale, &app_state.i18n_store)
}

pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_headers(req.headers());
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(reject(state, &locale, rejection.body_text())),
        }
    }
}

pub struct AppQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(AppQuery(value)),
            Err(rejection) => {
                let locale = Locale::from_headers(&parts.headers);
                Err(reject(state, &locale, rejection.body_text()))
            }
        }
    }
}

pub struct AppPath<T>(pub T);

impl<S, T> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(AppPath(value)),
            Err(rejection) => {
                let locale = Locale::from_headers(&parts.headers);
                Err(reject(state, &locale, rejection.body_text()))
            }
        }
    }
}
