// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro de domínio. Os handlers nunca o devolvem direto:
// ele é convertido em `ApiError` (já traduzido) via `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Parâmetro inválido: {0}")]
    InvalidParam(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Contexto de masjid ausente")]
    MissingMasjidContext,

    #[error("Usuário não é membro ativo do masjid")]
    NotMasjidMember,

    #[error("Cargo insuficiente (necessário: {0})")]
    InsufficientRole(String),

    #[error("Operação não permitida: {0}")]
    Forbidden(String),

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Referência inválida: {0}")]
    InvalidReference(String),

    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Assinatura do webhook inválida")]
    InvalidSignature,

    #[error("Falha no gateway de pagamento: {0}")]
    PaymentGatewayError(String),

    #[error("Falha no armazenamento de arquivos: {0}")]
    StorageError(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidParam(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidReference(_) | AppError::InvalidStatusTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::MissingMasjidContext => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::NotMasjidMember
            | AppError::InsufficientRole(_)
            | AppError::Forbidden(_)
            | AppError::InvalidSignature => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists | AppError::UniqueConstraintViolation(_) => {
                StatusCode::CONFLICT
            }
            AppError::PaymentGatewayError(_) => StatusCode::BAD_GATEWAY,
            AppError::StorageError(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave no `I18nStore` e o detalhe que substitui `{detail}` na mensagem.
    fn message_key(&self) -> (&'static str, Option<String>) {
        match self {
            AppError::ValidationError(_) => ("error.validation", None),
            AppError::InvalidParam(d) => ("error.invalid_param", Some(d.clone())),
            AppError::EmailAlreadyExists => ("error.email_exists", None),
            AppError::InvalidCredentials => ("error.invalid_credentials", None),
            AppError::InvalidToken => ("error.invalid_token", None),
            AppError::UserNotFound => ("error.user_not_found", None),
            AppError::MissingMasjidContext => ("error.missing_masjid", None),
            AppError::NotMasjidMember => ("error.not_member", None),
            AppError::InsufficientRole(d) => ("error.insufficient_role", Some(d.clone())),
            AppError::Forbidden(d) => ("error.forbidden", Some(d.clone())),
            AppError::ResourceNotFound(d) => ("error.not_found", Some(d.clone())),
            AppError::DatabaseError(sqlx::Error::RowNotFound) => {
                ("error.not_found", Some("row".to_string()))
            }
            AppError::UniqueConstraintViolation(d) => ("error.conflict", Some(d.clone())),
            AppError::InvalidReference(d) => ("error.invalid_reference", Some(d.clone())),
            AppError::InvalidStatusTransition { from, to } => {
                ("error.invalid_transition", Some(format!("{from} -> {to}")))
            }
            AppError::InvalidSignature => ("error.invalid_signature", None),
            AppError::PaymentGatewayError(_) => ("error.payment_gateway", None),
            _ => ("error.internal", None),
        }
    }

    /// Converte o erro de domínio na resposta HTTP traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let lang = locale.0.as_str();

        // Detalhes do erro ficam só no log; o cliente recebe a mensagem genérica.
        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let (key, detail) = self.message_key();
        let error = store.translate_with(lang, key, detail.as_deref());

        let details = match self {
            AppError::ValidationError(errors) => Some(validation_details(errors, lang, store)),
            _ => None,
        };

        ApiError { status, error, details }
    }
}

// Campo -> lista de mensagens traduzidas.
// A mensagem do `#[validate(..., message = "...")]` é tratada como chave `validation.<msg>`;
// sem mensagem, usamos o código do validador (ex.: `validation.email`).
fn validation_details(errors: &validator::ValidationErrors, lang: &str, store: &I18nStore) -> Value {
    let mut details = serde_json::Map::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<Value> = field_errors
            .iter()
            .map(|e| {
                let key = match &e.message {
                    Some(m) => format!("validation.{m}"),
                    None => format!("validation.{}", e.code),
                };
                Value::String(store.translate(lang, &key))
            })
            .collect();
        details.insert(field.to_string(), Value::Array(messages));
    }
    Value::Object(details)
}

// O erro "de fio": o que efetivamente vai para o cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> I18nStore {
        I18nStore::load_embedded().unwrap()
    }

    #[test]
    fn maps_domain_errors_to_http_status() {
        let cases = [
            (AppError::InvalidParam("page".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AppError::NotMasjidMember, StatusCode::FORBIDDEN),
            (AppError::InsufficientRole("owner".into()), StatusCode::FORBIDDEN),
            (AppError::ResourceNotFound("donation".into()), StatusCode::NOT_FOUND),
            (AppError::DatabaseError(sqlx::Error::RowNotFound), StatusCode::NOT_FOUND),
            (AppError::UniqueConstraintViolation("slug".into()), StatusCode::CONFLICT),
            (AppError::PaymentGatewayError("timeout".into()), StatusCode::BAD_GATEWAY),
            (
                AppError::DatabaseError(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err}");
        }
    }

    #[test]
    fn internal_errors_hide_the_cause() {
        let err = AppError::DatabaseError(sqlx::Error::PoolTimedOut);
        let api = err.to_api_error(&Locale("en".into()), &store());

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "An unexpected error occurred.");
    }

    #[test]
    fn translates_and_fills_detail() {
        let err = AppError::ResourceNotFound("donation".into());
        let api = err.to_api_error(&Locale("id".into()), &store());

        assert_eq!(api.error, "Data tidak ditemukan: donation");
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("email", validator::ValidationError::new("email"));

        let api = AppError::ValidationError(errors).to_api_error(&Locale("en".into()), &store());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.unwrap();
        assert_eq!(details["email"][0], "Invalid e-mail format.");
    }
}
