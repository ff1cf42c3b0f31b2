// src/common/db_utils.rs

use crate::common::error::AppError;

// ---
// Tradução de erros de constraint do Postgres
// ---
// Usamos o tipo do erro (unique / foreign key / check) e o nome da constraint,
// nunca a mensagem do driver.
pub(crate) fn map_constraint_error<F>(e: sqlx::Error, on_unique: F) -> AppError
where
    F: FnOnce(&str) -> AppError,
{
    if let sqlx::Error::Database(db_err) = &e {
        let constraint = db_err.constraint().unwrap_or_default();
        if db_err.is_unique_violation() {
            return on_unique(constraint);
        }
        if db_err.is_foreign_key_violation() {
            return AppError::InvalidReference(constraint.to_string());
        }
        if db_err.is_check_violation() {
            return AppError::InvalidParam(constraint.to_string());
        }
    }
    e.into()
}

/// Atalho para o caso comum: qualquer unicidade vira 409 com o nome do recurso.
pub(crate) fn conflict_on_unique(resource: &'static str) -> impl FnOnce(&str) -> AppError {
    move |constraint: &str| {
        tracing::debug!("Violação de unicidade em '{}' ({})", constraint, resource);
        AppError::UniqueConstraintViolation(resource.to_string())
    }
}

pub(crate) fn not_found(resource: &str) -> AppError {
    AppError::ResourceNotFound(resource.to_string())
}
