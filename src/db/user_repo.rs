// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_constraint_error, error::AppError},
    models::auth::User,
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // E-mail é comparado em minúsculas (o serviço já normaliza na gravação)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, full_name, created_at, updated_at
            FROM users
            WHERE email = LOWER($1)
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, full_name, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    // Cria um novo usuário. E-mail duplicado vira `EmailAlreadyExists`.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        email: &str,
        password_hash: &str,
        full_name: &str,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, full_name)
            VALUES (LOWER($1), $2, $3)
            RETURNING id, email, password_hash, full_name, created_at, updated_at
            "#,
        )
        .bind(email.trim())
        .bind(password_hash)
        .bind(full_name.trim())
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_constraint_error(e, |constraint| match constraint {
                "users_email_key" => AppError::EmailAlreadyExists,
                other => AppError::UniqueConstraintViolation(other.to_string()),
            })
        })
    }
}
