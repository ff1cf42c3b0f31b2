// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, RegisterUserPayload, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    token_ttl_days: i64,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, token_ttl_days: i64, pool: PgPool) -> Self {
        Self {
            user_repo,
            jwt_secret,
            token_ttl_days,
            pool,
        }
    }

    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<String, AppError> {
        // 1. Hashing fora do executor assíncrono
        let password_clone = payload.password.clone();
        let hashed_password = tokio::task::spawn_blocking(move || {
            hash(&password_clone, bcrypt::DEFAULT_COST)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        // 2. Cria o usuário
        let new_user = self
            .user_repo
            .create_user(&self.pool, &payload.email, &hashed_password, &payload.full_name)
            .await?;

        tracing::info!("Novo usuário registrado: {}", new_user.id);

        // 3. Gera o token
        self.create_token(&new_user)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(&user)
    }

    /// Só confere assinatura e expiração; não consulta o banco.
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(self.token_ttl_days);

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn service(ttl_days: i64) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        AuthService::new(UserRepository::new(pool.clone()), "segredo".into(), ttl_days, pool)
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ahmad@example.com".into(),
            password_hash: String::new(),
            full_name: "Ahmad".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_round_trips_claims() {
        let svc = service(7);
        let user = user();
        let token = svc.create_token(&user).unwrap();

        let claims = svc.decode_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn expired_or_foreign_tokens_are_rejected() {
        let svc = service(-2);
        let token = svc.create_token(&user()).unwrap();
        assert!(matches!(svc.decode_token(&token), Err(AppError::InvalidToken)));

        assert!(matches!(service(7).decode_token("nao.e.jwt"), Err(AppError::InvalidToken)));
    }
}
