// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        AcademicRepository, BillingRepository, DonationRepository, MasjidRepository,
        MembershipRepository, ProfileRepository, UserRepository,
    },
    services::{
        academic_service::AcademicService,
        auth::AuthService,
        billing_service::BillingService,
        donation_service::DonationService,
        masjid_service::MasjidService,
        payment_gateway::{MidtransGateway, PaymentGateway},
        profile_service::ProfileService,
        storage::{LocalDiskStorage, ObjectStorage},
    },
};

const DEFAULT_UPLOAD_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_days: i64,
    pub host: String,
    pub port: u16,
    pub midtrans_server_key: String,
    pub midtrans_is_production: bool,
    pub midtrans_verify_signature: bool,
    pub storage_dir: String,
    pub storage_public_url: String,
    pub upload_max_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave -> valor.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => bail!("{key} deve ser definida"),
            }
        };
        let string_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_ttl_days: parse_or(&lookup, "JWT_TTL_DAYS", 7)?,
            host: string_or("APP_HOST", "0.0.0.0"),
            port: parse_or(&lookup, "APP_PORT", 3000)?,
            midtrans_server_key: string_or("MIDTRANS_SERVER_KEY", ""),
            midtrans_is_production: parse_or(&lookup, "MIDTRANS_IS_PRODUCTION", false)?,
            midtrans_verify_signature: parse_or(&lookup, "MIDTRANS_VERIFY_SIGNATURE", true)?,
            storage_dir: string_or("STORAGE_DIR", "./uploads"),
            storage_public_url: string_or("STORAGE_PUBLIC_URL", "/uploads"),
            upload_max_bytes: parse_or(&lookup, "UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES)?,
        };

        if config.jwt_ttl_days <= 0 {
            bail!("JWT_TTL_DAYS deve ser positivo");
        }
        if config.midtrans_verify_signature && config.midtrans_server_key.is_empty() {
            tracing::warn!("MIDTRANS_SERVER_KEY vazia: notificações do Midtrans serão rejeitadas");
        }
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Valor inválido para {key}: '{raw}'")),
        _ => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<AppConfig>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub masjid_service: MasjidService,
    pub academic_service: AcademicService,
    pub billing_service: BillingService,
    pub donation_service: DonationService,
    pub profile_service: ProfileService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let gateway = MidtransGateway::new(
            config.midtrans_server_key.clone(),
            config.midtrans_is_production,
        )?;
        let storage = LocalDiskStorage::new(&config.storage_dir, &config.storage_public_url);

        Self::from_parts(config, db_pool, Arc::new(gateway), Arc::new(storage))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_parts(
        config: AppConfig,
        db_pool: PgPool,
        gateway: Arc<dyn PaymentGateway>,
        storage: Arc<dyn ObjectStorage>,
    ) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load_embedded()?);

        let user_repo = UserRepository::new(db_pool.clone());
        let masjid_repo = MasjidRepository::new(db_pool.clone());
        let membership_repo = MembershipRepository::new(db_pool.clone());
        let academic_repo = AcademicRepository::new(db_pool.clone());
        let billing_repo = BillingRepository::new(db_pool.clone());
        let donation_repo = DonationRepository::new(db_pool.clone());
        let profile_repo = ProfileRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_days,
            db_pool.clone(),
        );
        let masjid_service =
            MasjidService::new(db_pool.clone(), masjid_repo, membership_repo, user_repo);
        let academic_service = AcademicService::new(db_pool.clone(), academic_repo);
        let billing_service =
            BillingService::new(db_pool.clone(), billing_repo, academic_service.clone());
        let donation_service = DonationService::new(
            db_pool.clone(),
            donation_repo,
            masjid_service.clone(),
            gateway,
            config.midtrans_verify_signature,
        );
        let profile_service = ProfileService::new(profile_repo, storage, config.upload_max_bytes);

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store,
            auth_service,
            masjid_service,
            academic_service,
            billing_service,
            donation_service,
            profile_service,
        })
    }
}
