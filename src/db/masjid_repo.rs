// src/db/masjid_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::map_constraint_error,
        error::AppError,
        pagination::{Page, PageRequest},
        query::{fetch_page, push_search, search_pattern, OrderBy},
    },
    models::masjid::{CreateMasjidPayload, Masjid, MasjidFilter, MyMasjid, UpdateMasjidPayload},
};

pub const MASJID_SORT_KEYS: &[(&str, &str)] = &[
    ("name", "name"),
    ("city", "city"),
    ("created_at", "created_at"),
];

fn map_masjid_unique(constraint: &str) -> AppError {
    match constraint {
        "masjids_slug_live_key" => AppError::UniqueConstraintViolation("slug".into()),
        "masjids_domain_live_key" => AppError::UniqueConstraintViolation("domain".into()),
        other => AppError::UniqueConstraintViolation(other.to_string()),
    }
}

#[derive(Clone)]
pub struct MasjidRepository {
    pool: PgPool,
}

impl MasjidRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cria o masjid. `slug` e `domain` já chegam normalizados pelo serviço.
    pub async fn create<'e, E>(
        &self,
        executor: E,
        payload: &CreateMasjidPayload,
        slug: &str,
        domain: Option<&str>,
    ) -> Result<Masjid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Masjid>(
            r#"
            INSERT INTO masjids (name, slug, domain, city, address, phone, bio, logo_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(payload.name.trim())
        .bind(slug)
        .bind(domain)
        .bind(payload.city.as_deref())
        .bind(payload.address.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.bio.as_deref())
        .bind(payload.logo_url.as_deref())
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, map_masjid_unique))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Masjid>, AppError> {
        let masjid = sqlx::query_as::<_, Masjid>(
            "SELECT * FROM masjids WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(masjid)
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Masjid>, AppError> {
        let masjid = sqlx::query_as::<_, Masjid>(
            "SELECT * FROM masjids WHERE slug = LOWER($1) AND deleted_at IS NULL",
        )
        .bind(slug.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(masjid)
    }

    /// Listagem pública: só masjids ativos e não removidos.
    pub async fn list_public(
        &self,
        filter: &MasjidFilter,
        order: OrderBy,
        request: PageRequest,
    ) -> Result<Page<Masjid>, AppError> {
        let pattern = search_pattern(filter.q.as_deref());
        let city = filter
            .city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_lowercase);

        let page = fetch_page(&self.pool, "masjids", order, request, |qb| {
            qb.push(" WHERE deleted_at IS NULL AND is_active = TRUE");
            if let Some(city) = &city {
                qb.push(" AND LOWER(city) = ");
                qb.push_bind(city.clone());
            }
            if let Some(pattern) = &pattern {
                push_search(qb, &["name", "slug", "city"], pattern);
            }
        })
        .await?;
        Ok(page)
    }

    /// Masjids onde o usuário é membro ativo, com o cargo dele.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<MyMasjid>, AppError> {
        let rows = sqlx::query_as::<_, MyMasjid>(
            r#"
            SELECT m.*, ma.role
            FROM masjids m
            INNER JOIN masjid_admins ma ON ma.masjid_id = m.id
            WHERE ma.user_id = $1
              AND ma.is_active = TRUE
              AND ma.deleted_at IS NULL
              AND m.deleted_at IS NULL
            ORDER BY m.name ASC, m.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// PATCH tri-state. `name` e `slug` só chegam aqui como `Missing` ou `Value`.
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: UpdateMasjidPayload,
    ) -> Result<Option<Masjid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (set_name, name) = changes.name.into_update();
        let (set_slug, slug) = changes.slug.into_update();
        let (set_domain, domain) = changes.domain.into_update();
        let (set_city, city) = changes.city.into_update();
        let (set_address, address) = changes.address.into_update();
        let (set_phone, phone) = changes.phone.into_update();
        let (set_bio, bio) = changes.bio.into_update();
        let (set_logo, logo_url) = changes.logo_url.into_update();

        sqlx::query_as::<_, Masjid>(
            r#"
            UPDATE masjids SET
                name     = CASE WHEN $2  THEN $3  ELSE name END,
                slug     = CASE WHEN $4  THEN $5  ELSE slug END,
                domain   = CASE WHEN $6  THEN $7  ELSE domain END,
                city     = CASE WHEN $8  THEN $9  ELSE city END,
                address  = CASE WHEN $10 THEN $11 ELSE address END,
                phone    = CASE WHEN $12 THEN $13 ELSE phone END,
                bio      = CASE WHEN $14 THEN $15 ELSE bio END,
                logo_url = CASE WHEN $16 THEN $17 ELSE logo_url END,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(set_name)
        .bind(name)
        .bind(set_slug)
        .bind(slug)
        .bind(set_domain)
        .bind(domain)
        .bind(set_city)
        .bind(city)
        .bind(set_address)
        .bind(address)
        .bind(set_phone)
        .bind(phone)
        .bind(set_bio)
        .bind(bio)
        .bind(set_logo)
        .bind(logo_url)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint_error(e, map_masjid_unique))
    }

    pub async fn soft_delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE masjids SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
