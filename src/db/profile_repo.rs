// src/db/profile_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
        query::{fetch_page, push_scope, OrderBy},
    },
    models::profile::{ProfileDocument, UpdateProfilePayload, UserProfile},
};

pub const DOCUMENT_SORT_KEYS: &[(&str, &str)] = &[
    ("doc_type", "doc_type"),
    ("file_name", "file_name"),
    ("created_at", "created_at"),
];

// Dados de um arquivo já gravado no storage.
#[derive(Debug, Clone)]
pub struct NewDocument<'a> {
    pub doc_type: &'a str,
    pub file_name: &'a str,
    pub file_url: &'a str,
    pub file_key: &'a str,
    pub mime_type: Option<&'a str>,
    pub size_bytes: i64,
}

#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, AppError> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT * FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Upsert coluna a coluna: só os campos presentes no patch são gravados,
    /// sempre sobre a linha atual (o `ON CONFLICT` trava a linha existente).
    pub async fn patch_profile(
        &self,
        user_id: Uuid,
        changes: UpdateProfilePayload,
    ) -> Result<UserProfile, AppError> {
        let (set_full_name, full_name) = changes.full_name.into_update();
        let (set_gender, gender) = changes.gender.into_update();
        let (set_phone, phone) = changes.phone.into_update();
        let (set_birth, date_of_birth) = changes.date_of_birth.into_update();
        let (set_address, address) = changes.address.into_update();
        let (set_bio, bio) = changes.bio.into_update();
        let (set_avatar, avatar_url) = changes.avatar_url.into_update();

        let saved = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles AS p (
                user_id, full_name, gender, phone, date_of_birth, address, bio, avatar_url
            )
            VALUES ($1, $3, $5, $7, $9, $11, $13, $15)
            ON CONFLICT (user_id) DO UPDATE SET
                full_name     = CASE WHEN $2  THEN EXCLUDED.full_name     ELSE p.full_name END,
                gender        = CASE WHEN $4  THEN EXCLUDED.gender        ELSE p.gender END,
                phone         = CASE WHEN $6  THEN EXCLUDED.phone         ELSE p.phone END,
                date_of_birth = CASE WHEN $8  THEN EXCLUDED.date_of_birth ELSE p.date_of_birth END,
                address       = CASE WHEN $10 THEN EXCLUDED.address       ELSE p.address END,
                bio           = CASE WHEN $12 THEN EXCLUDED.bio           ELSE p.bio END,
                avatar_url    = CASE WHEN $14 THEN EXCLUDED.avatar_url    ELSE p.avatar_url END,
                updated_at    = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(set_full_name)
        .bind(full_name)
        .bind(set_gender)
        .bind(gender)
        .bind(set_phone)
        .bind(phone)
        .bind(set_birth)
        .bind(date_of_birth)
        .bind(set_address)
        .bind(address)
        .bind(set_bio)
        .bind(bio)
        .bind(set_avatar)
        .bind(avatar_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    pub async fn create_document(
        &self,
        user_id: Uuid,
        doc: NewDocument<'_>,
    ) -> Result<ProfileDocument, AppError> {
        let row = sqlx::query_as::<_, ProfileDocument>(
            r#"
            INSERT INTO user_profile_documents (
                user_id, doc_type, file_name, file_url, file_key, mime_type, size_bytes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(doc.doc_type)
        .bind(doc.file_name)
        .bind(doc.file_url)
        .bind(doc.file_key)
        .bind(doc.mime_type)
        .bind(doc.size_bytes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_documents(
        &self,
        user_id: Uuid,
        include_deleted: bool,
        order: OrderBy,
        request: PageRequest,
    ) -> Result<Page<ProfileDocument>, AppError> {
        let page = fetch_page(&self.pool, "user_profile_documents", order, request, |qb| {
            push_scope(qb, "user_id", user_id, include_deleted);
        })
        .await?;
        Ok(page)
    }

    pub async fn soft_delete_document(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE user_profile_documents SET deleted_at = NOW(), updated_at = NOW()
            WHERE user_id = $1 AND id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
