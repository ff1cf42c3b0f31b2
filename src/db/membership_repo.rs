// src/db/membership_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::map_constraint_error,
        error::AppError,
        pagination::{Page, PageRequest},
        query::{fetch_page, push_scope, push_search, search_pattern, OrderBy},
    },
    models::{
        auth::User,
        membership::{AdminFilter, MasjidAdmin, MasjidRole},
    },
};

pub const ADMIN_SORT_KEYS: &[(&str, &str)] = &[
    ("email", "user_email_snapshot"),
    ("name", "user_name_snapshot"),
    ("role", "role"),
    ("created_at", "created_at"),
];

#[derive(Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cargo do usuário no masjid, se ele for membro ativo (e não removido).
    /// É a checagem de autorização usada pelo `tenant_guard`.
    pub async fn find_active_role(
        &self,
        user_id: Uuid,
        masjid_id: Uuid,
    ) -> Result<Option<MasjidRole>, AppError> {
        let role = sqlx::query_scalar::<_, MasjidRole>(
            r#"
            SELECT role FROM masjid_admins
            WHERE user_id = $1
              AND masjid_id = $2
              AND is_active = TRUE
              AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(masjid_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    /// Cria o vínculo gravando o snapshot de e-mail/nome do usuário.
    pub async fn create<'e, E>(
        &self,
        executor: E,
        masjid_id: Uuid,
        user: &User,
        role: MasjidRole,
    ) -> Result<MasjidAdmin, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, MasjidAdmin>(
            r#"
            INSERT INTO masjid_admins (masjid_id, user_id, role, user_email_snapshot, user_name_snapshot)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(masjid_id)
        .bind(user.id)
        .bind(role)
        .bind(&user.email)
        .bind(&user.full_name)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_constraint_error(e, |constraint| match constraint {
                "masjid_admins_member_live_key" => {
                    AppError::UniqueConstraintViolation("masjid_admin".into())
                }
                other => AppError::UniqueConstraintViolation(other.to_string()),
            })
        })
    }

    /// `SELECT ... FOR UPDATE`: use dentro de uma transação.
    pub async fn lock<'e, E>(
        &self,
        executor: E,
        masjid_id: Uuid,
        id: Uuid,
    ) -> Result<Option<MasjidAdmin>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, MasjidAdmin>(
            r#"
            SELECT * FROM masjid_admins
            WHERE masjid_id = $1 AND id = $2 AND deleted_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(masjid_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn list(
        &self,
        masjid_id: Uuid,
        filter: &AdminFilter,
        include_deleted: bool,
        order: OrderBy,
        request: PageRequest,
    ) -> Result<Page<MasjidAdmin>, AppError> {
        let pattern = search_pattern(filter.q.as_deref());

        let page = fetch_page(&self.pool, "masjid_admins", order, request, |qb| {
            push_scope(qb, "masjid_id", masjid_id, include_deleted);
            if let Some(role) = filter.role {
                qb.push(" AND role = ");
                qb.push_bind(role);
            }
            if let Some(is_active) = filter.is_active {
                qb.push(" AND is_active = ");
                qb.push_bind(is_active);
            }
            if let Some(pattern) = &pattern {
                push_search(qb, &["user_email_snapshot", "user_name_snapshot"], pattern);
            }
        })
        .await?;
        Ok(page)
    }

    pub async fn update_role<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        role: MasjidRole,
    ) -> Result<MasjidAdmin, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, MasjidAdmin>(
            "UPDATE masjid_admins SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn set_active<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        is_active: bool,
    ) -> Result<MasjidAdmin, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, MasjidAdmin>(
            "UPDATE masjid_admins SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_active)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn soft_delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE masjid_admins SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
