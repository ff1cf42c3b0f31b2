// src/db/billing_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{conflict_on_unique, map_constraint_error},
        error::AppError,
        pagination::{Page, PageRequest},
        query::{fetch_page, push_scope, push_search, search_pattern, OrderBy},
    },
    models::billing::{BillingFilter, CreateBillingPayload, GeneralBilling, UpdateBillingPayload},
};

pub const BILLING_SORT_KEYS: &[(&str, &str)] = &[
    ("title", "title"),
    ("due_date", "due_date"),
    ("amount", "amount"),
    ("status", "status"),
    ("created_at", "created_at"),
];

#[derive(Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        masjid_id: Uuid,
        created_by: Uuid,
        payload: &CreateBillingPayload,
    ) -> Result<GeneralBilling, AppError> {
        sqlx::query_as::<_, GeneralBilling>(
            r#"
            INSERT INTO general_billings (
                masjid_id, category, code, title, description, due_date,
                amount, class_section_id, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(masjid_id)
        .bind(payload.category)
        .bind(payload.code.as_deref().map(str::trim))
        .bind(payload.title.trim())
        .bind(payload.description.as_deref())
        .bind(payload.due_date)
        .bind(payload.amount)
        .bind(payload.class_section_id)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, conflict_on_unique("billing_code")))
    }

    pub async fn find(&self, masjid_id: Uuid, id: Uuid) -> Result<Option<GeneralBilling>, AppError> {
        let row = sqlx::query_as::<_, GeneralBilling>(
            "SELECT * FROM general_billings WHERE masjid_id = $1 AND id = $2 AND deleted_at IS NULL",
        )
        .bind(masjid_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn lock<'e, E>(
        &self,
        executor: E,
        masjid_id: Uuid,
        id: Uuid,
    ) -> Result<Option<GeneralBilling>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, GeneralBilling>(
            r#"
            SELECT * FROM general_billings
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
        filter: &BillingFilter,
        include_deleted: bool,
        order: OrderBy,
        request: PageRequest,
    ) -> Result<Page<GeneralBilling>, AppError> {
        let pattern = search_pattern(filter.q.as_deref());

        let page = fetch_page(&self.pool, "general_billings", order, request, |qb| {
            push_scope(qb, "masjid_id", masjid_id, include_deleted);
            if let Some(status) = filter.status {
                qb.push(" AND status = ");
                qb.push_bind(status);
            }
            if let Some(category) = filter.category {
                qb.push(" AND category = ");
                qb.push_bind(category);
            }
            if let Some(section_id) = filter.class_section_id {
                qb.push(" AND class_section_id = ");
                qb.push_bind(section_id);
            }
            if let Some(from) = filter.due_from {
                qb.push(" AND due_date >= ");
                qb.push_bind(from);
            }
            if let Some(to) = filter.due_to {
                qb.push(" AND due_date <= ");
                qb.push_bind(to);
            }
            if let Some(pattern) = &pattern {
                push_search(qb, &["title", "code", "description"], pattern);
            }
        })
        .await?;
        Ok(page)
    }

    /// `title` e `amount` só chegam como `Missing`/`Value`; a transição de status
    /// já foi validada pelo serviço. `mark_paid` carimba `paid_at`.
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: UpdateBillingPayload,
        mark_paid: bool,
    ) -> Result<GeneralBilling, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (set_code, code) = changes.code.into_update();
        let (set_title, title) = changes.title.into_update();
        let (set_description, description) = changes.description.into_update();
        let (set_due, due_date) = changes.due_date.into_update();
        let (set_amount, amount) = changes.amount.into_update();
        let (set_section, class_section_id) = changes.class_section_id.into_update();

        sqlx::query_as::<_, GeneralBilling>(
            r#"
            UPDATE general_billings SET
                category         = COALESCE($2, category),
                code             = CASE WHEN $3  THEN $4  ELSE code END,
                title            = CASE WHEN $5  THEN $6  ELSE title END,
                description      = CASE WHEN $7  THEN $8  ELSE description END,
                due_date         = CASE WHEN $9  THEN $10 ELSE due_date END,
                amount           = CASE WHEN $11 THEN $12 ELSE amount END,
                class_section_id = CASE WHEN $13 THEN $14 ELSE class_section_id END,
                status           = COALESCE($15, status),
                paid_at          = CASE WHEN $16 THEN NOW() ELSE paid_at END,
                updated_at       = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.category)
        .bind(set_code)
        .bind(code)
        .bind(set_title)
        .bind(title)
        .bind(set_description)
        .bind(description)
        .bind(set_due)
        .bind(due_date)
        .bind(set_amount)
        .bind(amount)
        .bind(set_section)
        .bind(class_section_id)
        .bind(changes.status)
        .bind(mark_paid)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint_error(e, conflict_on_unique("billing_code")))
    }

    pub async fn soft_delete(&self, masjid_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE general_billings SET deleted_at = NOW(), updated_at = NOW()
            WHERE masjid_id = $1 AND id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(masjid_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
