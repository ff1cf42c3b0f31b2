// src/db/donation_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{conflict_on_unique, map_constraint_error},
        error::AppError,
        pagination::{Page, PageRequest},
        query::{fetch_page, push_scope, push_search, search_pattern, OrderBy},
    },
    models::donation::{CreateDonationPayload, Donation, DonationFilter, DonationStatus},
};

pub const DONATION_SORT_KEYS: &[(&str, &str)] = &[
    ("amount", "amount"),
    ("donor_name", "donor_name"),
    ("created_at", "created_at"),
];

#[derive(Clone)]
pub struct DonationRepository {
    pool: PgPool,
}

impl DonationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_pending(
        &self,
        masjid_id: Uuid,
        order_id: &str,
        payload: &CreateDonationPayload,
    ) -> Result<Donation, AppError> {
        sqlx::query_as::<_, Donation>(
            r#"
            INSERT INTO donations (
                masjid_id, order_id, donor_name, donor_email, donor_phone,
                amount, message, is_anonymous, purpose
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(masjid_id)
        .bind(order_id)
        .bind(payload.donor_name.trim())
        .bind(payload.donor_email.as_deref().map(str::trim))
        .bind(payload.donor_phone.as_deref().map(str::trim))
        .bind(payload.amount)
        .bind(payload.message.as_deref())
        .bind(payload.is_anonymous)
        .bind(payload.purpose.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, conflict_on_unique("order_id")))
    }

    /// Guarda o token/URL do checkout devolvidos pelo gateway.
    pub async fn attach_payment(
        &self,
        id: Uuid,
        token: &str,
        redirect_url: &str,
    ) -> Result<Donation, AppError> {
        let row = sqlx::query_as::<_, Donation>(
            r#"
            UPDATE donations
            SET payment_token = $2, redirect_url = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(redirect_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn mark_failed(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE donations SET status = 'failed', updated_at = NOW() WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find(&self, masjid_id: Uuid, id: Uuid) -> Result<Option<Donation>, AppError> {
        let row = sqlx::query_as::<_, Donation>(
            "SELECT * FROM donations WHERE masjid_id = $1 AND id = $2 AND deleted_at IS NULL",
        )
        .bind(masjid_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Trava a doação pelo `order_id` (webhook). Use dentro de uma transação.
    pub async fn lock_by_order_id<'e, E>(
        &self,
        executor: E,
        order_id: &str,
    ) -> Result<Option<Donation>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Donation>(
            "SELECT * FROM donations WHERE order_id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Grava o resultado de uma notificação. `paid_at` só é carimbado na conclusão.
    pub async fn apply_notification<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: DonationStatus,
        gateway_status: &str,
        payment_type: Option<&str>,
    ) -> Result<Donation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Donation>(
            r#"
            UPDATE donations SET
                status         = $2,
                gateway_status = $3,
                payment_type   = COALESCE($4, payment_type),
                paid_at        = CASE WHEN $2 = 'completed'::donation_status THEN NOW() ELSE paid_at END,
                updated_at     = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(gateway_status)
        .bind(payment_type)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn list(
        &self,
        masjid_id: Uuid,
        filter: &DonationFilter,
        include_deleted: bool,
        order: OrderBy,
        request: PageRequest,
    ) -> Result<Page<Donation>, AppError> {
        let pattern = search_pattern(filter.q.as_deref());
        // `date_to` é inclusivo: compara com o início do dia seguinte.
        let until = filter.date_to.and_then(|d| d.succ_opt());

        let page = fetch_page(&self.pool, "donations", order, request, |qb| {
            push_scope(qb, "masjid_id", masjid_id, include_deleted);
            if let Some(status) = filter.status {
                qb.push(" AND status = ");
                qb.push_bind(status);
            }
            if let Some(from) = filter.date_from {
                qb.push(" AND created_at >= ");
                qb.push_bind(from);
            }
            if let Some(until) = until {
                qb.push(" AND created_at < ");
                qb.push_bind(until);
            }
            if let Some(pattern) = &pattern {
                push_search(qb, &["donor_name", "donor_email", "message"], pattern);
            }
        })
        .await?;
        Ok(page)
    }

    /// Doações concluídas para a página pública do masjid.
    pub async fn list_completed(
        &self,
        masjid_id: Uuid,
        order: OrderBy,
        request: PageRequest,
    ) -> Result<Page<Donation>, AppError> {
        let page = fetch_page(&self.pool, "donations", order, request, |qb| {
            push_scope(qb, "masjid_id", masjid_id, false);
            qb.push(" AND status = ");
            qb.push_bind(DonationStatus::Completed);
        })
        .await?;
        Ok(page)
    }

    pub async fn soft_delete(&self, masjid_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE donations SET deleted_at = NOW(), updated_at = NOW()
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
