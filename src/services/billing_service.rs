// src/services/billing_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::not_found,
        error::AppError,
        pagination::{Page, PageQuery, PageRequest, MAX_PAGE_SIZE_LARGE},
        patch::Patch,
        query::OrderBy,
    },
    db::{billing_repo::BILLING_SORT_KEYS, BillingRepository},
    models::billing::{
        validate_not_negative, BillingFilter, BillingStatus, CreateBillingPayload, GeneralBilling,
        UpdateBillingPayload,
    },
    services::academic_service::AcademicService,
};

#[derive(Clone)]
pub struct BillingService {
    pool: PgPool,
    repo: BillingRepository,
    academic: AcademicService,
}

impl BillingService {
    pub fn new(pool: PgPool, repo: BillingRepository, academic: AcademicService) -> Self {
        Self { pool, repo, academic }
    }

    pub async fn create(
        &self,
        masjid_id: Uuid,
        created_by: Uuid,
        payload: &CreateBillingPayload,
    ) -> Result<GeneralBilling, AppError> {
        if let Some(section_id) = payload.class_section_id {
            self.ensure_class_section(masjid_id, section_id).await?;
        }

        let billing = self.repo.create(masjid_id, created_by, payload).await?;
        tracing::info!("Cobrança {} criada no masjid {}", billing.id, masjid_id);
        Ok(billing)
    }

    pub async fn list(
        &self,
        masjid_id: Uuid,
        filter: &BillingFilter,
        query: &PageQuery,
    ) -> Result<(Page<GeneralBilling>, PageRequest), AppError> {
        let request = query.resolve(MAX_PAGE_SIZE_LARGE);
        let order = OrderBy::resolve(BILLING_SORT_KEYS, query.sort_by.as_deref(), query.order.as_deref());
        let page = self
            .repo
            .list(masjid_id, filter, query.include_deleted, order, request)
            .await?;
        Ok((page, request))
    }

    pub async fn get(&self, masjid_id: Uuid, id: Uuid) -> Result<GeneralBilling, AppError> {
        self.repo
            .find(masjid_id, id)
            .await?
            .ok_or_else(|| not_found("billing"))
    }

    /// Valida o patch contra a linha travada e aplica.
    /// unpaid -> paid carimba `paid_at`; qualquer outra transição é 400.
    pub async fn update(
        &self,
        masjid_id: Uuid,
        id: Uuid,
        payload: UpdateBillingPayload,
    ) -> Result<GeneralBilling, AppError> {
        let changes = normalize_billing_changes(payload)?;
        if let Some(section_id) = changes.class_section_id.as_value() {
            self.ensure_class_section(masjid_id, *section_id).await?;
        }

        let mut tx = self.pool.begin().await?;

        let current = self
            .repo
            .lock(&mut *tx, masjid_id, id)
            .await?
            .ok_or_else(|| not_found("billing"))?;

        let mark_paid = match changes.status {
            Some(next) => check_transition(current.status, next)?,
            None => false,
        };

        let updated = self.repo.update(&mut *tx, id, changes, mark_paid).await?;

        tx.commit().await?;

        if updated.status != current.status {
            tracing::info!(
                "Cobrança {}: {} -> {}",
                updated.id,
                current.status.as_str(),
                updated.status.as_str()
            );
        }
        Ok(updated)
    }

    pub async fn delete(&self, masjid_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.repo.soft_delete(masjid_id, id).await? {
            return Err(not_found("billing"));
        }
        Ok(())
    }

    async fn ensure_class_section(&self, masjid_id: Uuid, section_id: Uuid) -> Result<(), AppError> {
        self.academic
            .find_class_section(masjid_id, section_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::InvalidReference("class_section_id".into()))
    }
}

/// `Ok(true)` quando a transição marca a cobrança como paga agora.
fn check_transition(current: BillingStatus, next: BillingStatus) -> Result<bool, AppError> {
    if !current.can_transition_to(next) {
        return Err(AppError::InvalidStatusTransition {
            from: current.as_str().into(),
            to: next.as_str().into(),
        });
    }
    Ok(current != next && next == BillingStatus::Paid)
}

/// Aplica ao PATCH as regras do payload de criação.
fn normalize_billing_changes(payload: UpdateBillingPayload) -> Result<UpdateBillingPayload, AppError> {
    let title = match payload.title.trimmed().max_chars("title", 200)?.require_value("title")? {
        Some(t) if t.is_empty() => return Err(AppError::InvalidParam("title".into())),
        Some(t) => Patch::Value(t),
        None => Patch::Missing,
    };
    let amount = match payload.amount.require_value("amount")? {
        Some(a) => {
            validate_not_negative(&a).map_err(|_| AppError::InvalidParam("amount".into()))?;
            Patch::Value(a)
        }
        None => Patch::Missing,
    };
    Ok(UpdateBillingPayload {
        title,
        amount,
        code: payload.code.blank_as_null().max_chars("code", 50)?,
        ..payload
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn paying_an_unpaid_billing_stamps_paid_at() {
        assert!(check_transition(BillingStatus::Unpaid, BillingStatus::Paid).unwrap());
        assert!(!check_transition(BillingStatus::Unpaid, BillingStatus::Canceled).unwrap());
        // repetir o status não recarimba
        assert!(!check_transition(BillingStatus::Paid, BillingStatus::Paid).unwrap());
    }

    #[test]
    fn leaving_a_terminal_status_is_rejected() {
        let err = check_transition(BillingStatus::Canceled, BillingStatus::Paid).unwrap_err();
        assert!(matches!(err, AppError::InvalidStatusTransition { .. }));
        assert!(check_transition(BillingStatus::Paid, BillingStatus::Unpaid).is_err());
    }

    #[test]
    fn blank_code_clears_the_column() {
        let payload = UpdateBillingPayload {
            code: Patch::Value("  ".into()),
            ..UpdateBillingPayload::default()
        };
        let changes = normalize_billing_changes(payload).unwrap();
        assert_eq!(changes.code, Patch::Null);
        assert!(changes.title.is_missing());
    }

    #[test]
    fn patched_amount_must_fit_the_column() {
        for amount in [Decimal::new(-1, 0), Decimal::new(1, 3), Decimal::from(1_000_000_000_000_i64)] {
            let payload = UpdateBillingPayload {
                amount: Patch::Value(amount),
                ..UpdateBillingPayload::default()
            };
            let err = normalize_billing_changes(payload).unwrap_err();
            assert!(matches!(err, AppError::InvalidParam(ref f) if f == "amount"));
        }

        let payload = UpdateBillingPayload {
            amount: Patch::Value(Decimal::new(15_000_050, 2)),
            ..UpdateBillingPayload::default()
        };
        assert!(normalize_billing_changes(payload).is_ok());
    }

    #[test]
    fn overlong_or_blank_title_is_rejected() {
        let blank = UpdateBillingPayload {
            title: Patch::Value(" ".into()),
            ..UpdateBillingPayload::default()
        };
        assert!(normalize_billing_changes(blank).is_err());

        let long = UpdateBillingPayload {
            title: Patch::Value("x".repeat(201)),
            ..UpdateBillingPayload::default()
        };
        assert!(normalize_billing_changes(long).is_err());
    }
}
