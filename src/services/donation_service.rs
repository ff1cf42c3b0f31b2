// src/services/donation_service.rs

use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::not_found,
        error::AppError,
        pagination::{Page, PageQuery, PageRequest, MAX_PAGE_SIZE},
        query::OrderBy,
    },
    db::{donation_repo::DONATION_SORT_KEYS, DonationRepository},
    models::donation::{
        CreateDonationPayload, Donation, DonationCheckout, DonationFilter, MidtransNotification,
        NotificationResult, PaymentInfo, PublicDonation,
    },
    services::{
        masjid_service::MasjidService,
        payment_gateway::{CheckoutRequest, PaymentGateway},
    },
};

#[derive(Clone)]
pub struct DonationService {
    pool: PgPool,
    repo: DonationRepository,
    masjids: MasjidService,
    gateway: Arc<dyn PaymentGateway>,
    verify_signature: bool,
}

impl DonationService {
    pub fn new(
        pool: PgPool,
        repo: DonationRepository,
        masjids: MasjidService,
        gateway: Arc<dyn PaymentGateway>,
        verify_signature: bool,
    ) -> Self {
        Self {
            pool,
            repo,
            masjids,
            gateway,
            verify_signature,
        }
    }

    /// Cria a doação `pending` e abre o checkout no gateway.
    /// Se o gateway falhar, a doação fica `failed` e o erro sobe como 502.
    pub async fn create_public(
        &self,
        slug: &str,
        payload: &CreateDonationPayload,
    ) -> Result<DonationCheckout, AppError> {
        payload.validate()?;

        // O Snap só aceita rupias inteiras.
        let gross_amount = payload
            .amount
            .round()
            .to_i64()
            .ok_or_else(|| AppError::InvalidParam("amount".into()))?;

        let masjid = self.masjids.get_public(slug).await?;

        let order_id = format!("DON-{}", Uuid::new_v4().simple());
        let donation = self.repo.create_pending(masjid.id, &order_id, payload).await?;

        let request = CheckoutRequest {
            order_id: donation.order_id.clone(),
            gross_amount,
            item_name: donation
                .purpose
                .clone()
                .unwrap_or_else(|| format!("Donasi {}", masjid.name)),
            customer_name: donation.donor_name.clone(),
            customer_email: donation.donor_email.clone(),
            customer_phone: donation.donor_phone.clone(),
        };

        let session = match self.gateway.create_checkout(&request).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Checkout falhou para {}: {}", donation.order_id, e);
                self.repo.mark_failed(donation.id).await?;
                return Err(e);
            }
        };

        let donation = self
            .repo
            .attach_payment(donation.id, &session.token, &session.redirect_url)
            .await?;

        tracing::info!("Doação {} aberta para o masjid {}", donation.order_id, masjid.id);

        Ok(DonationCheckout {
            donation,
            payment: PaymentInfo {
                token: session.token,
                redirect_url: session.redirect_url,
            },
        })
    }

    pub async fn list_public(
        &self,
        slug: &str,
        query: &PageQuery,
    ) -> Result<(Page<PublicDonation>, PageRequest), AppError> {
        let masjid = self.masjids.get_public(slug).await?;
        let request = query.resolve(MAX_PAGE_SIZE);
        let order = OrderBy::resolve(DONATION_SORT_KEYS, query.sort_by.as_deref(), query.order.as_deref());

        let page = self.repo.list_completed(masjid.id, order, request).await?;
        let page = Page {
            items: page.items.into_iter().map(PublicDonation::from).collect(),
            total: page.total,
        };
        Ok((page, request))
    }

    /// Webhook do Midtrans. Só doações `pending` mudam de status; o resto é ignorado.
    pub async fn handle_notification(
        &self,
        notification: &MidtransNotification,
    ) -> Result<NotificationResult, AppError> {
        if self.verify_signature && !self.gateway.verify_notification(notification) {
            tracing::warn!("Assinatura inválida na notificação de {}", notification.order_id);
            return Err(AppError::InvalidSignature);
        }

        let mut tx = self.pool.begin().await?;

        let current = self
            .repo
            .lock_by_order_id(&mut *tx, &notification.order_id)
            .await?
            .ok_or_else(|| not_found("donation"))?;

        let next = current.status.after_notification(&notification.transaction_status);
        if next == current.status {
            tx.commit().await?;
            tracing::info!(
                "Notificação '{}' ignorada para {} (status {})",
                notification.transaction_status,
                current.order_id,
                current.status.as_str()
            );
            return Ok(NotificationResult {
                order_id: current.order_id,
                status: current.status,
                changed: false,
            });
        }

        let updated = self
            .repo
            .apply_notification(
                &mut *tx,
                current.id,
                next,
                notification.transaction_status.trim(),
                notification.payment_type.as_deref(),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Doação {}: {} -> {}",
            updated.order_id,
            current.status.as_str(),
            updated.status.as_str()
        );

        Ok(NotificationResult {
            order_id: updated.order_id,
            status: updated.status,
            changed: true,
        })
    }

    pub async fn list(
        &self,
        masjid_id: Uuid,
        filter: &DonationFilter,
        query: &PageQuery,
    ) -> Result<(Page<Donation>, PageRequest), AppError> {
        let request = query.resolve(MAX_PAGE_SIZE);
        let order = OrderBy::resolve(DONATION_SORT_KEYS, query.sort_by.as_deref(), query.order.as_deref());
        let page = self
            .repo
            .list(masjid_id, filter, query.include_deleted, order, request)
            .await?;
        Ok((page, request))
    }

    pub async fn get(&self, masjid_id: Uuid, id: Uuid) -> Result<Donation, AppError> {
        self.repo
            .find(masjid_id, id)
            .await?
            .ok_or_else(|| not_found("donation"))
    }

    pub async fn delete(&self, masjid_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.repo.soft_delete(masjid_id, id).await? {
            return Err(not_found("donation"));
        }
        Ok(())
    }
}
