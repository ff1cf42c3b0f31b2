// src/models/donation.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::money::{check_fits_column, range_error};

pub const ANONYMOUS_DONOR_NAME: &str = "Hamba Allah";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "donation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Pending,
    Completed,
    Failed,
}

impl DonationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DonationStatus::Pending => "pending",
            DonationStatus::Completed => "completed",
            DonationStatus::Failed => "failed",
        }
    }

    /// Traduz o `transaction_status` do gateway.
    /// settlement | success -> completed; failed | cancelled -> failed; o resto não mexe.
    pub fn from_gateway(transaction_status: &str) -> Option<DonationStatus> {
        match transaction_status.trim().to_ascii_lowercase().as_str() {
            "settlement" | "success" => Some(DonationStatus::Completed),
            "failed" | "cancelled" => Some(DonationStatus::Failed),
            _ => None,
        }
    }

    /// Status resultante de uma notificação. Só doações `pending` mudam.
    pub fn after_notification(self, transaction_status: &str) -> DonationStatus {
        match (self, DonationStatus::from_gateway(transaction_status)) {
            (DonationStatus::Pending, Some(next)) => next,
            (current, _) => current,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Donation {
    pub id: Uuid,
    pub masjid_id: Uuid,
    #[schema(example = "DON-6f1c2a4e9b7d4c0f8a3e2b1d5c6a7f80")]
    pub order_id: String,
    pub donor_name: String,
    pub donor_email: Option<String>,
    pub donor_phone: Option<String>,
    #[schema(example = "50000.00")]
    pub amount: Decimal,
    pub message: Option<String>,
    pub is_anonymous: bool,
    #[schema(example = "Pembangunan menara")]
    pub purpose: Option<String>,
    pub status: DonationStatus,
    pub payment_token: Option<String>,
    pub redirect_url: Option<String>,
    pub gateway_status: Option<String>,
    pub payment_type: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

// O que a página pública do masjid mostra.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicDonation {
    pub donor_name: String,
    pub amount: Decimal,
    pub message: Option<String>,
    pub purpose: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Donation> for PublicDonation {
    fn from(d: Donation) -> Self {
        let donor_name = if d.is_anonymous {
            ANONYMOUS_DONOR_NAME.to_string()
        } else {
            d.donor_name
        };
        Self {
            donor_name,
            amount: d.amount,
            message: d.message,
            purpose: d.purpose,
            created_at: d.created_at,
        }
    }
}

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        return Err(range_error("amount_positive"));
    }
    check_fits_column(val)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDonationPayload {
    #[validate(length(min = 1, max = 120, message = "required"))]
    #[schema(example = "Siti Aminah")]
    pub donor_name: String,

    #[validate(email)]
    pub donor_email: Option<String>,

    #[validate(length(min = 6, max = 20, message = "length"))]
    pub donor_phone: Option<String>,

    #[validate(custom(function = "validate_positive"))]
    #[schema(value_type = f64, example = 50000)]
    pub amount: Decimal,

    #[validate(length(max = 500, message = "length"))]
    pub message: Option<String>,

    #[serde(default)]
    pub is_anonymous: bool,

    #[validate(length(max = 120, message = "length"))]
    pub purpose: Option<String>,
}

// Resposta do checkout: a doação criada + dados do Snap para o front-end.
#[derive(Debug, Serialize, ToSchema)]
pub struct DonationCheckout {
    pub donation: Donation,
    pub payment: PaymentInfo,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentInfo {
    pub token: String,
    pub redirect_url: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DonationFilter {
    pub status: Option<DonationStatus>,
    /// Criadas a partir de (YYYY-MM-DD).
    pub date_from: Option<NaiveDate>,
    /// Criadas até (YYYY-MM-DD), inclusive.
    pub date_to: Option<NaiveDate>,
    /// Busca em nome, e-mail e mensagem do doador.
    pub q: Option<String>,
}

// ---
// Notificação (webhook) do Midtrans
// ---
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MidtransNotification {
    pub order_id: String,
    #[schema(example = "settlement")]
    pub transaction_status: String,
    #[schema(example = "200")]
    pub status_code: Option<String>,
    #[schema(example = "50000.00")]
    pub gross_amount: Option<String>,
    pub signature_key: Option<String>,
    pub payment_type: Option<String>,
    pub transaction_id: Option<String>,
    pub fraud_status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationResult {
    pub order_id: String,
    pub status: DonationStatus,
    /// `false` quando a notificação não alterou o status.
    pub changed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_status_mapping_table() {
        let table = [
            ("settlement", DonationStatus::Completed),
            ("success", DonationStatus::Completed),
            ("SETTLEMENT", DonationStatus::Completed),
            ("failed", DonationStatus::Failed),
            ("cancelled", DonationStatus::Failed),
            ("pending", DonationStatus::Pending),
            ("capture", DonationStatus::Pending),
            ("expire", DonationStatus::Pending),
            ("deny", DonationStatus::Pending),
            ("", DonationStatus::Pending),
        ];

        for (input, expected) in table {
            assert_eq!(
                DonationStatus::Pending.after_notification(input),
                expected,
                "transaction_status = {input:?}"
            );
        }
    }

    #[test]
    fn terminal_donations_ignore_notifications() {
        assert_eq!(
            DonationStatus::Completed.after_notification("cancelled"),
            DonationStatus::Completed
        );
        assert_eq!(
            DonationStatus::Failed.after_notification("settlement"),
            DonationStatus::Failed
        );
    }

    #[test]
    fn anonymous_donor_is_masked_publicly() {
        let now = Utc::now();
        let donation = Donation {
            id: Uuid::new_v4(),
            masjid_id: Uuid::new_v4(),
            order_id: "DON-1".into(),
            donor_name: "Siti".into(),
            donor_email: None,
            donor_phone: None,
            amount: Decimal::new(50_000, 0),
            message: None,
            is_anonymous: true,
            purpose: None,
            status: DonationStatus::Completed,
            payment_token: None,
            redirect_url: None,
            gateway_status: Some("settlement".into()),
            payment_type: None,
            paid_at: Some(now),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let public = PublicDonation::from(donation);
        assert_eq!(public.donor_name, ANONYMOUS_DONOR_NAME);
    }

    #[test]
    fn amount_must_be_positive() {
        assert!(validate_positive(&Decimal::ZERO).is_err());
        assert!(validate_positive(&Decimal::new(1, 0)).is_ok());
    }

    #[test]
    fn oversized_or_overly_precise_amounts_are_rejected() {
        let huge = Decimal::new(1_000_000_000_000_000, 0);
        assert_eq!(
            validate_positive(&huge).unwrap_err().message.as_deref(),
            Some("amount_too_large")
        );
        assert!(validate_positive(&Decimal::new(50_001, 3)).is_err());
        assert!(validate_positive(&Decimal::new(5_000_050, 2)).is_ok());
    }
}
