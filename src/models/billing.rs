// src/models/billing.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::{
    money::{check_fits_column, range_error},
    patch::Patch,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "billing_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BillingStatus {
    Unpaid,
    Paid,
    Canceled,
}

impl BillingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BillingStatus::Unpaid => "unpaid",
            BillingStatus::Paid => "paid",
            BillingStatus::Canceled => "canceled",
        }
    }

    /// unpaid -> paid | canceled. `paid` e `canceled` são finais.
    /// Repetir o status atual não é transição (no-op).
    pub fn can_transition_to(self, next: BillingStatus) -> bool {
        self == next
            || matches!(
                (self, next),
                (BillingStatus::Unpaid, BillingStatus::Paid)
                    | (BillingStatus::Unpaid, BillingStatus::Canceled)
            )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "billing_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BillingCategory {
    Spp, // mensalidade escolar
    Registration,
    Donation,
    Event,
    Other,
}

// ---
// Cobrança geral (modelo único para todos os tenants)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GeneralBilling {
    pub id: Uuid,
    pub masjid_id: Uuid,
    pub category: BillingCategory,
    #[schema(example = "SPP-2025-07")]
    pub code: Option<String>,
    #[schema(example = "SPP Juli 2025")]
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[schema(example = "150000.00")]
    pub amount: Decimal,
    pub class_section_id: Option<Uuid>,
    pub status: BillingStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        return Err(range_error("amount_not_negative"));
    }
    check_fits_column(val)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBillingPayload {
    pub category: BillingCategory,

    #[validate(length(min = 1, max = 50, message = "length"))]
    pub code: Option<String>,

    #[validate(length(min = 1, max = 200, message = "required"))]
    pub title: String,

    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64, example = 150000)]
    pub amount: Decimal,

    pub class_section_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBillingPayload {
    pub category: Option<BillingCategory>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub code: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub title: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub description: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<NaiveDate>)]
    pub due_date: Patch<NaiveDate>,
    #[serde(default)]
    #[schema(value_type = Option<f64>)]
    pub amount: Patch<Decimal>,
    #[serde(default)]
    #[schema(value_type = Option<Uuid>)]
    pub class_section_id: Patch<Uuid>,
    pub status: Option<BillingStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BillingFilter {
    pub status: Option<BillingStatus>,
    pub category: Option<BillingCategory>,
    pub class_section_id: Option<Uuid>,
    /// Vencimento a partir de (YYYY-MM-DD).
    pub due_from: Option<NaiveDate>,
    /// Vencimento até (YYYY-MM-DD), inclusive.
    pub due_to: Option<NaiveDate>,
    /// Busca em título, código e descrição.
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use BillingStatus::*;

    #[test]
    fn status_transitions_table() {
        let table = [
            (Unpaid, Paid, true),
            (Unpaid, Canceled, true),
            (Unpaid, Unpaid, true),
            (Paid, Unpaid, false),
            (Paid, Canceled, false),
            (Canceled, Paid, false),
            (Canceled, Unpaid, false),
            (Paid, Paid, true),
        ];
        for (from, to, allowed) in table {
            assert_eq!(from.can_transition_to(to), allowed, "{from:?} -> {to:?}");
        }
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert!(validate_not_negative(&Decimal::new(-1, 0)).is_err());
        assert!(validate_not_negative(&Decimal::ZERO).is_ok());
    }

    #[test]
    fn amount_must_fit_the_column() {
        assert!(validate_not_negative(&Decimal::new(1_000_000_000_000, 0)).is_err());
        assert!(validate_not_negative(&Decimal::new(1_005, 3)).is_err());
        assert!(validate_not_negative(&Decimal::new(150_000_50, 2)).is_ok());
    }
}
