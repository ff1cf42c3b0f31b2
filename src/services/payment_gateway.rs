// src/services/payment_gateway.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::{common::error::AppError, models::donation::MidtransNotification};

const SANDBOX_BASE_URL: &str = "https://app.sandbox.midtrans.com";
const PRODUCTION_BASE_URL: &str = "https://app.midtrans.com";

/// O que o checkout precisa saber sobre a doação.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub order_id: String,
    /// Em rupias inteiras (o Snap não aceita centavos).
    pub gross_amount: i64,
    pub item_name: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub token: String,
    pub redirect_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Abre uma transação e devolve o token/URL de pagamento.
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, AppError>;

    /// Confere a assinatura de uma notificação recebida pelo webhook.
    fn verify_notification(&self, notification: &MidtransNotification) -> bool;
}

/// `sha512(order_id + status_code + gross_amount + server_key)` em hex minúsculo.
pub fn midtrans_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct MidtransGateway {
    client: reqwest::Client,
    server_key: String,
    base_url: String,
}

impl MidtransGateway {
    pub fn new(server_key: String, is_production: bool) -> anyhow::Result<Self> {
        let base_url = if is_production {
            PRODUCTION_BASE_URL
        } else {
            SANDBOX_BASE_URL
        };
        Self::with_base_url(server_key, base_url.to_string())
    }

    pub fn with_base_url(server_key: String, base_url: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            server_key,
            base_url,
        })
    }
}

#[async_trait]
impl PaymentGateway for MidtransGateway {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession, AppError> {
        let body = json!({
            "transaction_details": {
                "order_id": request.order_id,
                "gross_amount": request.gross_amount,
            },
            "item_details": [{
                "id": request.order_id,
                "name": request.item_name,
                "price": request.gross_amount,
                "quantity": 1,
            }],
            "customer_details": {
                "first_name": request.customer_name,
                "email": request.customer_email,
                "phone": request.customer_phone,
            },
        });

        let response = self
            .client
            .post(format!("{}/snap/v1/transactions", self.base_url))
            .basic_auth(&self.server_key, Some(""))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::PaymentGatewayError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("Midtrans respondeu {} para {}: {}", status, request.order_id, text);
            return Err(AppError::PaymentGatewayError(format!("HTTP {status}")));
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| AppError::PaymentGatewayError(e.to_string()))
    }

    fn verify_notification(&self, notification: &MidtransNotification) -> bool {
        let (Some(status_code), Some(gross_amount), Some(received)) = (
            notification.status_code.as_deref(),
            notification.gross_amount.as_deref(),
            notification.signature_key.as_deref(),
        ) else {
            return false;
        };

        let expected = midtrans_signature(
            &notification.order_id,
            status_code,
            gross_amount,
            &self.server_key,
        );
        let received = received.trim().to_ascii_lowercase();
        expected.as_bytes().ct_eq(received.as_bytes()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(signature: Option<String>) -> MidtransNotification {
        MidtransNotification {
            order_id: "DON-123".into(),
            transaction_status: "settlement".into(),
            status_code: Some("200".into()),
            gross_amount: Some("50000.00".into()),
            signature_key: signature,
            payment_type: Some("qris".into()),
            transaction_id: None,
            fraud_status: None,
        }
    }

    #[test]
    fn signature_is_sha512_hex_of_concatenated_fields() {
        let sig = midtrans_signature("DON-123", "200", "50000.00", "server-key");
        assert_eq!(sig.len(), 128);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let mut hasher = Sha512::new();
        hasher.update(b"DON-12320050000.00server-key");
        assert_eq!(sig, hex::encode(hasher.finalize()));
    }

    #[test]
    fn verifies_matching_signature_case_insensitively() {
        let gateway = MidtransGateway::new("server-key".into(), false).unwrap();
        let sig = midtrans_signature("DON-123", "200", "50000.00", "server-key");

        assert!(gateway.verify_notification(&notification(Some(sig.clone()))));
        assert!(gateway.verify_notification(&notification(Some(sig.to_uppercase()))));
    }

    #[test]
    fn rejects_wrong_or_missing_signature() {
        let gateway = MidtransGateway::new("server-key".into(), false).unwrap();
        let forged = midtrans_signature("DON-123", "200", "50000.00", "other-key");

        assert!(!gateway.verify_notification(&notification(Some(forged))));
        assert!(!gateway.verify_notification(&notification(None)));
    }
}
