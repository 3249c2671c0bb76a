//! Payment collaborator: executes a payer-approved charge and returns the receipt.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use interview_core::model::{EvaluationId, PaymentReceipt};

use crate::error::UpstreamError;

pub const CURRENCY: &str = "USD";
pub const PREMIUM_PRICE: f64 = 9.99;
pub const EVALUATION_UNLOCK_PRICE: f64 = 4.99;

/// What a charge pays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentIntent {
    PremiumSubscription,
    EvaluationUnlock { evaluation_id: EvaluationId },
}

impl PaymentIntent {
    #[must_use]
    pub fn amount(&self) -> f64 {
        match self {
            PaymentIntent::PremiumSubscription => PREMIUM_PRICE,
            PaymentIntent::EvaluationUnlock { .. } => EVALUATION_UNLOCK_PRICE,
        }
    }

    #[must_use]
    pub fn currency(&self) -> &'static str {
        CURRENCY
    }
}

/// Identifiers returned by the payer's approval step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAuthorization {
    pub payment_id: String,
    pub payer_id: String,
}

impl PaymentAuthorization {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.payment_id.trim().is_empty() && !self.payer_id.trim().is_empty()
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// # Errors
    ///
    /// Returns `UpstreamError` when the provider is unreachable, rejects the
    /// payment, or settles a different amount than the intent asks for.
    async fn charge(
        &self,
        intent: &PaymentIntent,
        authorization: &PaymentAuthorization,
    ) -> Result<PaymentReceipt, UpstreamError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayPalMode {
    Sandbox,
    Live,
}

impl PayPalMode {
    fn base_url(self) -> &'static str {
        match self {
            PayPalMode::Sandbox => "https://api.sandbox.paypal.com",
            PayPalMode::Live => "https://api.paypal.com",
        }
    }
}

#[derive(Clone, Debug)]
pub struct PayPalConfig {
    pub client_id: String,
    pub secret: String,
    pub base_url: Url,
}

impl PayPalConfig {
    /// Read `PAYPAL_CLIENT_ID`, `PAYPAL_SECRET` and `PAYPAL_MODE` (`live` or sandbox).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let client_id = env::var("PAYPAL_CLIENT_ID").ok()?;
        let secret = env::var("PAYPAL_SECRET").ok()?;
        if client_id.trim().is_empty() || secret.trim().is_empty() {
            return None;
        }
        let mode = match env::var("PAYPAL_MODE").as_deref() {
            Ok("live") => PayPalMode::Live,
            _ => PayPalMode::Sandbox,
        };
        let base_url = Url::parse(mode.base_url()).ok()?;
        Some(Self {
            client_id,
            secret,
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }
}

/// Executes approved PayPal payments (REST v1 payments API).
#[derive(Clone)]
pub struct PayPalGateway {
    client: Client,
    config: Option<PayPalConfig>,
}

impl PayPalGateway {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(PayPalConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<PayPalConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn access_token(&self, config: &PayPalConfig) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(config.endpoint("/v1/oauth2/token"))
            .basic_auth(&config.client_id, Some(&config.secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(UpstreamError::HttpStatus(response.status()));
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    async fn charge(
        &self,
        intent: &PaymentIntent,
        authorization: &PaymentAuthorization,
    ) -> Result<PaymentReceipt, UpstreamError> {
        let config = self.config.as_ref().ok_or(UpstreamError::NotConfigured)?;
        let token = self.access_token(config).await?;

        let response = self
            .client
            .post(config.endpoint(&format!(
                "/v1/payments/payment/{}/execute",
                authorization.payment_id
            )))
            .bearer_auth(token)
            .json(&ExecuteRequest {
                payer_id: &authorization.payer_id,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            warn!(status = %response.status(), payment_id = %authorization.payment_id, "payment execution rejected");
            return Err(UpstreamError::HttpStatus(response.status()));
        }

        let executed: ExecutedPayment = response.json().await?;
        let receipt = executed.into_receipt(&authorization.payment_id)?;
        ensure_settled(intent, &receipt)?;
        info!(payment_id = %authorization.payment_id, amount = receipt.amount, "payment executed");
        Ok(receipt)
    }
}

/// Rejects receipts that settle less than the intent's price or in another currency.
fn ensure_settled(intent: &PaymentIntent, receipt: &PaymentReceipt) -> Result<(), UpstreamError> {
    if receipt.currency != intent.currency() || receipt.amount + 0.005 < intent.amount() {
        return Err(UpstreamError::Declined(format!(
            "settled {:.2} {} for a {:.2} {} charge",
            receipt.amount,
            receipt.currency,
            intent.amount(),
            intent.currency()
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    payer_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExecutedPayment {
    state: String,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

#[derive(Debug, Deserialize)]
struct Transaction {
    amount: Amount,
    #[serde(default)]
    related_resources: Vec<RelatedResource>,
}

#[derive(Debug, Deserialize)]
struct Amount {
    total: String,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct RelatedResource {
    sale: Option<Sale>,
}

#[derive(Debug, Deserialize)]
struct Sale {
    id: String,
}

impl ExecutedPayment {
    fn into_receipt(self, payment_id: &str) -> Result<PaymentReceipt, UpstreamError> {
        if self.state != "approved" {
            return Err(UpstreamError::Declined(self.state));
        }
        let transaction = self
            .transactions
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::InvalidPayload("no transactions".into()))?;
        let transaction_id = transaction
            .related_resources
            .into_iter()
            .find_map(|r| r.sale.map(|s| s.id))
            .ok_or_else(|| UpstreamError::InvalidPayload("no sale id".into()))?;
        let amount = transaction
            .amount
            .total
            .parse::<f64>()
            .map_err(|e| UpstreamError::InvalidPayload(format!("amount: {e}")))?;
        Ok(PaymentReceipt {
            transaction_id,
            payment_id: Some(payment_id.to_string()),
            amount,
            currency: transaction.amount.currency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executed(state: &str, total: &str) -> ExecutedPayment {
        serde_json::from_value(serde_json::json!({
            "state": state,
            "transactions": [{
                "amount": { "total": total, "currency": "USD" },
                "related_resources": [{ "sale": { "id": "SALE-1" } }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn approved_payment_yields_receipt() {
        let receipt = executed("approved", "9.99").into_receipt("PAY-1").unwrap();
        assert_eq!(receipt.transaction_id, "SALE-1");
        assert_eq!(receipt.payment_id.as_deref(), Some("PAY-1"));
        assert!(ensure_settled(&PaymentIntent::PremiumSubscription, &receipt).is_ok());
    }

    #[test]
    fn unapproved_payment_is_declined() {
        assert!(matches!(
            executed("failed", "9.99").into_receipt("PAY-1"),
            Err(UpstreamError::Declined(state)) if state == "failed"
        ));
    }

    #[test]
    fn underpaid_receipt_is_rejected() {
        let receipt = executed("approved", "4.99").into_receipt("PAY-1").unwrap();
        assert!(ensure_settled(&PaymentIntent::PremiumSubscription, &receipt).is_err());
        let unlock = PaymentIntent::EvaluationUnlock {
            evaluation_id: EvaluationId::new(),
        };
        assert!(ensure_settled(&unlock, &receipt).is_ok());
    }

    #[tokio::test]
    async fn unconfigured_gateway_reports_not_configured() {
        let gateway = PayPalGateway::new(None);
        let auth = PaymentAuthorization {
            payment_id: "PAY-1".into(),
            payer_id: "PAYER".into(),
        };
        assert!(matches!(
            gateway.charge(&PaymentIntent::PremiumSubscription, &auth).await,
            Err(UpstreamError::NotConfigured)
        ));
    }
}
