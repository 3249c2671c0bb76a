use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entitlement::Feature;
use crate::model::ids::{SubscriptionId, UserId};
use crate::time::premium_end_from;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubscriptionError {
    #[error("subscription is already cancelled")]
    AlreadyCancelled,

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("invalid subscription status: {0}")]
    InvalidStatus(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Premium,
}

impl Plan {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
        }
    }

    /// # Errors
    ///
    /// Returns `SubscriptionError::InvalidPlan` for unknown names.
    pub fn parse(s: &str) -> Result<Self, SubscriptionError> {
        match s {
            "free" => Ok(Plan::Free),
            "premium" => Ok(Plan::Premium),
            other => Err(SubscriptionError::InvalidPlan(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Inactive,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    /// # Errors
    ///
    /// Returns `SubscriptionError::InvalidStatus` for unknown names.
    pub fn parse(s: &str) -> Result<Self, SubscriptionError> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "inactive" => Ok(SubscriptionStatus::Inactive),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            "expired" => Ok(SubscriptionStatus::Expired),
            other => Err(SubscriptionError::InvalidStatus(other.to_string())),
        }
    }
}

/// Boolean feature matrix stored on a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
    pub download_reports: bool,
    pub view_statistics: bool,
    pub custom_interviews: bool,
    pub voice_interview: bool,
    pub ai_generated_questions: bool,
}

impl FeatureSet {
    #[must_use]
    pub fn free() -> Self {
        Self {
            download_reports: false,
            view_statistics: false,
            custom_interviews: true,
            voice_interview: true,
            ai_generated_questions: true,
        }
    }

    #[must_use]
    pub fn premium() -> Self {
        Self {
            download_reports: true,
            view_statistics: true,
            custom_interviews: true,
            voice_interview: true,
            ai_generated_questions: true,
        }
    }

    #[must_use]
    pub fn allows(&self, feature: Feature) -> bool {
        match feature {
            Feature::DownloadReports => self.download_reports,
            Feature::ViewStatistics => self.view_statistics,
            Feature::CustomInterviews => self.custom_interviews,
            Feature::VoiceInterview => self.voice_interview,
            Feature::AiGeneratedQuestions => self.ai_generated_questions,
        }
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::free()
    }
}

/// Confirmation returned by the payment collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub payment_id: Option<String>,
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub renewal_date: Option<DateTime<Utc>>,
    pub price: f64,
    pub currency: String,
    pub provider_payment_id: Option<String>,
    pub provider_transaction_id: Option<String>,
    pub features: FeatureSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Free-plan record created alongside a new account.
    #[must_use]
    pub fn free_for(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: SubscriptionId::new(),
            user_id,
            plan: Plan::Free,
            status: SubscriptionStatus::Active,
            start_date: now,
            end_date: None,
            renewal_date: None,
            price: 0.0,
            currency: "USD".into(),
            provider_payment_id: None,
            provider_transaction_id: None,
            features: FeatureSet::free(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Upgrade (or renew) to an active premium period backed by `receipt`.
    pub fn activate_premium(&mut self, receipt: &PaymentReceipt, now: DateTime<Utc>) {
        let end = premium_end_from(now);
        self.plan = Plan::Premium;
        self.status = SubscriptionStatus::Active;
        self.start_date = now;
        self.end_date = Some(end);
        self.renewal_date = Some(end);
        self.price = receipt.amount;
        self.currency.clone_from(&receipt.currency);
        self.provider_transaction_id = Some(receipt.transaction_id.clone());
        self.provider_payment_id.clone_from(&receipt.payment_id);
        self.features = FeatureSet::premium();
        self.updated_at = now;
    }

    /// # Errors
    ///
    /// Returns `SubscriptionError::AlreadyCancelled` on a second cancellation.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), SubscriptionError> {
        if self.status == SubscriptionStatus::Cancelled {
            return Err(SubscriptionError::AlreadyCancelled);
        }
        self.status = SubscriptionStatus::Cancelled;
        self.end_date = Some(now);
        self.renewal_date = None;
        self.updated_at = now;
        Ok(())
    }

    #[must_use]
    pub fn is_active_premium(&self) -> bool {
        self.plan == Plan::Premium && self.status == SubscriptionStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn receipt() -> PaymentReceipt {
        PaymentReceipt {
            transaction_id: "TX-1".into(),
            payment_id: Some("PAY-1".into()),
            amount: 9.99,
            currency: "USD".into(),
        }
    }

    #[test]
    fn free_defaults_deny_reports_and_statistics() {
        let sub = Subscription::free_for(UserId::new(), fixed_now());
        assert!(!sub.features.allows(Feature::DownloadReports));
        assert!(!sub.features.allows(Feature::ViewStatistics));
        assert!(sub.features.allows(Feature::VoiceInterview));
        assert!(!sub.is_active_premium());
    }

    #[test]
    fn premium_activation_sets_thirty_day_period() {
        let now = fixed_now();
        let mut sub = Subscription::free_for(UserId::new(), now);
        sub.activate_premium(&receipt(), now);
        assert!(sub.is_active_premium());
        assert_eq!(sub.end_date, Some(now + Duration::days(30)));
        assert_eq!(sub.renewal_date, sub.end_date);
        assert_eq!(sub.provider_transaction_id.as_deref(), Some("TX-1"));
        assert_eq!(sub.features, FeatureSet::premium());
    }

    #[test]
    fn cancel_is_one_shot() {
        let now = fixed_now();
        let mut sub = Subscription::free_for(UserId::new(), now);
        sub.activate_premium(&receipt(), now);
        sub.cancel(now).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
        assert_eq!(sub.end_date, Some(now));
        assert_eq!(sub.cancel(now).unwrap_err(), SubscriptionError::AlreadyCancelled);
    }
}
