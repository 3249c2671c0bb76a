use std::sync::Arc;

use tracing::info;

use interview_core::model::{FeatureSet, Subscription, UserId};
use interview_core::{AccessTier, GatedAction};
use storage::repository::{SubscriptionRepository, UserRepository};

use crate::Clock;
use crate::entitlement_service::EntitlementService;
use crate::error::{LookupExt, ServiceError};
use crate::payment::{PaymentAuthorization, PaymentGateway, PaymentIntent};

/// Result of a premium-access check.
#[derive(Debug, Clone, PartialEq)]
pub struct PremiumAccess {
    pub has_premium_access: bool,
    pub tier: AccessTier,
    pub features: FeatureSet,
}

#[derive(Clone)]
pub struct SubscriptionService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<dyn PaymentGateway>,
    entitlements: Arc<EntitlementService>,
}

impl SubscriptionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<dyn PaymentGateway>,
        entitlements: Arc<EntitlementService>,
    ) -> Self {
        Self {
            clock,
            users,
            subscriptions,
            payments,
            entitlements,
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` when the user has no subscription record.
    pub async fn current(&self, caller: UserId) -> Result<Subscription, ServiceError> {
        self.subscriptions
            .subscription_for_user(caller)
            .await?
            .ok_or(ServiceError::NotFound("subscription"))
    }

    /// Cancel an active premium subscription and drop the user back to free.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Denied` without an active premium subscription.
    pub async fn cancel(&self, caller: UserId) -> Result<Subscription, ServiceError> {
        let access = self
            .entitlements
            .authorize(caller, GatedAction::CancelSubscription)
            .await?;
        let mut subscription = access
            .subscription
            .ok_or(ServiceError::NotFound("subscription"))?;
        let mut user = access.user;

        let now = self.clock.now();
        subscription.cancel(now)?;
        self.subscriptions.upsert_subscription(&subscription).await?;

        user.subscription_id = None;
        user.set_cached_tier(AccessTier::Free, now);
        self.users.update_user(&user).await?;

        info!(user_id = %caller, subscription_id = %subscription.id, "subscription cancelled");
        Ok(subscription)
    }

    /// Execute an approved premium payment and activate a thirty-day period.
    ///
    /// # Errors
    ///
    /// Returns a validation error for incomplete payment identifiers and
    /// `ServiceError::Upstream` when the payment collaborator fails.
    pub async fn purchase_premium(
        &self,
        caller: UserId,
        authorization: PaymentAuthorization,
    ) -> Result<Subscription, ServiceError> {
        if !authorization.is_complete() {
            return Err(ServiceError::Validation(
                "paymentId and payerId are required".into(),
            ));
        }
        let mut user = self.users.get_user(caller).await.or_missing("user")?;
        let now = self.clock.now();

        let receipt = self
            .payments
            .charge(&PaymentIntent::PremiumSubscription, &authorization)
            .await?;

        let mut subscription = self
            .subscriptions
            .subscription_for_user(caller)
            .await?
            .unwrap_or_else(|| Subscription::free_for(caller, now));
        subscription.activate_premium(&receipt, now);
        self.subscriptions.upsert_subscription(&subscription).await?;

        user.subscription_id = Some(subscription.id);
        user.set_cached_tier(AccessTier::Premium, now);
        self.users.update_user(&user).await?;

        info!(
            user_id = %caller,
            transaction_id = %receipt.transaction_id,
            "premium subscription activated"
        );
        Ok(subscription)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for unknown users.
    pub async fn premium_access(&self, caller: UserId) -> Result<PremiumAccess, ServiceError> {
        let access = self.entitlements.resolve(caller).await?;
        let features = if access.tier == AccessTier::Premium {
            FeatureSet::premium()
        } else {
            FeatureSet::free()
        };
        Ok(PremiumAccess {
            has_premium_access: access.tier == AccessTier::Premium,
            tier: access.tier,
            features,
        })
    }
}
