use std::sync::Arc;

use tracing::info;

use interview_core::entitlement::TierResolution;
use interview_core::model::{Subscription, User, UserId};
use interview_core::{AccessTier, Decision, FeatureGate, GatedAction};
use storage::repository::{SubscriptionRepository, UserRepository};

use crate::Clock;
use crate::error::{LookupExt, ServiceError};

/// A caller with the tier resolved for this request.
#[derive(Debug, Clone)]
pub struct ResolvedAccess {
    pub user: User,
    pub subscription: Option<Subscription>,
    pub tier: AccessTier,
}

/// Resolves tiers, persisting corrections to the cached value, and applies the feature gate.
#[derive(Clone)]
pub struct EntitlementService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    gate: FeatureGate,
}

impl EntitlementService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            subscriptions,
            gate: FeatureGate,
        }
    }

    /// Resolve the caller's tier. A stale cached tier is rewritten before returning.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for unknown users, or a storage error.
    pub async fn resolve(&self, user_id: UserId) -> Result<ResolvedAccess, ServiceError> {
        let mut user = self.users.get_user(user_id).await.or_missing("user")?;
        let subscription = self.subscriptions.subscription_for_user(user_id).await?;
        let now = self.clock.now();

        let resolution = TierResolution::resolve(&user, subscription.as_ref(), now);
        if resolution.is_stale() {
            user.set_cached_tier(resolution.tier, now);
            self.users.update_user(&user).await?;
            info!(
                user_id = %user.id,
                from = %resolution.cached,
                to = %resolution.tier,
                "corrected cached subscription status"
            );
        }

        Ok(ResolvedAccess {
            user,
            subscription,
            tier: resolution.tier,
        })
    }

    #[must_use]
    pub fn decide(&self, access: &ResolvedAccess, action: GatedAction) -> Decision {
        self.gate.authorize_tier(access.tier, action)
    }

    /// Resolve and require `action` to be allowed.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Denied` when the gate refuses the action.
    pub async fn authorize(
        &self,
        user_id: UserId,
        action: GatedAction,
    ) -> Result<ResolvedAccess, ServiceError> {
        let access = self.resolve(user_id).await?;
        match self.decide(&access, action) {
            Decision::Allow => Ok(access),
            Decision::Deny(reason) => {
                info!(user_id = %user_id, tier = %access.tier, %reason, "action denied");
                Err(ServiceError::Denied(reason))
            }
        }
    }
}
