use std::sync::Arc;

use tracing::info;

use interview_core::model::{Subscription, User, UserDraft, UserId};
use storage::repository::{StorageError, SubscriptionRepository, UserRepository};

use crate::Clock;
use crate::entitlement_service::{EntitlementService, ResolvedAccess};
use crate::error::ServiceError;

/// Registration and profile reads.
#[derive(Clone)]
pub struct AccountService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    entitlements: Arc<EntitlementService>,
}

impl AccountService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        entitlements: Arc<EntitlementService>,
    ) -> Self {
        Self {
            clock,
            users,
            subscriptions,
            entitlements,
        }
    }

    /// Open an account with a seven-day trial and a free subscription record.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::User` for invalid input and `ServiceError::Validation`
    /// when the email is already registered.
    pub async fn register(
        &self,
        draft: UserDraft,
    ) -> Result<(User, Subscription), ServiceError> {
        let now = self.clock.now();
        let mut user = draft.register(UserId::new(), now)?;

        self.users.insert_user(&user).await.map_err(|e| match e {
            StorageError::Conflict => ServiceError::Validation("email is already registered".into()),
            other => ServiceError::Storage(other),
        })?;

        let subscription = Subscription::free_for(user.id, now);
        self.subscriptions.upsert_subscription(&subscription).await?;
        user.subscription_id = Some(subscription.id);
        self.users.update_user(&user).await?;

        info!(user_id = %user.id, trial_end = %user.free_trial_end_date, "user registered");
        Ok((user, subscription))
    }

    /// Profile with the tier resolved (and corrected) for this read.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for unknown users.
    pub async fn profile(&self, user_id: UserId) -> Result<ResolvedAccess, ServiceError> {
        self.entitlements.resolve(user_id).await
    }
}
