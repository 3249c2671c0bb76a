//! Access-tier derivation from subscription and trial data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{Subscription, User};

/// Effective access tier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    #[default]
    Free,
    Premium,
    Expired,
}

impl AccessTier {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessTier::Free => "free",
            AccessTier::Premium => "premium",
            AccessTier::Expired => "expired",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(AccessTier::Free),
            "premium" => Some(AccessTier::Premium),
            "expired" => Some(AccessTier::Expired),
            _ => None,
        }
    }
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Features named by the subscription feature matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    DownloadReports,
    ViewStatistics,
    CustomInterviews,
    VoiceInterview,
    AiGeneratedQuestions,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::DownloadReports,
        Feature::ViewStatistics,
        Feature::CustomInterviews,
        Feature::VoiceInterview,
        Feature::AiGeneratedQuestions,
    ];

    #[must_use]
    pub fn is_premium_only(&self) -> bool {
        matches!(self, Feature::DownloadReports | Feature::ViewStatistics)
    }
}

/// Derive the tier, in order: active premium plan, then unexpired trial, else expired.
///
/// The cached `user.subscription_status` is ignored on purpose; callers compare
/// it with the result to decide whether the user record needs correcting.
#[must_use]
pub fn resolve_status(
    user: &User,
    subscription: Option<&Subscription>,
    now: DateTime<Utc>,
) -> AccessTier {
    if subscription.is_some_and(Subscription::is_active_premium) {
        return AccessTier::Premium;
    }
    if now < user.free_trial_end_date {
        return AccessTier::Free;
    }
    AccessTier::Expired
}

/// Whether `tier` grants `feature` outright (no per-resource exceptions).
#[must_use]
pub fn has_feature(tier: AccessTier, feature: Feature) -> bool {
    match tier {
        AccessTier::Premium => true,
        AccessTier::Free | AccessTier::Expired => !feature.is_premium_only(),
    }
}

/// Outcome of a tier resolution against the cached value on the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierResolution {
    pub tier: AccessTier,
    pub cached: AccessTier,
}

impl TierResolution {
    #[must_use]
    pub fn resolve(user: &User, subscription: Option<&Subscription>, now: DateTime<Utc>) -> Self {
        Self {
            tier: resolve_status(user, subscription, now),
            cached: user.subscription_status,
        }
    }

    /// True when the stored user record must be rewritten before the tier is returned.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.tier != self.cached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PaymentReceipt, UserDraft, UserId};
    use crate::time::fixed_now;
    use chrono::Duration;

    fn user() -> User {
        UserDraft {
            email: "trial@example.com".into(),
            first_name: "T".into(),
            last_name: "U".into(),
            ..UserDraft::default()
        }
        .register(UserId::new(), fixed_now())
        .unwrap()
    }

    fn premium(user: &User) -> Subscription {
        let mut sub = Subscription::free_for(user.id, fixed_now());
        sub.activate_premium(
            &PaymentReceipt {
                transaction_id: "t".into(),
                payment_id: None,
                amount: 9.99,
                currency: "USD".into(),
            },
            fixed_now(),
        );
        sub
    }

    #[test]
    fn fresh_registration_resolves_free() {
        let user = user();
        let sub = Subscription::free_for(user.id, fixed_now());
        assert_eq!(resolve_status(&user, Some(&sub), fixed_now()), AccessTier::Free);
    }

    #[test]
    fn trial_end_instant_is_expired() {
        let user = user();
        let at_end = user.free_trial_end_date;
        assert_eq!(resolve_status(&user, None, at_end - Duration::seconds(1)), AccessTier::Free);
        assert_eq!(resolve_status(&user, None, at_end), AccessTier::Expired);
    }

    #[test]
    fn active_premium_wins_over_expired_trial() {
        let user = user();
        let sub = premium(&user);
        let later = fixed_now() + Duration::days(60);
        assert_eq!(resolve_status(&user, Some(&sub), later), AccessTier::Premium);
    }

    #[test]
    fn cancelled_premium_falls_back_to_trial_rules() {
        let user = user();
        let mut sub = premium(&user);
        sub.cancel(fixed_now()).unwrap();
        assert_eq!(resolve_status(&user, Some(&sub), fixed_now()), AccessTier::Free);
        let later = fixed_now() + Duration::days(8);
        assert_eq!(resolve_status(&user, Some(&sub), later), AccessTier::Expired);
    }

    #[test]
    fn stale_cached_free_is_detected() {
        let user = user();
        let later = fixed_now() + Duration::days(8);
        let resolution = TierResolution::resolve(&user, None, later);
        assert_eq!(resolution.tier, AccessTier::Expired);
        assert!(resolution.is_stale());
    }

    #[test]
    fn feature_matrix_by_tier() {
        for feature in Feature::ALL {
            assert!(has_feature(AccessTier::Premium, feature));
        }
        assert!(!has_feature(AccessTier::Free, Feature::ViewStatistics));
        assert!(!has_feature(AccessTier::Expired, Feature::DownloadReports));
        assert!(has_feature(AccessTier::Expired, Feature::AiGeneratedQuestions));
    }
}
