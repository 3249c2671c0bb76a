//! Read-only authorization of premium operations against the resolved tier.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::entitlement::{AccessTier, Feature, has_feature, resolve_status};
use crate::model::{Score, Subscription, User};

/// Operations that are checked against a caller's entitlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatedAction {
    ViewDetailedStatistics,
    DownloadReport,
    CreateCustomInterview,
    UseVoiceInterview,
    GenerateAiQuestions,
    /// Seeing an evaluation's detailed feedback and recommendations.
    ViewEvaluationDetail { overall_score: Score, unlocked: bool },
    /// Unlocking a failed evaluation without going through payment.
    UnlockEvaluationWithoutCharge,
    CancelSubscription,
}

impl GatedAction {
    fn feature(&self) -> Option<Feature> {
        match self {
            GatedAction::ViewDetailedStatistics => Some(Feature::ViewStatistics),
            GatedAction::DownloadReport => Some(Feature::DownloadReports),
            GatedAction::CreateCustomInterview => Some(Feature::CustomInterviews),
            GatedAction::UseVoiceInterview => Some(Feature::VoiceInterview),
            GatedAction::GenerateAiQuestions => Some(Feature::AiGeneratedQuestions),
            GatedAction::ViewEvaluationDetail { .. }
            | GatedAction::UnlockEvaluationWithoutCharge
            | GatedAction::CancelSubscription => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The feature needs the premium tier.
    PremiumRequired(Feature),
    /// Failed evaluation detail needs premium or a paid unlock.
    PaymentRequired,
    /// Only an active premium subscription can be cancelled.
    NoActivePremium,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::PremiumRequired(feature) => {
                write!(f, "premium subscription required for {feature:?}")
            }
            DenyReason::PaymentRequired => f.write_str("evaluation detail requires payment"),
            DenyReason::NoActivePremium => f.write_str("no active premium subscription"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Approves or denies `GatedAction`s. Never mutates the user or subscription.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureGate;

impl FeatureGate {
    #[must_use]
    pub fn authorize(
        &self,
        user: &User,
        subscription: Option<&Subscription>,
        action: GatedAction,
        now: DateTime<Utc>,
    ) -> Decision {
        let tier = resolve_status(user, subscription, now);
        self.authorize_tier(tier, action)
    }

    /// Same as [`FeatureGate::authorize`] for an already-resolved tier.
    #[must_use]
    pub fn authorize_tier(&self, tier: AccessTier, action: GatedAction) -> Decision {
        if let Some(feature) = action.feature() {
            return if has_feature(tier, feature) {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::PremiumRequired(feature))
            };
        }

        match action {
            GatedAction::ViewEvaluationDetail {
                overall_score,
                unlocked,
            } => {
                // Passing evaluations are shown in full to every tier.
                if tier == AccessTier::Premium || unlocked || overall_score.is_passing() {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::PaymentRequired)
                }
            }
            GatedAction::UnlockEvaluationWithoutCharge => {
                if tier == AccessTier::Premium {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::PaymentRequired)
                }
            }
            GatedAction::CancelSubscription => {
                if tier == AccessTier::Premium {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::NoActivePremium)
                }
            }
            _ => Decision::Allow,
        }
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
            email: "gate@example.com".into(),
            first_name: "G".into(),
            last_name: "K".into(),
            ..UserDraft::default()
        }
        .register(UserId::new(), fixed_now())
        .unwrap()
    }

    fn failing() -> GatedAction {
        GatedAction::ViewEvaluationDetail {
            overall_score: Score::new(55).unwrap(),
            unlocked: false,
        }
    }

    #[test]
    fn free_user_is_denied_detailed_statistics() {
        let gate = FeatureGate;
        let decision = gate.authorize(&user(), None, GatedAction::ViewDetailedStatistics, fixed_now());
        assert_eq!(
            decision,
            Decision::Deny(DenyReason::PremiumRequired(Feature::ViewStatistics))
        );
    }

    #[test]
    fn premium_user_is_allowed_everything() {
        let gate = FeatureGate;
        let user = user();
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
        let later = fixed_now() + Duration::days(20);
        for action in [
            GatedAction::ViewDetailedStatistics,
            GatedAction::DownloadReport,
            failing(),
            GatedAction::UnlockEvaluationWithoutCharge,
            GatedAction::CancelSubscription,
        ] {
            assert!(gate.authorize(&user, Some(&sub), action, later).is_allowed());
        }
    }

    #[test]
    fn passing_evaluation_detail_is_free() {
        let gate = FeatureGate;
        let passing = GatedAction::ViewEvaluationDetail {
            overall_score: Score::new(82).unwrap(),
            unlocked: false,
        };
        assert!(gate.authorize_tier(AccessTier::Expired, passing).is_allowed());
        assert_eq!(
            gate.authorize_tier(AccessTier::Free, failing()),
            Decision::Deny(DenyReason::PaymentRequired)
        );
    }

    #[test]
    fn unlocked_evaluation_detail_is_allowed() {
        let paid = GatedAction::ViewEvaluationDetail {
            overall_score: Score::new(10).unwrap(),
            unlocked: true,
        };
        assert!(FeatureGate.authorize_tier(AccessTier::Free, paid).is_allowed());
    }

    #[test]
    fn cancellation_requires_active_premium() {
        assert_eq!(
            FeatureGate.authorize_tier(AccessTier::Free, GatedAction::CancelSubscription),
            Decision::Deny(DenyReason::NoActivePremium)
        );
    }

    #[test]
    fn base_features_pass_for_expired_accounts() {
        assert!(
            FeatureGate
                .authorize_tier(AccessTier::Expired, GatedAction::GenerateAiQuestions)
                .is_allowed()
        );
    }
}
