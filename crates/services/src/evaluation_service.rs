use std::sync::Arc;

use tracing::info;

use interview_core::model::{Evaluation, EvaluationId, InterviewId, UserId};
use interview_core::{Decision, GatedAction};
use storage::repository::{EvaluationRepository, InterviewRepository, ResponseRepository, StorageError};

use crate::Clock;
use crate::entitlement_service::EntitlementService;
use crate::error::{LookupExt, ServiceError};
use crate::payment::{PaymentAuthorization, PaymentGateway, PaymentIntent};

/// An evaluation as the caller is allowed to see it.
#[derive(Debug, Clone)]
pub struct EvaluationView {
    pub evaluation: Evaluation,
    /// False when detail was stripped and an unlock is needed.
    pub detail_visible: bool,
}

/// Post-interview evaluations and their paid unlock.
#[derive(Clone)]
pub struct EvaluationService {
    clock: Clock,
    interviews: Arc<dyn InterviewRepository>,
    responses: Arc<dyn ResponseRepository>,
    evaluations: Arc<dyn EvaluationRepository>,
    payments: Arc<dyn PaymentGateway>,
    entitlements: Arc<EntitlementService>,
}

impl EvaluationService {
    #[must_use]
    pub fn new(
        clock: Clock,
        interviews: Arc<dyn InterviewRepository>,
        responses: Arc<dyn ResponseRepository>,
        evaluations: Arc<dyn EvaluationRepository>,
        payments: Arc<dyn PaymentGateway>,
        entitlements: Arc<EntitlementService>,
    ) -> Self {
        Self {
            clock,
            interviews,
            responses,
            evaluations,
            payments,
            entitlements,
        }
    }

    /// Build the evaluation of a completed interview. One per interview.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the interview is not completed or was
    /// already evaluated, and a forbidden error for a non-owner.
    pub async fn create(
        &self,
        caller: UserId,
        interview_id: InterviewId,
    ) -> Result<EvaluationView, ServiceError> {
        let (interview, questions) = self
            .interviews
            .load_interview_with_questions(interview_id)
            .await
            .or_missing("interview")?;
        interview.ensure_owned_by(caller)?;
        let responses = self
            .responses
            .load_responses_for_interview(interview_id)
            .await?;

        let evaluation = Evaluation::from_interview(
            EvaluationId::new(),
            &interview,
            &questions,
            &responses,
            self.clock.now(),
        )?;
        self.evaluations
            .insert_evaluation(&evaluation)
            .await
            .map_err(|e| match e {
                StorageError::Conflict => {
                    ServiceError::Validation("interview already has an evaluation".into())
                }
                other => ServiceError::Storage(other),
            })?;
        info!(
            interview_id = %interview_id,
            user_id = %caller,
            score = evaluation.overall_score.value(),
            "evaluation created"
        );
        self.view(caller, evaluation).await
    }

    /// Caller's evaluations, newest first, each redacted as needed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if listing fails.
    pub async fn list(&self, caller: UserId) -> Result<Vec<EvaluationView>, ServiceError> {
        let evaluations = self.evaluations.list_evaluations_for_user(caller).await?;
        let mut views = Vec::with_capacity(evaluations.len());
        for evaluation in evaluations {
            views.push(self.view(caller, evaluation).await?);
        }
        Ok(views)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` when missing or owned by someone else.
    pub async fn get(&self, caller: UserId, id: EvaluationId) -> Result<EvaluationView, ServiceError> {
        let evaluation = self.owned(caller, id).await?;
        self.view(caller, evaluation).await
    }

    /// Unlock detailed feedback: free for premium, otherwise charged.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a charge is needed but no payment
    /// identifiers were given, and `ServiceError::Upstream` if the charge fails.
    pub async fn unlock(
        &self,
        caller: UserId,
        id: EvaluationId,
        authorization: Option<PaymentAuthorization>,
    ) -> Result<EvaluationView, ServiceError> {
        let mut evaluation = self.owned(caller, id).await?;
        if evaluation.is_unlocked() {
            return self.view(caller, evaluation).await;
        }

        let access = self.entitlements.resolve(caller).await?;
        let now = self.clock.now();
        match self
            .entitlements
            .decide(&access, GatedAction::UnlockEvaluationWithoutCharge)
        {
            Decision::Allow => evaluation.unlock_complimentary(now),
            Decision::Deny(_) => {
                let authorization = authorization
                    .filter(PaymentAuthorization::is_complete)
                    .ok_or_else(|| {
                        ServiceError::Validation(
                            "paymentId and payerId are required to unlock".into(),
                        )
                    })?;
                let receipt = self
                    .payments
                    .charge(
                        &PaymentIntent::EvaluationUnlock { evaluation_id: id },
                        &authorization,
                    )
                    .await?;
                info!(
                    user_id = %caller,
                    transaction_id = %receipt.transaction_id,
                    "evaluation unlock paid"
                );
                evaluation.unlock_paid(now);
            }
        }

        self.evaluations.update_evaluation(&evaluation).await?;
        self.view(caller, evaluation).await
    }

    async fn owned(&self, caller: UserId, id: EvaluationId) -> Result<Evaluation, ServiceError> {
        let evaluation = self
            .evaluations
            .get_evaluation(id)
            .await
            .or_missing("evaluation")?;
        if evaluation.user_id != caller {
            return Err(ServiceError::NotFound("evaluation"));
        }
        Ok(evaluation)
    }

    async fn view(&self, caller: UserId, evaluation: Evaluation) -> Result<EvaluationView, ServiceError> {
        let access = self.entitlements.resolve(caller).await?;
        let action = GatedAction::ViewEvaluationDetail {
            overall_score: evaluation.overall_score,
            unlocked: evaluation.is_unlocked(),
        };
        Ok(match self.entitlements.decide(&access, action) {
            Decision::Allow => EvaluationView {
                evaluation,
                detail_visible: true,
            },
            Decision::Deny(_) => EvaluationView {
                evaluation: evaluation.redacted(),
                detail_visible: false,
            },
        })
    }
}
