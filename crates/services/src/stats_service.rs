use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use interview_core::model::{Interview, InterviewId, Question, QuestionDifficulty, UserId};
use interview_core::stats::{
    DifficultyBucket, QuestionStats, TrendPoint, UserStats, breakdown_by_difficulty,
    performance_trends, question_breakdown, user_stats,
};
use interview_core::{Decision, GatedAction};
use storage::repository::{InterviewRepository, ResponseRepository};

use crate::entitlement_service::EntitlementService;
use crate::error::{LookupExt, ServiceError};

/// Breakdowns only present when the caller may view detailed statistics.
#[derive(Debug, Clone)]
pub struct InterviewBreakdown {
    pub by_difficulty: BTreeMap<QuestionDifficulty, DifficultyBucket>,
    pub questions: Vec<QuestionStats>,
}

#[derive(Debug, Clone)]
pub struct InterviewReport {
    pub interview: Interview,
    pub breakdown: Option<InterviewBreakdown>,
}

/// Read-side reporting over stored interviews.
#[derive(Clone)]
pub struct StatsService {
    interviews: Arc<dyn InterviewRepository>,
    responses: Arc<dyn ResponseRepository>,
    entitlements: Arc<EntitlementService>,
}

impl StatsService {
    #[must_use]
    pub fn new(
        interviews: Arc<dyn InterviewRepository>,
        responses: Arc<dyn ResponseRepository>,
        entitlements: Arc<EntitlementService>,
    ) -> Self {
        Self {
            interviews,
            responses,
            entitlements,
        }
    }

    /// # Errors
    ///
    /// Returns a storage error if listing fails.
    pub async fn user_stats(&self, caller: UserId) -> Result<UserStats, ServiceError> {
        let interviews = self.interviews.list_interviews_for_user(caller).await?;
        Ok(user_stats(&interviews))
    }

    /// Per-interview report. Breakdowns are omitted unless the caller's tier
    /// allows detailed statistics.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or a forbidden error for a non-owner.
    pub async fn interview_report(
        &self,
        caller: UserId,
        id: InterviewId,
    ) -> Result<InterviewReport, ServiceError> {
        let (interview, questions) = self
            .interviews
            .load_interview_with_questions(id)
            .await
            .or_missing("interview")?;
        interview.ensure_owned_by(caller)?;

        let access = self.entitlements.resolve(caller).await?;
        let breakdown = match self
            .entitlements
            .decide(&access, GatedAction::ViewDetailedStatistics)
        {
            Decision::Allow => Some(self.breakdown(id, &questions).await?),
            Decision::Deny(_) => None,
        };

        Ok(InterviewReport {
            interview,
            breakdown,
        })
    }

    /// Full report for download. Unlike `interview_report` the breakdown is
    /// never omitted; callers without report access are refused outright.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound`, a forbidden error for a non-owner, or
    /// `ServiceError::Denied` when the tier cannot download reports.
    pub async fn download_report(
        &self,
        caller: UserId,
        id: InterviewId,
    ) -> Result<InterviewReport, ServiceError> {
        let (interview, questions) = self
            .interviews
            .load_interview_with_questions(id)
            .await
            .or_missing("interview")?;
        interview.ensure_owned_by(caller)?;
        self.entitlements
            .authorize(caller, GatedAction::DownloadReport)
            .await?;

        let breakdown = self.breakdown(id, &questions).await?;
        info!(interview_id = %id, user_id = %caller, "report downloaded");
        Ok(InterviewReport {
            interview,
            breakdown: Some(breakdown),
        })
    }

    async fn breakdown(
        &self,
        id: InterviewId,
        questions: &[Question],
    ) -> Result<InterviewBreakdown, ServiceError> {
        let responses = self.responses.load_responses_for_interview(id).await?;
        Ok(InterviewBreakdown {
            by_difficulty: breakdown_by_difficulty(questions, &responses),
            questions: question_breakdown(questions, &responses),
        })
    }

    /// # Errors
    ///
    /// Returns a storage error if listing fails.
    pub async fn trends(&self, caller: UserId) -> Result<Vec<TrendPoint>, ServiceError> {
        let interviews = self.interviews.list_interviews_for_user(caller).await?;
        Ok(performance_trends(&interviews))
    }
}
