use std::sync::Arc;

use tracing::{info, warn};

use interview_core::GatedAction;
use interview_core::model::{
    Assessment, Interview, InterviewId, Language, Question, Response, ResponseDraft, ResponseId,
    ResponseUpdate, UserId,
};
use interview_core::stats::recompute;
use storage::repository::{InterviewRepository, ResponseRepository};

use crate::Clock;
use crate::ai::ScoringClient;
use crate::entitlement_service::EntitlementService;
use crate::error::{LookupExt, ServiceError};

/// Response submission and edits, each followed by a full re-aggregation.
#[derive(Clone)]
pub struct ResponseService {
    clock: Clock,
    interviews: Arc<dyn InterviewRepository>,
    responses: Arc<dyn ResponseRepository>,
    scoring: Arc<dyn ScoringClient>,
    entitlements: Arc<EntitlementService>,
}

impl ResponseService {
    #[must_use]
    pub fn new(
        clock: Clock,
        interviews: Arc<dyn InterviewRepository>,
        responses: Arc<dyn ResponseRepository>,
        scoring: Arc<dyn ScoringClient>,
        entitlements: Arc<EntitlementService>,
    ) -> Self {
        Self {
            clock,
            interviews,
            responses,
            scoring,
            entitlements,
        }
    }

    /// Score and store a response, then recompute the interview aggregates.
    ///
    /// Scoring failures never fail the submission; the response keeps the
    /// fallback score and feedback instead.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown interview, a forbidden
    /// error for a non-owner or a tier without voice answers, and a
    /// validation error when the question is not part of the interview.
    pub async fn submit(
        &self,
        caller: UserId,
        draft: ResponseDraft,
    ) -> Result<(Response, Interview), ServiceError> {
        let (mut interview, questions) = self
            .interviews
            .load_interview_with_questions(draft.interview_id)
            .await
            .or_missing("interview")?;
        interview.ensure_owned_by(caller)?;
        interview.ensure_has_question(draft.question_id)?;
        let question = find_question(&questions, &draft)?;
        if has_audio(draft.audio_url.as_deref()) {
            self.entitlements
                .authorize(caller, GatedAction::UseVoiceInterview)
                .await?;
        }

        let assessment = self
            .assess(question, draft.text.as_deref(), interview.language())
            .await;
        let response = Response::submit(ResponseId::new(), draft, assessment, self.clock.now());
        self.responses
            .insert_response(&response)
            .await
            .or_missing("question")?;

        interview.record_progress(question.order);
        self.reaggregate(&mut interview).await?;
        info!(
            interview_id = %interview.id(),
            user_id = %caller,
            score = response.score.value(),
            "response recorded"
        );
        Ok((response, interview))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or a forbidden error for a non-owner.
    pub async fn get(&self, caller: UserId, id: ResponseId) -> Result<Response, ServiceError> {
        let response = self.responses.get_response(id).await.or_missing("response")?;
        self.owned_interview(caller, response.interview_id).await?;
        Ok(response)
    }

    /// Responses of an owned interview in submission order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or a forbidden error for a non-owner.
    pub async fn list_for_interview(
        &self,
        caller: UserId,
        interview_id: InterviewId,
    ) -> Result<Vec<Response>, ServiceError> {
        self.owned_interview(caller, interview_id).await?;
        Ok(self
            .responses
            .load_responses_for_interview(interview_id)
            .await?)
    }

    /// Edit a response. Changed text is scored again; aggregates are always recomputed.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or a forbidden error for a non-owner.
    pub async fn update(
        &self,
        caller: UserId,
        id: ResponseId,
        update: ResponseUpdate,
    ) -> Result<Response, ServiceError> {
        let mut response = self.responses.get_response(id).await.or_missing("response")?;
        let (mut interview, questions) = self
            .interviews
            .load_interview_with_questions(response.interview_id)
            .await
            .or_missing("interview")?;
        interview.ensure_owned_by(caller)?;
        if has_audio(update.audio_url.as_deref()) {
            self.entitlements
                .authorize(caller, GatedAction::UseVoiceInterview)
                .await?;
        }

        let now = self.clock.now();
        if response.revise(update, now) {
            let question = questions
                .iter()
                .find(|q| q.id == response.question_id)
                .ok_or(ServiceError::NotFound("question"))?;
            let assessment = self
                .assess(question, Some(response.text.as_str()), interview.language())
                .await;
            response.apply_assessment(assessment, now);
        }
        self.responses.update_response(&response).await?;

        self.reaggregate(&mut interview).await?;
        Ok(response)
    }

    async fn owned_interview(
        &self,
        caller: UserId,
        id: InterviewId,
    ) -> Result<Interview, ServiceError> {
        let interview = self.interviews.load_interview(id).await.or_missing("interview")?;
        interview.ensure_owned_by(caller)?;
        Ok(interview)
    }

    async fn assess(&self, question: &Question, text: Option<&str>, language: Language) -> Assessment {
        let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
            return Assessment::unscored();
        };
        match self.scoring.evaluate(question, text, language).await {
            Ok(assessment) => assessment,
            Err(err) => {
                warn!(
                    interview_id = %question.interview_id,
                    question_id = %question.id,
                    error = %err,
                    "scoring failed; storing fallback assessment"
                );
                Assessment::scoring_unavailable()
            }
        }
    }

    /// Full recomputation over every stored response of the interview. Only
    /// the aggregate columns are written; `interview` is replaced by the
    /// stored row so a concurrent status change shows through.
    async fn reaggregate(&self, interview: &mut Interview) -> Result<(), ServiceError> {
        let responses = self
            .responses
            .load_responses_for_interview(interview.id())
            .await?;
        let aggregate = recompute(interview.question_count(), &responses);
        let now = self.clock.now();
        interview.apply_aggregate(aggregate, now)?;
        *interview = self
            .interviews
            .store_aggregate(interview.id(), aggregate, interview.current_question_index(), now)
            .await?;
        Ok(())
    }
}

fn has_audio(url: Option<&str>) -> bool {
    url.is_some_and(|u| !u.trim().is_empty())
}

fn find_question<'a>(
    questions: &'a [Question],
    draft: &ResponseDraft,
) -> Result<&'a Question, ServiceError> {
    questions
        .iter()
        .find(|q| q.id == draft.question_id)
        .ok_or(ServiceError::NotFound("question"))
}
