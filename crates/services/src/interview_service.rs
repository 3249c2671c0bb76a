use std::sync::Arc;

use tracing::{info, warn};

use interview_core::GatedAction;
use interview_core::model::{
    Interview, InterviewDraft, InterviewError, InterviewId, InterviewKind, InterviewStatus,
    Question, QuestionDifficulty, QuestionDraft, Response, UserId, build_questions,
};
use storage::repository::{InterviewRepository, ResponseRepository, UserRepository};

use crate::Clock;
use crate::ai::{GenerationRequest, QuestionGenerator};
use crate::entitlement_service::EntitlementService;
use crate::error::{LookupExt, ServiceError};

pub const MAX_GENERATED_QUESTIONS: u32 = 20;

/// An owned interview with everything hanging off it.
#[derive(Debug, Clone)]
pub struct InterviewDetail {
    pub interview: Interview,
    pub questions: Vec<Question>,
    pub responses: Vec<Response>,
}

/// Interview lifecycle: creation, status transitions, reads, deletion.
#[derive(Clone)]
pub struct InterviewService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    interviews: Arc<dyn InterviewRepository>,
    responses: Arc<dyn ResponseRepository>,
    generator: Arc<dyn QuestionGenerator>,
    entitlements: Arc<EntitlementService>,
}

impl InterviewService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        interviews: Arc<dyn InterviewRepository>,
        responses: Arc<dyn ResponseRepository>,
        generator: Arc<dyn QuestionGenerator>,
        entitlements: Arc<EntitlementService>,
    ) -> Self {
        Self {
            clock,
            users,
            interviews,
            responses,
            generator,
            entitlements,
        }
    }

    /// Create an interview in `in_progress` together with its question set.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` when the owner does not exist, or a
    /// validation error for a bad draft or question.
    pub async fn create(
        &self,
        owner: UserId,
        draft: InterviewDraft,
        questions: Vec<QuestionDraft>,
    ) -> Result<(Interview, Vec<Question>), ServiceError> {
        let user = self.users.get_user(owner).await.or_missing("user")?;
        if draft.kind == InterviewKind::Custom {
            self.entitlements
                .authorize(owner, GatedAction::CreateCustomInterview)
                .await?;
        }

        let now = self.clock.now();
        let mut interview = Interview::start(InterviewId::new(), owner, draft, user.language, now)?;
        let questions = build_questions(interview.id(), questions, now)?;
        interview.attach_questions(&questions, now)?;

        self.interviews
            .insert_interview_with_questions(&interview, &questions)
            .await
            .or_missing("user")?;
        info!(
            interview_id = %interview.id(),
            user_id = %owner,
            questions = questions.len(),
            "interview created"
        );
        Ok((interview, questions))
    }

    /// # Errors
    ///
    /// Returns a storage error if listing fails.
    pub async fn list(&self, caller: UserId) -> Result<Vec<Interview>, ServiceError> {
        Ok(self.interviews.list_interviews_for_user(caller).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or a forbidden error for a non-owner.
    pub async fn get(
        &self,
        caller: UserId,
        id: InterviewId,
    ) -> Result<InterviewDetail, ServiceError> {
        let (interview, questions) = self
            .interviews
            .load_interview_with_questions(id)
            .await
            .or_missing("interview")?;
        interview.ensure_owned_by(caller)?;
        let responses = self.responses.load_responses_for_interview(id).await?;
        Ok(InterviewDetail {
            interview,
            questions,
            responses,
        })
    }

    /// Owner-only load used by the other services.
    pub(crate) async fn load_owned(
        &self,
        caller: UserId,
        id: InterviewId,
    ) -> Result<Interview, ServiceError> {
        let interview = self.interviews.load_interview(id).await.or_missing("interview")?;
        interview.ensure_owned_by(caller)?;
        Ok(interview)
    }

    /// Apply a requested status. Repeating the current status is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a forbidden error for a non-owner and a validation error when
    /// asked to leave `completed`.
    pub async fn update_status(
        &self,
        caller: UserId,
        id: InterviewId,
        status: InterviewStatus,
    ) -> Result<Interview, ServiceError> {
        let mut interview = self.load_owned(caller, id).await?;
        let changed = interview.transition_to(status, self.clock.now())?;
        if changed {
            interview = self.interviews.store_status(&interview).await?;
            if interview.status() != status {
                return Err(InterviewError::AlreadyCompleted(status).into());
            }
            info!(interview_id = %id, user_id = %caller, %status, "interview status changed");
        }
        Ok(interview)
    }

    /// Delete the interview with its questions, responses and evaluation.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or a forbidden error for a non-owner.
    pub async fn delete(&self, caller: UserId, id: InterviewId) -> Result<(), ServiceError> {
        self.load_owned(caller, id).await?;
        self.interviews
            .delete_interview_cascade(id)
            .await
            .or_missing("interview")?;
        info!(interview_id = %id, user_id = %caller, "interview deleted");
        Ok(())
    }

    /// Ask the generation collaborator for questions, normalizing difficulty.
    ///
    /// Unrecognized difficulties fall back to medium with a warning.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad count or profession, and
    /// `ServiceError::Upstream` when generation fails.
    pub async fn generate_questions(
        &self,
        caller: UserId,
        request: GenerationRequest,
    ) -> Result<Vec<QuestionDraft>, ServiceError> {
        if request.profession.trim().is_empty() {
            return Err(ServiceError::Validation("profession is required".into()));
        }
        if request.count == 0 || request.count > MAX_GENERATED_QUESTIONS {
            return Err(ServiceError::Validation(format!(
                "question count must be between 1 and {MAX_GENERATED_QUESTIONS}"
            )));
        }
        self.entitlements
            .authorize(caller, GatedAction::GenerateAiQuestions)
            .await?;

        let generated = self.generator.generate(&request).await?;
        let drafts = generated
            .into_iter()
            .filter(|g| !g.question.trim().is_empty())
            .take(request.count as usize)
            .map(|g| {
                let difficulty = QuestionDifficulty::normalize_optional(g.difficulty.as_deref())
                    .unwrap_or_else(|err| {
                        warn!(
                            user_id = %caller,
                            difficulty = g.difficulty.as_deref().unwrap_or_default(),
                            error = %err,
                            "unrecognized generated difficulty; using medium"
                        );
                        QuestionDifficulty::Medium
                    });
                QuestionDraft {
                    text: g.question.trim().to_string(),
                    category: g.category,
                    difficulty: Some(difficulty.as_str().to_string()),
                    ..QuestionDraft::default()
                }
            })
            .collect();
        Ok(drafts)
    }
}
