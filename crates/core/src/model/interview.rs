use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{InterviewId, QuestionId, UserId};
use crate::model::level::{InterviewLevel, Language};
use crate::model::question::Question;
use crate::model::score::Score;
use crate::stats::{Aggregate, InterviewStatistics};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InterviewError {
    #[error("interview title cannot be empty")]
    EmptyTitle,

    #[error("profession cannot be empty")]
    EmptyProfession,

    #[error("interview {interview} is not owned by {caller}")]
    NotOwner { interview: InterviewId, caller: UserId },

    #[error("completed interviews cannot move back to {0}")]
    AlreadyCompleted(InterviewStatus),

    #[error("questions can only be attached once, while in progress")]
    QuestionsLocked,

    #[error("question {0} belongs to another interview")]
    ForeignQuestion(QuestionId),

    #[error("question {question} does not belong to interview {interview}")]
    QuestionNotInInterview {
        interview: InterviewId,
        question: QuestionId,
    },

    #[error("statistics cover {stats} questions but the interview has {actual}")]
    StatisticsMismatch { stats: u32, actual: u32 },

    #[error("completed_at must be set iff the interview is completed")]
    CompletionMismatch,

    #[error("invalid interview status: {0}")]
    InvalidStatus(String),

    #[error("invalid interview type: {0}")]
    InvalidKind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    #[default]
    InProgress,
    Paused,
    Completed,
}

impl InterviewStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::InProgress => "in_progress",
            InterviewStatus::Paused => "paused",
            InterviewStatus::Completed => "completed",
        }
    }
}

impl FromStr for InterviewStatus {
    type Err = InterviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(InterviewStatus::InProgress),
            "paused" => Ok(InterviewStatus::Paused),
            "completed" => Ok(InterviewStatus::Completed),
            other => Err(InterviewError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewKind {
    #[default]
    AiGenerated,
    Custom,
}

impl InterviewKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewKind::AiGenerated => "ai_generated",
            InterviewKind::Custom => "custom",
        }
    }
}

impl FromStr for InterviewKind {
    type Err = InterviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ai_generated" => Ok(InterviewKind::AiGenerated),
            "custom" => Ok(InterviewKind::Custom),
            other => Err(InterviewError::InvalidKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterviewDraft {
    pub title: String,
    pub profession: String,
    pub kind: InterviewKind,
    pub level: Option<InterviewLevel>,
    pub language: Option<Language>,
}

/// Raw interview row, validated by [`Interview::from_persisted`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedInterview {
    pub id: InterviewId,
    pub user_id: UserId,
    pub title: String,
    pub profession: String,
    pub kind: InterviewKind,
    pub level: InterviewLevel,
    pub language: Language,
    pub status: InterviewStatus,
    pub duration_secs: u32,
    pub questions: Vec<QuestionId>,
    pub current_question_index: u32,
    pub total_score: Score,
    pub feedback: String,
    pub statistics: InterviewStatistics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A practice session and its lifecycle state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interview {
    id: InterviewId,
    user_id: UserId,
    title: String,
    profession: String,
    kind: InterviewKind,
    level: InterviewLevel,
    language: Language,
    status: InterviewStatus,
    duration_secs: u32,
    questions: Vec<QuestionId>,
    current_question_index: u32,
    total_score: Score,
    feedback: String,
    statistics: InterviewStatistics,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Interview {
    /// Create an interview in `in_progress` with no questions yet.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::EmptyTitle` or `InterviewError::EmptyProfession`.
    pub fn start(
        id: InterviewId,
        owner: UserId,
        draft: InterviewDraft,
        fallback_language: Language,
        now: DateTime<Utc>,
    ) -> Result<Self, InterviewError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(InterviewError::EmptyTitle);
        }
        let profession = draft.profession.trim().to_string();
        if profession.is_empty() {
            return Err(InterviewError::EmptyProfession);
        }

        Ok(Self {
            id,
            user_id: owner,
            title,
            profession,
            kind: draft.kind,
            level: draft.level.unwrap_or_default(),
            language: draft.language.unwrap_or(fallback_language),
            status: InterviewStatus::InProgress,
            duration_secs: 0,
            questions: Vec::new(),
            current_question_index: 0,
            total_score: Score::MIN,
            feedback: String::new(),
            statistics: InterviewStatistics::empty(0),
            created_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    /// Rehydrate from storage, checking the structural invariants.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::StatisticsMismatch` or `InterviewError::CompletionMismatch`.
    pub fn from_persisted(row: PersistedInterview) -> Result<Self, InterviewError> {
        let actual = u32::try_from(row.questions.len()).unwrap_or(u32::MAX);
        if row.statistics.total_questions != actual || !row.statistics.is_consistent() {
            return Err(InterviewError::StatisticsMismatch {
                stats: row.statistics.total_questions,
                actual,
            });
        }
        if (row.status == InterviewStatus::Completed) != row.completed_at.is_some() {
            return Err(InterviewError::CompletionMismatch);
        }

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            profession: row.profession,
            kind: row.kind,
            level: row.level,
            language: row.language,
            status: row.status,
            duration_secs: row.duration_secs,
            questions: row.questions,
            current_question_index: row.current_question_index,
            total_score: row.total_score,
            feedback: row.feedback,
            statistics: row.statistics,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        })
    }

    /// # Errors
    ///
    /// Returns `InterviewError::NotOwner` when `caller` is not the owner.
    pub fn ensure_owned_by(&self, caller: UserId) -> Result<(), InterviewError> {
        if self.user_id == caller {
            Ok(())
        } else {
            Err(InterviewError::NotOwner {
                interview: self.id,
                caller,
            })
        }
    }

    /// `in_progress -> paused`. Returns whether anything changed.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != InterviewStatus::InProgress {
            return false;
        }
        self.status = InterviewStatus::Paused;
        self.updated_at = now;
        true
    }

    /// `paused -> in_progress`. Returns whether anything changed.
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != InterviewStatus::Paused {
            return false;
        }
        self.status = InterviewStatus::InProgress;
        self.updated_at = now;
        true
    }

    /// Move to `completed`, stamping `completed_at` the first time only.
    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == InterviewStatus::Completed {
            return false;
        }
        self.status = InterviewStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
        true
    }

    /// Apply a requested status. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::AlreadyCompleted` when asked to leave `completed`.
    pub fn transition_to(
        &mut self,
        target: InterviewStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, InterviewError> {
        if self.status == InterviewStatus::Completed && target != InterviewStatus::Completed {
            return Err(InterviewError::AlreadyCompleted(target));
        }
        Ok(match target {
            InterviewStatus::Completed => self.complete(now),
            InterviewStatus::Paused => self.pause(now),
            InterviewStatus::InProgress => self.resume(now),
        })
    }

    /// Bulk-attach the question set. Allowed once, while `in_progress`.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::QuestionsLocked` or `InterviewError::ForeignQuestion`.
    pub fn attach_questions(
        &mut self,
        questions: &[Question],
        now: DateTime<Utc>,
    ) -> Result<(), InterviewError> {
        if self.status != InterviewStatus::InProgress || !self.questions.is_empty() {
            return Err(InterviewError::QuestionsLocked);
        }
        if let Some(q) = questions.iter().find(|q| q.interview_id != self.id) {
            return Err(InterviewError::ForeignQuestion(q.id));
        }

        let mut ordered: Vec<&Question> = questions.iter().collect();
        ordered.sort_by_key(|q| q.order);
        self.questions = ordered.into_iter().map(|q| q.id).collect();
        self.statistics =
            InterviewStatistics::empty(u32::try_from(self.questions.len()).unwrap_or(u32::MAX));
        self.updated_at = now;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `InterviewError::QuestionNotInInterview` for unknown question ids.
    pub fn ensure_has_question(&self, question: QuestionId) -> Result<(), InterviewError> {
        if self.questions.contains(&question) {
            Ok(())
        } else {
            Err(InterviewError::QuestionNotInInterview {
                interview: self.id,
                question,
            })
        }
    }

    /// Store a freshly recomputed aggregate.
    ///
    /// # Errors
    ///
    /// Returns `InterviewError::StatisticsMismatch` if the aggregate was computed
    /// for a different question count.
    pub fn apply_aggregate(
        &mut self,
        aggregate: Aggregate,
        now: DateTime<Utc>,
    ) -> Result<(), InterviewError> {
        let actual = self.question_count();
        if aggregate.statistics.total_questions != actual {
            return Err(InterviewError::StatisticsMismatch {
                stats: aggregate.statistics.total_questions,
                actual,
            });
        }
        self.statistics = aggregate.statistics;
        self.total_score = aggregate.total_score;
        self.duration_secs = aggregate.total_duration_secs;
        self.updated_at = now;
        Ok(())
    }

    /// Advance the cursor to the answered question's position; never moves back.
    pub fn record_progress(&mut self, order: u32) {
        let capped = order.min(self.question_count());
        self.current_question_index = self.current_question_index.max(capped);
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        u32::try_from(self.questions.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn id(&self) -> InterviewId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn profession(&self) -> &str {
        &self.profession
    }

    #[must_use]
    pub fn kind(&self) -> InterviewKind {
        self.kind
    }

    #[must_use]
    pub fn level(&self) -> InterviewLevel {
        self.level
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn status(&self) -> InterviewStatus {
        self.status
    }

    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionId] {
        &self.questions
    }

    #[must_use]
    pub fn current_question_index(&self) -> u32 {
        self.current_question_index
    }

    #[must_use]
    pub fn total_score(&self) -> Score {
        self.total_score
    }

    #[must_use]
    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    #[must_use]
    pub fn statistics(&self) -> InterviewStatistics {
        self.statistics
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}
