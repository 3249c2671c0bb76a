use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{InterviewId, QuestionId, ResponseId};
use crate::model::level::{DifficultyError, QuestionDifficulty};

pub const DEFAULT_TIME_LIMIT_SECS: u32 = 300;
pub const DEFAULT_CATEGORY: &str = "general";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {order} has no text")]
    EmptyText { order: u32 },

    #[error("question {order}: {source}")]
    Difficulty {
        order: u32,
        #[source]
        source: DifficultyError,
    },

    #[error("question {order} has a zero time limit")]
    ZeroTimeLimit { order: u32 },

    #[error("too many questions: {0}")]
    TooMany(usize),
}

/// Question as supplied by the caller or the generation collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub text: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub time_limit_secs: Option<u32>,
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub interview_id: InterviewId,
    pub text: String,
    pub audio_url: Option<String>,
    /// 1-based position, stable for the life of the interview.
    pub order: u32,
    pub category: String,
    pub difficulty: QuestionDifficulty,
    pub responses: Vec<ResponseId>,
    pub time_limit_secs: u32,
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Append a response reference; duplicates are ignored.
    pub fn record_response(&mut self, id: ResponseId) {
        if !self.responses.contains(&id) {
            self.responses.push(id);
        }
    }
}

/// Validate drafts for a bulk attach, assigning `order = 1..n` and normalizing difficulty.
///
/// # Errors
///
/// Returns `QuestionError` for the first draft that fails validation.
pub fn build_questions(
    interview_id: InterviewId,
    drafts: Vec<QuestionDraft>,
    now: DateTime<Utc>,
) -> Result<Vec<Question>, QuestionError> {
    let len = drafts.len();
    let mut out = Vec::with_capacity(len);
    for (idx, draft) in drafts.into_iter().enumerate() {
        let order = u32::try_from(idx + 1).map_err(|_| QuestionError::TooMany(len))?;

        let text = draft.text.trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText { order });
        }
        let difficulty = QuestionDifficulty::normalize_optional(draft.difficulty.as_deref())
            .map_err(|source| QuestionError::Difficulty { order, source })?;
        let time_limit_secs = draft.time_limit_secs.unwrap_or(DEFAULT_TIME_LIMIT_SECS);
        if time_limit_secs == 0 {
            return Err(QuestionError::ZeroTimeLimit { order });
        }
        let category = draft
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        out.push(Question {
            id: QuestionId::new(),
            interview_id,
            text,
            audio_url: draft.audio_url.filter(|u| !u.trim().is_empty()),
            order,
            category,
            difficulty,
            responses: Vec::new(),
            time_limit_secs,
            created_at: now,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft(text: &str, difficulty: Option<&str>) -> QuestionDraft {
        QuestionDraft {
            text: text.into(),
            difficulty: difficulty.map(Into::into),
            ..QuestionDraft::default()
        }
    }

    #[test]
    fn orders_are_one_based_and_defaults_applied() {
        let questions = build_questions(
            InterviewId::new(),
            vec![draft("What is ownership?", Some("fácil")), draft("Explain Pin", None)],
            fixed_now(),
        )
        .unwrap();

        assert_eq!(questions[0].order, 1);
        assert_eq!(questions[1].order, 2);
        assert_eq!(questions[0].difficulty, QuestionDifficulty::Easy);
        assert_eq!(questions[1].difficulty, QuestionDifficulty::Medium);
        assert_eq!(questions[1].category, DEFAULT_CATEGORY);
        assert_eq!(questions[1].time_limit_secs, 300);
    }

    #[test]
    fn unknown_difficulty_names_the_question() {
        let err = build_questions(
            InterviewId::new(),
            vec![draft("ok", None), draft("bad", Some("impossible"))],
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, QuestionError::Difficulty { order: 2, .. }));
    }

    #[test]
    fn blank_text_is_rejected() {
        let err = build_questions(InterviewId::new(), vec![draft("  ", None)], fixed_now())
            .unwrap_err();
        assert_eq!(err, QuestionError::EmptyText { order: 1 });
    }

    #[test]
    fn record_response_is_idempotent() {
        let mut q = build_questions(InterviewId::new(), vec![draft("q", None)], fixed_now())
            .unwrap()
            .remove(0);
        let id = ResponseId::new();
        q.record_response(id);
        q.record_response(id);
        assert_eq!(q.responses, vec![id]);
    }
}
