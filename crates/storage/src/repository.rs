use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interview_core::model::{
    Evaluation, EvaluationId, Interview, InterviewId, InterviewStatus, Question, QuestionId,
    Response, ResponseId, Subscription, User, UserId,
};
use interview_core::stats::Aggregate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Accounts. `User::interviews` is maintained by the interview repository.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a newly registered user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the email is already registered.
    async fn insert_user(&self, user: &User) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_user(&self, id: UserId) -> Result<User, StorageError>;

    /// Write profile, cached tier and subscription reference. The interview list is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn update_user(&self, user: &User) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert or replace the user's single subscription record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the subscription cannot be stored.
    async fn upsert_subscription(&self, subscription: &Subscription) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn subscription_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, StorageError>;
}

#[async_trait]
pub trait InterviewRepository: Send + Sync {
    /// Store the interview and its questions and append it to the owner's list, atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the owner does not exist.
    async fn insert_interview_with_questions(
        &self,
        interview: &Interview,
        questions: &[Question],
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn load_interview(&self, id: InterviewId) -> Result<Interview, StorageError>;

    /// Interview plus its questions in `order`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn load_interview_with_questions(
        &self,
        id: InterviewId,
    ) -> Result<(Interview, Vec<Question>), StorageError>;

    /// Owner's interviews in creation order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_interviews_for_user(&self, user_id: UserId)
    -> Result<Vec<Interview>, StorageError>;

    /// Write the lifecycle fields (status, `updated_at`, `completed_at`) and
    /// return the stored interview. A row that is already `completed` stays
    /// as it is.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn store_status(&self, interview: &Interview) -> Result<Interview, StorageError>;

    /// Write a recomputed aggregate and advance the progress cursor to at
    /// least `progress`, leaving the lifecycle fields untouched. Returns the
    /// stored interview.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn store_aggregate(
        &self,
        id: InterviewId,
        aggregate: Aggregate,
        progress: u32,
        now: DateTime<Utc>,
    ) -> Result<Interview, StorageError>;

    /// Remove the interview with its questions, responses and evaluation, and
    /// drop it from the owner's list, atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn delete_interview_cascade(&self, id: InterviewId) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError>;
}

#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// Store a response and link it from its question, atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question is missing.
    async fn insert_response(&self, response: &Response) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn update_response(&self, response: &Response) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_response(&self, id: ResponseId) -> Result<Response, StorageError>;

    /// Every response of the interview in submission order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn load_responses_for_interview(
        &self,
        interview_id: InterviewId,
    ) -> Result<Vec<Response>, StorageError>;
}

#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the interview already has an evaluation.
    async fn insert_evaluation(&self, evaluation: &Evaluation) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_evaluation(&self, id: EvaluationId) -> Result<Evaluation, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn evaluation_for_interview(
        &self,
        interview_id: InterviewId,
    ) -> Result<Option<Evaluation>, StorageError>;

    /// Newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_evaluations_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Evaluation>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn update_evaluation(&self, evaluation: &Evaluation) -> Result<(), StorageError>;
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    subscriptions: HashMap<UserId, Subscription>,
    interviews: HashMap<InterviewId, Interview>,
    questions: HashMap<QuestionId, Question>,
    responses: HashMap<ResponseId, (u64, Response)>,
    evaluations: HashMap<EvaluationId, Evaluation>,
    next_seq: u64,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// All maps live behind one lock so multi-entity writes are atomic.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.users.values().any(|u| u.email == user.email) || guard.users.contains_key(&user.id)
        {
            return Err(StorageError::Conflict);
        }
        guard.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<User, StorageError> {
        let guard = self.lock()?;
        guard.users.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn update_user(&self, user: &User) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let stored = guard.users.get_mut(&user.id).ok_or(StorageError::NotFound)?;
        let interviews = std::mem::take(&mut stored.interviews);
        *stored = User {
            interviews,
            ..user.clone()
        };
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryRepository {
    async fn upsert_subscription(&self, subscription: &Subscription) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.users.contains_key(&subscription.user_id) {
            return Err(StorageError::NotFound);
        }
        guard
            .subscriptions
            .insert(subscription.user_id, subscription.clone());
        Ok(())
    }

    async fn subscription_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.subscriptions.get(&user_id).cloned())
    }
}

#[async_trait]
impl InterviewRepository for InMemoryRepository {
    async fn insert_interview_with_questions(
        &self,
        interview: &Interview,
        questions: &[Question],
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.interviews.contains_key(&interview.id()) {
            return Err(StorageError::Conflict);
        }
        let owner = guard
            .users
            .get_mut(&interview.user_id())
            .ok_or(StorageError::NotFound)?;
        owner.interviews.push(interview.id());

        for question in questions {
            guard.questions.insert(question.id, question.clone());
        }
        guard.interviews.insert(interview.id(), interview.clone());
        Ok(())
    }

    async fn load_interview(&self, id: InterviewId) -> Result<Interview, StorageError> {
        let guard = self.lock()?;
        guard.interviews.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn load_interview_with_questions(
        &self,
        id: InterviewId,
    ) -> Result<(Interview, Vec<Question>), StorageError> {
        let guard = self.lock()?;
        let interview = guard.interviews.get(&id).cloned().ok_or(StorageError::NotFound)?;
        let mut questions: Vec<Question> = guard
            .questions
            .values()
            .filter(|q| q.interview_id == id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.order);
        Ok((interview, questions))
    }

    async fn list_interviews_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Interview>, StorageError> {
        let guard = self.lock()?;
        let Some(user) = guard.users.get(&user_id) else {
            return Ok(Vec::new());
        };
        Ok(user
            .interviews
            .iter()
            .filter_map(|id| guard.interviews.get(id).cloned())
            .collect())
    }

    async fn store_status(&self, interview: &Interview) -> Result<Interview, StorageError> {
        let mut guard = self.lock()?;
        let stored = guard
            .interviews
            .get_mut(&interview.id())
            .ok_or(StorageError::NotFound)?;
        if stored.status() != InterviewStatus::Completed {
            stored
                .transition_to(interview.status(), interview.updated_at())
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
        }
        Ok(stored.clone())
    }

    async fn store_aggregate(
        &self,
        id: InterviewId,
        aggregate: Aggregate,
        progress: u32,
        now: DateTime<Utc>,
    ) -> Result<Interview, StorageError> {
        let mut guard = self.lock()?;
        let stored = guard.interviews.get_mut(&id).ok_or(StorageError::NotFound)?;
        stored
            .apply_aggregate(aggregate, now)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        stored.record_progress(progress);
        Ok(stored.clone())
    }

    async fn delete_interview_cascade(&self, id: InterviewId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let interview = guard.interviews.remove(&id).ok_or(StorageError::NotFound)?;
        guard.questions.retain(|_, q| q.interview_id != id);
        guard.responses.retain(|_, (_, r)| r.interview_id != id);
        guard.evaluations.retain(|_, e| e.interview_id != id);
        if let Some(owner) = guard.users.get_mut(&interview.user_id()) {
            owner.interviews.retain(|i| *i != id);
        }
        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError> {
        let guard = self.lock()?;
        guard.questions.get(&id).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ResponseRepository for InMemoryRepository {
    async fn insert_response(&self, response: &Response) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.responses.contains_key(&response.id) {
            return Err(StorageError::Conflict);
        }
        let question = guard
            .questions
            .get_mut(&response.question_id)
            .ok_or(StorageError::NotFound)?;
        question.record_response(response.id);

        let seq = guard.next_seq;
        guard.next_seq += 1;
        guard.responses.insert(response.id, (seq, response.clone()));
        Ok(())
    }

    async fn update_response(&self, response: &Response) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let (_, stored) = guard
            .responses
            .get_mut(&response.id)
            .ok_or(StorageError::NotFound)?;
        *stored = response.clone();
        Ok(())
    }

    async fn get_response(&self, id: ResponseId) -> Result<Response, StorageError> {
        let guard = self.lock()?;
        guard
            .responses
            .get(&id)
            .map(|(_, r)| r.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn load_responses_for_interview(
        &self,
        interview_id: InterviewId,
    ) -> Result<Vec<Response>, StorageError> {
        let guard = self.lock()?;
        let mut found: Vec<&(u64, Response)> = guard
            .responses
            .values()
            .filter(|(_, r)| r.interview_id == interview_id)
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        Ok(found.into_iter().map(|(_, r)| r.clone()).collect())
    }
}

#[async_trait]
impl EvaluationRepository for InMemoryRepository {
    async fn insert_evaluation(&self, evaluation: &Evaluation) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard
            .evaluations
            .values()
            .any(|e| e.interview_id == evaluation.interview_id)
        {
            return Err(StorageError::Conflict);
        }
        if !guard.interviews.contains_key(&evaluation.interview_id) {
            return Err(StorageError::NotFound);
        }
        guard.evaluations.insert(evaluation.id, evaluation.clone());
        Ok(())
    }

    async fn get_evaluation(&self, id: EvaluationId) -> Result<Evaluation, StorageError> {
        let guard = self.lock()?;
        guard.evaluations.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn evaluation_for_interview(
        &self,
        interview_id: InterviewId,
    ) -> Result<Option<Evaluation>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .evaluations
            .values()
            .find(|e| e.interview_id == interview_id)
            .cloned())
    }

    async fn list_evaluations_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Evaluation>, StorageError> {
        let guard = self.lock()?;
        let mut found: Vec<Evaluation> = guard
            .evaluations
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn update_evaluation(&self, evaluation: &Evaluation) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let stored = guard
            .evaluations
            .get_mut(&evaluation.id)
            .ok_or(StorageError::NotFound)?;
        *stored = evaluation.clone();
        Ok(())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub interviews: Arc<dyn InterviewRepository>,
    pub responses: Arc<dyn ResponseRepository>,
    pub evaluations: Arc<dyn EvaluationRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_backend(InMemoryRepository::new())
    }

    /// Wire every repository to the same backend.
    #[must_use]
    pub fn from_backend<R>(repo: R) -> Self
    where
        R: UserRepository
            + SubscriptionRepository
            + InterviewRepository
            + ResponseRepository
            + EvaluationRepository
            + Clone
            + 'static,
    {
        Self {
            users: Arc::new(repo.clone()),
            subscriptions: Arc::new(repo.clone()),
            interviews: Arc::new(repo.clone()),
            responses: Arc::new(repo.clone()),
            evaluations: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_core::model::{
        Assessment, InterviewDraft, Language, QuestionDraft, ResponseDraft, UserDraft,
        build_questions,
    };
    use interview_core::stats::recompute;
    use interview_core::time::fixed_now;

    fn minutes_later(minutes: i64) -> DateTime<Utc> {
        fixed_now() + chrono::Duration::minutes(minutes)
    }

    fn user(email: &str) -> User {
        UserDraft {
            email: email.into(),
            first_name: "Ada".into(),
            last_name: "L".into(),
            ..UserDraft::default()
        }
        .register(UserId::new(), fixed_now())
        .unwrap()
    }

    async fn seeded(repo: &InMemoryRepository) -> (User, Interview, Vec<Question>) {
        let owner = user("owner@example.com");
        repo.insert_user(&owner).await.unwrap();
        let mut interview = Interview::start(
            InterviewId::new(),
            owner.id,
            InterviewDraft {
                title: "Systems".into(),
                profession: "SRE".into(),
                ..InterviewDraft::default()
            },
            Language::En,
            fixed_now(),
        )
        .unwrap();
        let questions = build_questions(
            interview.id(),
            vec![
                QuestionDraft {
                    text: "one".into(),
                    ..QuestionDraft::default()
                },
                QuestionDraft {
                    text: "two".into(),
                    ..QuestionDraft::default()
                },
            ],
            fixed_now(),
        )
        .unwrap();
        interview.attach_questions(&questions, fixed_now()).unwrap();
        repo.insert_interview_with_questions(&interview, &questions)
            .await
            .unwrap();
        (owner, interview, questions)
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let repo = InMemoryRepository::new();
        repo.insert_user(&user("a@example.com")).await.unwrap();
        let err = repo.insert_user(&user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn update_user_keeps_interview_list() {
        let repo = InMemoryRepository::new();
        let (owner, interview, _) = seeded(&repo).await;
        let mut stale = owner.clone();
        stale.profession = "Platform".into();
        repo.update_user(&stale).await.unwrap();
        let stored = repo.get_user(owner.id).await.unwrap();
        assert_eq!(stored.profession, "Platform");
        assert_eq!(stored.interviews, vec![interview.id()]);
    }

    #[tokio::test]
    async fn response_insert_links_question() {
        let repo = InMemoryRepository::new();
        let (_, interview, questions) = seeded(&repo).await;
        let response = Response::submit(
            ResponseId::new(),
            ResponseDraft {
                question_id: questions[1].id,
                interview_id: interview.id(),
                text: Some("x".into()),
                audio_url: None,
                duration_secs: None,
            },
            Assessment::unscored(),
            fixed_now(),
        );
        repo.insert_response(&response).await.unwrap();
        let question = repo.get_question(questions[1].id).await.unwrap();
        assert_eq!(question.responses, vec![response.id]);
        let all = repo.load_responses_for_interview(interview.id()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn cascade_delete_leaves_no_orphans() {
        let repo = InMemoryRepository::new();
        let (owner, interview, questions) = seeded(&repo).await;
        let response = Response::submit(
            ResponseId::new(),
            ResponseDraft {
                question_id: questions[0].id,
                interview_id: interview.id(),
                text: Some("x".into()),
                audio_url: None,
                duration_secs: None,
            },
            Assessment::unscored(),
            fixed_now(),
        );
        repo.insert_response(&response).await.unwrap();

        repo.delete_interview_cascade(interview.id()).await.unwrap();

        assert!(matches!(
            repo.load_interview(interview.id()).await,
            Err(StorageError::NotFound)
        ));
        assert!(matches!(
            repo.get_question(questions[0].id).await,
            Err(StorageError::NotFound)
        ));
        assert!(matches!(
            repo.get_response(response.id).await,
            Err(StorageError::NotFound)
        ));
        assert!(repo.get_user(owner.id).await.unwrap().interviews.is_empty());
        assert!(matches!(
            repo.delete_interview_cascade(interview.id()).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn aggregate_write_keeps_completion() {
        let repo = InMemoryRepository::new();
        let (_, interview, questions) = seeded(&repo).await;

        let mut finished = interview.clone();
        finished.complete(minutes_later(5));
        repo.store_status(&finished).await.unwrap();

        let response = Response::submit(
            ResponseId::new(),
            ResponseDraft {
                question_id: questions[0].id,
                interview_id: interview.id(),
                text: Some("x".into()),
                audio_url: None,
                duration_secs: Some(30),
            },
            Assessment::unscored(),
            fixed_now(),
        );
        repo.insert_response(&response).await.unwrap();
        let aggregate = recompute(interview.question_count(), &[response]);
        let stored = repo
            .store_aggregate(interview.id(), aggregate, 1, minutes_later(6))
            .await
            .unwrap();

        assert_eq!(stored.status(), InterviewStatus::Completed);
        assert_eq!(stored.completed_at(), Some(minutes_later(5)));
        assert_eq!(stored.statistics().answered_questions, 1);
        assert_eq!(stored.duration_secs(), 30);
        assert_eq!(stored.current_question_index(), 1);
        assert_eq!(repo.load_interview(interview.id()).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn completed_interview_is_not_reopened_by_stale_status_write() {
        let repo = InMemoryRepository::new();
        let (_, interview, _) = seeded(&repo).await;

        let mut finished = interview.clone();
        finished.complete(minutes_later(5));
        repo.store_status(&finished).await.unwrap();

        let mut stale = interview.clone();
        stale.pause(minutes_later(6));
        let stored = repo.store_status(&stale).await.unwrap();

        assert_eq!(stored.status(), InterviewStatus::Completed);
        assert_eq!(stored.completed_at(), Some(minutes_later(5)));
    }
}
