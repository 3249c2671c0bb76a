use chrono::Duration;
use interview_core::AccessTier;
use interview_core::model::{
    Assessment, Evaluation, EvaluationId, Interview, InterviewDraft, InterviewId, InterviewStatus,
    Language, PaymentReceipt, Question, QuestionDifficulty, QuestionDraft, Response,
    ResponseAnalysis, ResponseDraft, ResponseId, Score, Subscription, User, UserDraft, UserId,
    build_questions,
};
use interview_core::stats::recompute;
use interview_core::time::fixed_now;
use storage::repository::{
    EvaluationRepository, InterviewRepository, ResponseRepository, StorageError,
    SubscriptionRepository, UserRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn user(email: &str) -> User {
    UserDraft {
        email: email.into(),
        first_name: "Grace".into(),
        last_name: "Hopper".into(),
        profession: Some("Engineer".into()),
        language: Some(Language::Fr),
    }
    .register(UserId::new(), fixed_now())
    .unwrap()
}

async fn seeded(repo: &SqliteRepository, email: &str) -> (User, Interview, Vec<Question>) {
    let owner = user(email);
    repo.insert_user(&owner).await.unwrap();

    let mut interview = Interview::start(
        InterviewId::new(),
        owner.id,
        InterviewDraft {
            title: "Compilers".into(),
            profession: "Engineer".into(),
            ..InterviewDraft::default()
        },
        owner.language,
        fixed_now(),
    )
    .unwrap();
    let questions = build_questions(
        interview.id(),
        vec![
            QuestionDraft {
                text: "What is SSA?".into(),
                difficulty: Some("difícil".into()),
                ..QuestionDraft::default()
            },
            QuestionDraft {
                text: "Explain register allocation".into(),
                category: Some("backend".into()),
                ..QuestionDraft::default()
            },
            QuestionDraft {
                text: "What is a basic block?".into(),
                difficulty: Some("easy".into()),
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

fn answer(question: &Question, score: u8) -> Response {
    Response::submit(
        ResponseId::new(),
        ResponseDraft {
            question_id: question.id,
            interview_id: question.interview_id,
            text: Some("answer".into()),
            audio_url: None,
            duration_secs: Some(60),
        },
        Assessment {
            score: Score::new(score).unwrap(),
            feedback: "fine".into(),
            analysis: ResponseAnalysis {
                strengths: vec!["structured".into()],
                areas_for_improvement: Vec::new(),
                keywords: vec!["ssa".into()],
            },
        },
        fixed_now(),
    )
}

#[tokio::test]
async fn user_and_subscription_roundtrip() {
    let repo = connect("memdb_users").await;
    let mut owner = user("Grace@Example.com");
    repo.insert_user(&owner).await.unwrap();
    assert!(matches!(
        repo.insert_user(&user("grace@example.com")).await,
        Err(StorageError::Conflict)
    ));

    let mut sub = Subscription::free_for(owner.id, fixed_now());
    repo.upsert_subscription(&sub).await.unwrap();
    sub.activate_premium(
        &PaymentReceipt {
            transaction_id: "TX".into(),
            payment_id: Some("PAY".into()),
            amount: 9.99,
            currency: "USD".into(),
        },
        fixed_now(),
    );
    repo.upsert_subscription(&sub).await.unwrap();

    let stored = repo.subscription_for_user(owner.id).await.unwrap().unwrap();
    assert!(stored.is_active_premium());
    assert_eq!(stored.end_date, Some(fixed_now() + Duration::days(30)));

    owner.subscription_id = Some(sub.id);
    owner.set_cached_tier(AccessTier::Premium, fixed_now());
    repo.update_user(&owner).await.unwrap();
    let fetched = repo.get_user(owner.id).await.unwrap();
    assert_eq!(fetched.email, "grace@example.com");
    assert_eq!(fetched.language, Language::Fr);
    assert_eq!(fetched.subscription_status, AccessTier::Premium);
    assert_eq!(fetched.subscription_id, Some(sub.id));
}

#[tokio::test]
async fn interview_with_questions_and_aggregates_roundtrip() {
    let repo = connect("memdb_interviews").await;
    let (owner, mut interview, questions) = seeded(&repo, "a@example.com").await;

    assert_eq!(
        repo.get_user(owner.id).await.unwrap().interviews,
        vec![interview.id()]
    );

    let r1 = answer(&questions[0], 80);
    let r2 = answer(&questions[1], 60);
    repo.insert_response(&r1).await.unwrap();
    repo.insert_response(&r2).await.unwrap();

    let responses = repo.load_responses_for_interview(interview.id()).await.unwrap();
    assert_eq!(responses.len(), 2);
    interview = repo
        .store_aggregate(
            interview.id(),
            recompute(interview.question_count(), &responses),
            2,
            fixed_now(),
        )
        .await
        .unwrap();
    assert_eq!(interview.current_question_index(), 2);
    interview.complete(fixed_now());
    interview = repo.store_status(&interview).await.unwrap();

    let (loaded, loaded_questions) = repo
        .load_interview_with_questions(interview.id())
        .await
        .unwrap();
    assert_eq!(loaded, interview);
    assert_eq!(loaded.status(), InterviewStatus::Completed);
    assert_eq!(loaded.total_score().value(), 70);
    assert_eq!(loaded.statistics().answered_questions, 2);
    assert_eq!(loaded.statistics().skipped_questions, 1);
    assert_eq!(loaded_questions.len(), 3);
    assert_eq!(loaded_questions[0].difficulty, QuestionDifficulty::Hard);
    assert_eq!(loaded_questions[0].responses, vec![r1.id]);
    assert_eq!(loaded_questions[1].category, "backend");
    assert!(loaded_questions[2].responses.is_empty());

    let question = repo.get_question(questions[1].id).await.unwrap();
    assert_eq!(question.responses, vec![r2.id]);
}

#[tokio::test]
async fn response_for_unknown_question_is_not_found() {
    let repo = connect("memdb_orphan_response").await;
    let (_, interview, _) = seeded(&repo, "b@example.com").await;
    let stray = Response::submit(
        ResponseId::new(),
        ResponseDraft {
            question_id: interview_core::model::QuestionId::new(),
            interview_id: interview.id(),
            text: None,
            audio_url: None,
            duration_secs: None,
        },
        Assessment::unscored(),
        fixed_now(),
    );
    assert!(matches!(
        repo.insert_response(&stray).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn cascade_delete_removes_everything() {
    let repo = connect("memdb_cascade").await;
    let (owner, mut interview, questions) = seeded(&repo, "c@example.com").await;
    let response = answer(&questions[0], 40);
    repo.insert_response(&response).await.unwrap();

    interview.complete(fixed_now());
    repo.store_status(&interview).await.unwrap();
    let evaluation = Evaluation::from_interview(
        EvaluationId::new(),
        &interview,
        &questions,
        &[response.clone()],
        fixed_now(),
    )
    .unwrap();
    repo.insert_evaluation(&evaluation).await.unwrap();
    assert!(matches!(
        repo.insert_evaluation(&Evaluation {
            id: EvaluationId::new(),
            ..evaluation.clone()
        })
        .await,
        Err(StorageError::Conflict)
    ));

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
    assert!(matches!(
        repo.get_evaluation(evaluation.id).await,
        Err(StorageError::NotFound)
    ));
    assert!(repo.get_user(owner.id).await.unwrap().interviews.is_empty());
    assert!(matches!(
        repo.delete_interview_cascade(interview.id()).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn evaluation_unlock_persists() {
    let repo = connect("memdb_evaluations").await;
    let (owner, mut interview, questions) = seeded(&repo, "d@example.com").await;
    interview.complete(fixed_now());
    repo.store_status(&interview).await.unwrap();

    let mut evaluation =
        Evaluation::from_interview(EvaluationId::new(), &interview, &questions, &[], fixed_now())
            .unwrap();
    repo.insert_evaluation(&evaluation).await.unwrap();
    assert!(evaluation.requires_payment());

    evaluation.unlock_paid(fixed_now());
    repo.update_evaluation(&evaluation).await.unwrap();

    let stored = repo
        .evaluation_for_interview(interview.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, evaluation);
    assert_eq!(
        repo.list_evaluations_for_user(owner.id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn aggregate_write_leaves_completion_intact() {
    let repo = connect("memdb_aggregate_race").await;
    let (_, interview, questions) = seeded(&repo, "race@example.com").await;

    let mut finished = interview.clone();
    finished.complete(fixed_now());
    repo.store_status(&finished).await.unwrap();

    let response = answer(&questions[0], 90);
    repo.insert_response(&response).await.unwrap();
    let stored = repo
        .store_aggregate(
            interview.id(),
            recompute(interview.question_count(), &[response]),
            1,
            fixed_now(),
        )
        .await
        .unwrap();
    assert_eq!(stored.status(), InterviewStatus::Completed);
    assert_eq!(stored.completed_at(), Some(fixed_now()));
    assert_eq!(stored.total_score().value(), 90);
    assert_eq!(stored.current_question_index(), 1);

    let mut stale = interview.clone();
    stale.pause(fixed_now());
    let after = repo.store_status(&stale).await.unwrap();
    assert_eq!(after.status(), InterviewStatus::Completed);
    assert_eq!(after.completed_at(), Some(fixed_now()));
    assert_eq!(after.total_score().value(), 90);
}
