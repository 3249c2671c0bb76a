mod common;

use std::sync::Arc;

use interview_core::model::{InterviewStatus, ResponseDraft};
use interview_core::time::fixed_now;
use services::{AppServices, Clock};

use common::{RecordingPayments, draft, fakes, questions, register};

#[tokio::test]
async fn interview_round_trip_on_sqlite() {
    let payments = Arc::new(RecordingPayments::default());
    let services = AppServices::new_sqlite(
        "sqlite:file:memdb_services_flow?mode=memory&cache=shared",
        Clock::fixed(fixed_now()),
        fakes(payments, Vec::new()),
    )
    .await
    .expect("connect sqlite");

    let user = register(&services, "sqlite@example.com").await;
    let (interview, qs) = services
        .interviews()
        .create(user.id, draft("Persisted"), questions(3))
        .await
        .expect("create");

    for (question, text) in qs.iter().zip(["80 solid", "60 partial"]) {
        services
            .responses()
            .submit(
                user.id,
                ResponseDraft {
                    question_id: question.id,
                    interview_id: interview.id(),
                    text: Some(text.into()),
                    audio_url: None,
                    duration_secs: Some(40),
                },
            )
            .await
            .expect("submit");
    }
    services
        .interviews()
        .update_status(user.id, interview.id(), InterviewStatus::Completed)
        .await
        .expect("complete");

    let detail = services.interviews().get(user.id, interview.id()).await.expect("get");
    assert_eq!(detail.interview.status(), InterviewStatus::Completed);
    assert_eq!(detail.interview.total_score().value(), 70);
    assert_eq!(detail.interview.statistics().skipped_questions, 1);
    assert_eq!(detail.interview.duration_secs(), 80);
    assert_eq!(detail.responses.len(), 2);
    assert_eq!(detail.questions[0].responses.len(), 1);

    let view = services
        .evaluations()
        .create(user.id, interview.id())
        .await
        .expect("evaluate");
    assert_eq!(view.evaluation.overall_score.value(), 70);
    assert!(view.detail_visible);

    services
        .interviews()
        .delete(user.id, interview.id())
        .await
        .expect("delete");
    assert!(services.evaluations().list(user.id).await.unwrap().is_empty());
    assert!(services.interviews().list(user.id).await.unwrap().is_empty());
}
