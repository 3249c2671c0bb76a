use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use api::{AppState, CALLER_HEADER, build_router};
use interview_core::model::{
    Assessment, Language, PaymentReceipt, Question, ResponseAnalysis, Score,
};
use interview_core::time::fixed_now;
use services::ai::{GeneratedQuestion, GenerationRequest, QuestionGenerator, ScoringClient};
use services::payment::{PaymentAuthorization, PaymentGateway, PaymentIntent};
use services::{AppServices, Clock, Collaborators, UpstreamError};
use storage::Storage;

/// Scores "fail..." answers as an upstream error, everything else as 80.
struct FixedScoring;

#[async_trait]
impl ScoringClient for FixedScoring {
    async fn evaluate(
        &self,
        _question: &Question,
        answer: &str,
        _language: Language,
    ) -> Result<Assessment, UpstreamError> {
        if answer.starts_with("fail") {
            return Err(UpstreamError::NotConfigured);
        }
        Ok(Assessment {
            score: Score::new(80).map_err(|e| UpstreamError::InvalidPayload(e.to_string()))?,
            feedback: "solid".into(),
            analysis: ResponseAnalysis::default(),
        })
    }
}

struct NoQuestions;

#[async_trait]
impl QuestionGenerator for NoQuestions {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<Vec<GeneratedQuestion>, UpstreamError> {
        Err(UpstreamError::EmptyResponse)
    }
}

struct ApprovingPayments;

#[async_trait]
impl PaymentGateway for ApprovingPayments {
    async fn charge(
        &self,
        intent: &PaymentIntent,
        authorization: &PaymentAuthorization,
    ) -> Result<PaymentReceipt, UpstreamError> {
        Ok(PaymentReceipt {
            transaction_id: format!("SALE-{}", authorization.payment_id),
            payment_id: Some(authorization.payment_id.clone()),
            amount: intent.amount(),
            currency: intent.currency().to_string(),
        })
    }
}

fn setup_app() -> Router {
    let collaborators = Collaborators {
        scoring: Arc::new(FixedScoring),
        generator: Arc::new(NoQuestions),
        payments: Arc::new(ApprovingPayments),
    };
    let services = AppServices::new(
        &Storage::in_memory(),
        Clock::fixed(fixed_now()),
        collaborators,
    );
    build_router(AppState::new(services))
}

fn request(method: &str, uri: &str, caller: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header(CALLER_HEADER, caller);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/users",
            None,
            Some(json!({"email": email, "firstName": "Ada", "lastName": "Lovelace"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["user"]["id"].as_str().expect("user id").to_string()
}

async fn create_interview(app: &Router, caller: &str) -> Value {
    let (status, body) = send(
        app,
        request(
            "POST",
            "/interviews",
            Some(caller),
            Some(json!({
                "title": "Backend loop",
                "profession": "Backend Engineer",
                "difficulty": "senior",
                "language": "en",
                "questions": [
                    {"questionText": "Explain backpressure", "difficulty": "hard"},
                    {"question": "What is a mutex?"}
                ]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn health_needs_no_caller() {
    let app = setup_app();
    let (status, body) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn registration_returns_trial_profile() {
    let app = setup_app();
    let user_id = register(&app, "ada@example.com").await;

    let (status, body) = send(&app, request("GET", "/users/me", Some(&user_id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], "free");
    assert_eq!(body["subscription"]["plan"], "free");
}

#[tokio::test]
async fn missing_caller_header_is_unauthorized() {
    let app = setup_app();
    let (status, body) = send(&app, request("GET", "/interviews", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, request("GET", "/interviews", Some("not-a-uuid"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn interview_is_created_with_ordered_questions() {
    let app = setup_app();
    let user_id = register(&app, "create@example.com").await;
    let body = create_interview(&app, &user_id).await;

    assert_eq!(body["interview"]["status"], "in_progress");
    assert_eq!(body["interview"]["difficulty"], "senior");
    assert_eq!(body["interview"]["statistics"]["totalQuestions"], 2);
    assert_eq!(body["questions"][0]["order"], 1);
    assert_eq!(body["questions"][0]["difficulty"], "hard");
    assert_eq!(body["questions"][1]["difficulty"], "medium");
    assert_eq!(body["questions"][1]["category"], "general");
}

#[tokio::test]
async fn unknown_level_is_a_bad_request() {
    let app = setup_app();
    let user_id = register(&app, "level@example.com").await;
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/interviews",
            Some(&user_id),
            Some(json!({"title": "x", "profession": "y", "difficulty": "wizard"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_owner_cannot_change_status() {
    let app = setup_app();
    let owner = register(&app, "owner@example.com").await;
    let intruder = register(&app, "intruder@example.com").await;
    let created = create_interview(&app, &owner).await;
    let id = created["interview"]["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/interviews/{id}/status"),
            Some(&intruder),
            Some(json!({"status": "completed"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    let (status, body) =
        send(&app, request("GET", &format!("/interviews/{id}"), Some(&owner), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interview"]["status"], "in_progress");
    assert!(body["interview"]["completedAt"].is_null());
}

#[tokio::test]
async fn completed_interview_cannot_resume() {
    let app = setup_app();
    let owner = register(&app, "resume@example.com").await;
    let created = create_interview(&app, &owner).await;
    let id = created["interview"]["id"].as_str().unwrap();
    let uri = format!("/interviews/{id}/status");

    let (status, body) = send(
        &app,
        request("PUT", &uri, Some(&owner), Some(json!({"status": "completed"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["completedAt"].is_string());

    let (status, _) = send(
        &app,
        request("PUT", &uri, Some(&owner), Some(json!({"status": "in_progress"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request("PUT", &uri, Some(&owner), Some(json!({"status": "archived"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scoring_failure_still_records_response() {
    let app = setup_app();
    let owner = register(&app, "score@example.com").await;
    let created = create_interview(&app, &owner).await;
    let interview_id = created["interview"]["id"].as_str().unwrap();
    let question_id = created["questions"][0]["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/responses",
            Some(&owner),
            Some(json!({
                "questionId": question_id,
                "interviewId": interview_id,
                "responseText": "fail on purpose",
                "duration": 40
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["response"]["score"], 50);
    assert_eq!(
        body["response"]["feedback"],
        "Unable to generate feedback at this time"
    );
    assert_eq!(body["interview"]["statistics"]["answeredQuestions"], 1);
    assert_eq!(body["interview"]["statistics"]["skippedQuestions"], 1);
    assert_eq!(body["interview"]["duration"], 40);

    let (status, listed) = send(
        &app,
        request("GET", &format!("/responses/interview/{interview_id}"), Some(&owner), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn unknown_interview_is_not_found() {
    let app = setup_app();
    let owner = register(&app, "missing@example.com").await;
    let (status, _) = send(
        &app,
        request(
            "GET",
            "/interviews/6f1c1f6e-8a8b-4f55-9d8e-2a3b4c5d6e7f",
            Some(&owner),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        send(&app, request("GET", "/interviews/nope", Some(&owner), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn detailed_stats_follow_premium_purchase() {
    let app = setup_app();
    let owner = register(&app, "stats@example.com").await;
    let created = create_interview(&app, &owner).await;
    let id = created["interview"]["id"].as_str().unwrap();
    let uri = format!("/stats/interview/{id}");

    let (status, body) = send(&app, request("GET", &uri, Some(&owner), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detailed"], false);
    assert!(body.get("questionBreakdown").is_none());

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/subscriptions/premium",
            Some(&owner),
            Some(json!({"paymentId": "PAY-9", "payerId": "PAYER-9"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plan"], "premium");

    let (_, body) = send(&app, request("GET", &uri, Some(&owner), None)).await;
    assert_eq!(body["detailed"], true);
    assert_eq!(body["questionBreakdown"].as_array().map(Vec::len), Some(2));

    let (status, body) = send(
        &app,
        request("GET", "/subscriptions/premium-access", Some(&owner), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hasPremiumAccess"], true);
}

#[tokio::test]
async fn report_download_needs_premium() {
    let app = setup_app();
    let owner = register(&app, "report@example.com").await;
    let created = create_interview(&app, &owner).await;
    let id = created["interview"]["id"].as_str().unwrap();
    let uri = format!("/stats/interview/{id}/report");

    let (status, body) = send(&app, request("GET", &uri, Some(&owner), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().is_some());

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/subscriptions/premium",
            Some(&owner),
            Some(json!({"paymentId": "PAY-4", "payerId": "PAYER-4"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, request("GET", &uri, Some(&owner), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detailed"], true);
    assert_eq!(body["questionBreakdown"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn cancelling_without_premium_is_forbidden() {
    let app = setup_app();
    let owner = register(&app, "cancel@example.com").await;
    let (status, _) = send(&app, request("DELETE", "/subscriptions", Some(&owner), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn generation_failure_is_a_bad_gateway() {
    let app = setup_app();
    let owner = register(&app, "gen@example.com").await;
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/interviews/generate-questions",
            Some(&owner),
            Some(json!({"profession": "SRE", "count": 3})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
}
