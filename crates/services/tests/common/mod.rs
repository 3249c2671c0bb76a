#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::Notify;

use interview_core::model::{
    Assessment, InterviewDraft, Language, PaymentReceipt, Question, QuestionDraft,
    ResponseAnalysis, Score, User, UserDraft,
};
use interview_core::time::fixed_now;
use services::ai::{GeneratedQuestion, GenerationRequest, QuestionGenerator, ScoringClient};
use services::payment::{PaymentAuthorization, PaymentGateway, PaymentIntent};
use services::{AppServices, Clock, Collaborators, UpstreamError};
use storage::repository::Storage;

/// Scores an answer by its leading number; answers starting with "fail" error out.
pub struct LeadingNumberScoring;

#[async_trait]
impl ScoringClient for LeadingNumberScoring {
    async fn evaluate(
        &self,
        _question: &Question,
        answer: &str,
        _language: Language,
    ) -> Result<Assessment, UpstreamError> {
        if answer.starts_with("fail") {
            return Err(UpstreamError::EmptyResponse);
        }
        let digits: String = answer.chars().take_while(char::is_ascii_digit).collect();
        let score = digits
            .parse::<u8>()
            .map_err(|e| UpstreamError::InvalidPayload(e.to_string()))?;
        Ok(Assessment {
            score: Score::new(score).map_err(|e| UpstreamError::InvalidPayload(e.to_string()))?,
            feedback: format!("scored {score}"),
            analysis: ResponseAnalysis {
                strengths: vec!["structure".into()],
                areas_for_improvement: vec!["examples".into()],
                keywords: Vec::new(),
            },
        })
    }
}

/// Scores every answer 50, but only after `release` fires. `entered` fires
/// once scoring has started.
#[derive(Default)]
pub struct HeldScoring {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl ScoringClient for HeldScoring {
    async fn evaluate(
        &self,
        _question: &Question,
        _answer: &str,
        _language: Language,
    ) -> Result<Assessment, UpstreamError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Assessment {
            score: Score::new(50).map_err(|e| UpstreamError::InvalidPayload(e.to_string()))?,
            feedback: "held".into(),
            analysis: ResponseAnalysis::default(),
        })
    }
}

pub struct CannedGenerator(pub Vec<GeneratedQuestion>);

#[async_trait]
impl QuestionGenerator for CannedGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<Vec<GeneratedQuestion>, UpstreamError> {
        Ok(self.0.clone())
    }
}

/// Settles every charge at the intent's price unless told to decline.
#[derive(Default)]
pub struct RecordingPayments {
    pub decline: bool,
    pub charges: Mutex<Vec<PaymentIntent>>,
}

#[async_trait]
impl PaymentGateway for RecordingPayments {
    async fn charge(
        &self,
        intent: &PaymentIntent,
        authorization: &PaymentAuthorization,
    ) -> Result<PaymentReceipt, UpstreamError> {
        if self.decline {
            return Err(UpstreamError::Declined("failed".into()));
        }
        self.charges.lock().unwrap().push(*intent);
        Ok(PaymentReceipt {
            transaction_id: format!("SALE-{}", authorization.payment_id),
            payment_id: Some(authorization.payment_id.clone()),
            amount: intent.amount(),
            currency: intent.currency().to_string(),
        })
    }
}

pub struct Harness {
    pub storage: Storage,
    pub payments: Arc<RecordingPayments>,
    pub generated: Vec<GeneratedQuestion>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_payments(RecordingPayments::default())
    }

    pub fn with_payments(payments: RecordingPayments) -> Self {
        Self {
            storage: Storage::in_memory(),
            payments: Arc::new(payments),
            generated: Vec::new(),
        }
    }

    /// Services whose clock sits `days` after the fixed test instant.
    pub fn services_at(&self, days: i64) -> AppServices {
        let clock = Clock::fixed(fixed_now()).shifted(Duration::days(days));
        let collaborators = fakes(Arc::clone(&self.payments), self.generated.clone());
        AppServices::new(&self.storage, clock, collaborators)
    }

    pub fn services(&self) -> AppServices {
        self.services_at(0)
    }

    pub fn services_with_scoring(&self, scoring: Arc<dyn ScoringClient>) -> AppServices {
        let mut collaborators = fakes(Arc::clone(&self.payments), self.generated.clone());
        collaborators.scoring = scoring;
        AppServices::new(&self.storage, Clock::fixed(fixed_now()), collaborators)
    }
}

pub fn fakes(payments: Arc<RecordingPayments>, generated: Vec<GeneratedQuestion>) -> Collaborators {
    Collaborators {
        scoring: Arc::new(LeadingNumberScoring),
        generator: Arc::new(CannedGenerator(generated)),
        payments,
    }
}

pub async fn register(services: &AppServices, email: &str) -> User {
    let (user, _) = services
        .accounts()
        .register(UserDraft {
            email: email.into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            ..UserDraft::default()
        })
        .await
        .expect("register");
    user
}

pub fn draft(title: &str) -> InterviewDraft {
    InterviewDraft {
        title: title.into(),
        profession: "Backend Engineer".into(),
        ..InterviewDraft::default()
    }
}

pub fn questions(n: usize) -> Vec<QuestionDraft> {
    (1..=n)
        .map(|i| QuestionDraft {
            text: format!("Question {i}"),
            ..QuestionDraft::default()
        })
        .collect()
}

pub fn approved() -> PaymentAuthorization {
    PaymentAuthorization {
        payment_id: "PAY-1".into(),
        payer_id: "PAYER-1".into(),
    }
}
