use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::account_service::AccountService;
use crate::ai::{LlmClient, QuestionGenerator, ScoringClient};
use crate::entitlement_service::EntitlementService;
use crate::error::AppServicesError;
use crate::evaluation_service::EvaluationService;
use crate::interview_service::InterviewService;
use crate::payment::{PayPalGateway, PaymentGateway};
use crate::response_service::ResponseService;
use crate::stats_service::StatsService;
use crate::subscription_service::SubscriptionService;

/// Outbound collaborators injected into the services.
#[derive(Clone)]
pub struct Collaborators {
    pub scoring: Arc<dyn ScoringClient>,
    pub generator: Arc<dyn QuestionGenerator>,
    pub payments: Arc<dyn PaymentGateway>,
}

impl Collaborators {
    /// HTTP-backed collaborators configured from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let llm = Arc::new(LlmClient::from_env());
        Self {
            scoring: Arc::clone(&llm) as Arc<dyn ScoringClient>,
            generator: llm,
            payments: Arc::new(PayPalGateway::from_env()),
        }
    }
}

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    accounts: Arc<AccountService>,
    entitlements: Arc<EntitlementService>,
    interviews: Arc<InterviewService>,
    responses: Arc<ResponseService>,
    stats: Arc<StatsService>,
    subscriptions: Arc<SubscriptionService>,
    evaluations: Arc<EvaluationService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: &Storage, clock: Clock, collaborators: Collaborators) -> Self {
        let entitlements = Arc::new(EntitlementService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.subscriptions),
        ));
        let accounts = Arc::new(AccountService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.subscriptions),
            Arc::clone(&entitlements),
        ));
        let interviews = Arc::new(InterviewService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.interviews),
            Arc::clone(&storage.responses),
            collaborators.generator,
            Arc::clone(&entitlements),
        ));
        let responses = Arc::new(ResponseService::new(
            clock,
            Arc::clone(&storage.interviews),
            Arc::clone(&storage.responses),
            collaborators.scoring,
            Arc::clone(&entitlements),
        ));
        let stats = Arc::new(StatsService::new(
            Arc::clone(&storage.interviews),
            Arc::clone(&storage.responses),
            Arc::clone(&entitlements),
        ));
        let subscriptions = Arc::new(SubscriptionService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.subscriptions),
            Arc::clone(&collaborators.payments),
            Arc::clone(&entitlements),
        ));
        let evaluations = Arc::new(EvaluationService::new(
            clock,
            Arc::clone(&storage.interviews),
            Arc::clone(&storage.responses),
            Arc::clone(&storage.evaluations),
            collaborators.payments,
            Arc::clone(&entitlements),
        ));

        Self {
            accounts,
            entitlements,
            interviews,
            responses,
            stats,
            subscriptions,
            evaluations,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        collaborators: Collaborators,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock, collaborators))
    }

    #[must_use]
    pub fn accounts(&self) -> Arc<AccountService> {
        Arc::clone(&self.accounts)
    }

    #[must_use]
    pub fn entitlements(&self) -> Arc<EntitlementService> {
        Arc::clone(&self.entitlements)
    }

    #[must_use]
    pub fn interviews(&self) -> Arc<InterviewService> {
        Arc::clone(&self.interviews)
    }

    #[must_use]
    pub fn responses(&self) -> Arc<ResponseService> {
        Arc::clone(&self.responses)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn subscriptions(&self) -> Arc<SubscriptionService> {
        Arc::clone(&self.subscriptions)
    }

    #[must_use]
    pub fn evaluations(&self) -> Arc<EvaluationService> {
        Arc::clone(&self.evaluations)
    }
}
