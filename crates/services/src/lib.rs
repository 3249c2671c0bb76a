#![forbid(unsafe_code)]

pub mod account_service;
pub mod ai;
pub mod app_services;
pub mod entitlement_service;
pub mod error;
pub mod evaluation_service;
pub mod interview_service;
pub mod payment;
pub mod response_service;
pub mod stats_service;
pub mod subscription_service;

pub use interview_core::Clock;

pub use account_service::AccountService;
pub use app_services::{AppServices, Collaborators};
pub use entitlement_service::{EntitlementService, ResolvedAccess};
pub use error::{AppServicesError, ErrorKind, ServiceError, UpstreamError};
pub use evaluation_service::{EvaluationService, EvaluationView};
pub use interview_service::{InterviewDetail, InterviewService};
pub use response_service::ResponseService;
pub use stats_service::{InterviewBreakdown, InterviewReport, StatsService};
pub use subscription_service::{PremiumAccess, SubscriptionService};
