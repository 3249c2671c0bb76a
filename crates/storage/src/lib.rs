#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    EvaluationRepository, InMemoryRepository, InterviewRepository, ResponseRepository, Storage,
    StorageError, SubscriptionRepository, UserRepository,
};
