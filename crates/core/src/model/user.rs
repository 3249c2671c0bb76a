use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::entitlement::AccessTier;
use crate::model::ids::{InterviewId, SubscriptionId, UserId};
use crate::model::level::Language;
use crate::time::trial_end_from;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("email is invalid")]
    InvalidEmail,

    #[error("first name cannot be empty")]
    EmptyFirstName,

    #[error("last name cannot be empty")]
    EmptyLastName,
}

/// Registration input before validation.
#[derive(Debug, Clone, Default)]
pub struct UserDraft {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profession: Option<String>,
    pub language: Option<Language>,
}

impl UserDraft {
    /// Validate the draft and open the account with a fresh trial window.
    ///
    /// # Errors
    ///
    /// Returns `UserError` for a malformed email or blank names.
    pub fn register(self, id: UserId, now: DateTime<Utc>) -> Result<User, UserError> {
        let email = self.email.trim().to_lowercase();
        if !looks_like_email(&email) {
            return Err(UserError::InvalidEmail);
        }
        let first_name = self.first_name.trim().to_string();
        if first_name.is_empty() {
            return Err(UserError::EmptyFirstName);
        }
        let last_name = self.last_name.trim().to_string();
        if last_name.is_empty() {
            return Err(UserError::EmptyLastName);
        }

        Ok(User {
            id,
            email,
            first_name,
            last_name,
            profession: self.profession.map(|p| p.trim().to_string()).unwrap_or_default(),
            language: self.language.unwrap_or_default(),
            free_trial_end_date: trial_end_from(now),
            subscription_status: AccessTier::Free,
            subscription_id: None,
            interviews: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .rsplit_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && tld.len() >= 2)
        && !email.chars().any(char::is_whitespace)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profession: String,
    pub language: Language,
    pub free_trial_end_date: DateTime<Utc>,
    /// Cached tier; `entitlement::resolve_status` is the source of truth.
    pub subscription_status: AccessTier,
    pub subscription_id: Option<SubscriptionId>,
    pub interviews: Vec<InterviewId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn owns_interview(&self, id: InterviewId) -> bool {
        self.interviews.contains(&id)
    }

    /// Replace the cached tier. Returns `true` if it changed.
    pub fn set_cached_tier(&mut self, tier: AccessTier, now: DateTime<Utc>) -> bool {
        if self.subscription_status == tier {
            return false;
        }
        self.subscription_status = tier;
        self.updated_at = now;
        true
    }
}
