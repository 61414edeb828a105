//! Collaborator contracts for authentication and profile persistence.
//!
//! Outcomes are tagged variants rather than errors so that callers branch
//! exhaustively on what the backend said instead of classifying transport
//! failures.

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::profile::{Credentials, Progress, ProfileUpdate, UserSummary};

/// Result of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Credentials matched a stored user.
    Authenticated(Progress),
    /// No user with that email.
    NotRegistered,
    /// The user exists but the password didn't match.
    WrongCredential,
    /// Anything else (transport failure, server error).
    Failed(String),
}

/// Result of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Created,
    Failed(String),
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> LoginOutcome;

    async fn register(&self, credentials: &Credentials) -> RegisterOutcome;
}

#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Persist the email-scoped record and the step to resume at.
    async fn save(&self, update: &ProfileUpdate) -> Result<(), ServiceError>;

    /// Fetch a user's persisted step and profile. `None` if the user is unknown.
    async fn progress(&self, email: &str) -> Result<Option<Progress>, ServiceError>;

    /// Every onboarded user, for the read-only listing.
    async fn list(&self) -> Result<Vec<UserSummary>, ServiceError>;
}
