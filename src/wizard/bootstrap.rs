//! Session bootstrap: login-or-register for the email typed on step 1.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::WizardError;
use crate::profile::{Credentials, ProfileFields};
use crate::services::{AuthService, LoginOutcome, RegisterOutcome};

use super::state::WizardStep;

/// A session that resolved on step 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSession {
    /// Step to continue at.
    pub step: WizardStep,
    /// Profile restored from the backend (empty for a new registration).
    pub profile: ProfileFields,
    /// Whether this call created the account.
    pub registered: bool,
}

/// Resolves whether an email belongs to a new or returning user.
pub struct SessionBootstrap {
    auth: Arc<dyn AuthService>,
}

impl SessionBootstrap {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        Self { auth }
    }

    /// Log in, or register when the email is unknown.
    ///
    /// Every branch is terminal: the session either resolves or an error is
    /// returned. Nothing is retried.
    pub async fn resolve(&self, credentials: &Credentials) -> Result<ResolvedSession, WizardError> {
        match self.auth.login(credentials).await {
            LoginOutcome::Authenticated(progress) => {
                let step = WizardStep::resume_at(progress.current_step);
                info!(email = %credentials.email, %step, "Returning user logged in");
                Ok(ResolvedSession {
                    step,
                    profile: progress.profile,
                    registered: false,
                })
            }
            LoginOutcome::NotRegistered => match self.auth.register(credentials).await {
                RegisterOutcome::Created => {
                    info!(email = %credentials.email, "New user registered");
                    Ok(ResolvedSession {
                        step: WizardStep::Step2,
                        profile: ProfileFields::default(),
                        registered: true,
                    })
                }
                RegisterOutcome::Failed(reason) => {
                    warn!(email = %credentials.email, %reason, "Registration failed");
                    Err(WizardError::RegistrationFailed { reason })
                }
            },
            LoginOutcome::WrongCredential => {
                info!(email = %credentials.email, "Login rejected: wrong password");
                Err(WizardError::AuthUnauthorized)
            }
            LoginOutcome::Failed(reason) => {
                warn!(email = %credentials.email, %reason, "Login failed");
                Err(WizardError::AuthFailed { reason })
            }
        }
    }
}
