//! Wizard: drives a session through the three steps, validating against the
//! step configuration and persisting on every forward edge.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::WizardError;
use crate::fields::{self, FieldSpec, ProfileAttribute};
use crate::layout::{self, ConfigStore, StepConfiguration};
use crate::profile::{Credentials, ProfileUpdate, UserRecord};
use crate::services::{AuthService, ProfileService};

use super::bootstrap::SessionBootstrap;
use super::resume::ResumeMarker;
use super::state::WizardStep;
use super::validation;

/// Collaborators the wizard needs.
#[derive(Clone)]
pub struct WizardDeps {
    pub layout_store: Arc<dyn ConfigStore>,
    pub auth: Arc<dyn AuthService>,
    pub profiles: Arc<dyn ProfileService>,
    pub resume: Arc<dyn ResumeMarker>,
}

/// Client-held state of one onboarding attempt.
#[derive(Debug)]
pub struct WizardSession {
    pub id: Uuid,
    pub step: WizardStep,
    pub record: UserRecord,
    /// Result of the last validation of the current step.
    pub step_valid: bool,
    /// Last user-facing error, cleared by the next successful transition.
    pub error: Option<WizardError>,
    /// Set once step 1 resolved through login or registration.
    pub authenticated: bool,
}

impl WizardSession {
    fn fresh() -> Self {
        Self {
            id: Uuid::new_v4(),
            step: WizardStep::Step1,
            record: UserRecord::default(),
            step_valid: false,
            error: None,
            authenticated: false,
        }
    }
}

/// The onboarding state machine.
///
/// Methods take `&mut self`, so a session never runs two transitions at once.
pub struct Wizard {
    layout: StepConfiguration,
    bootstrap: SessionBootstrap,
    profiles: Arc<dyn ProfileService>,
    resume: Arc<dyn ResumeMarker>,
    session: WizardSession,
}

impl Wizard {
    /// Fetch the step configuration and open a session, resuming at the
    /// persisted step when a resume marker is present.
    pub async fn load(deps: WizardDeps) -> Self {
        let layout = layout::load_or_empty(deps.layout_store.as_ref()).await;
        let mut wizard = Self::with_layout(layout, deps);
        wizard.restore().await;
        wizard
    }

    /// Build a wizard over an already-loaded layout, starting at step 1.
    pub fn with_layout(layout: StepConfiguration, deps: WizardDeps) -> Self {
        let mut wizard = Self {
            layout,
            bootstrap: SessionBootstrap::new(deps.auth),
            profiles: deps.profiles,
            resume: deps.resume,
            session: WizardSession::fresh(),
        };
        wizard.refresh_validation();
        wizard
    }

    pub fn step(&self) -> WizardStep {
        self.session.step
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn layout(&self) -> &StepConfiguration {
        &self.layout
    }

    pub fn error(&self) -> Option<&WizardError> {
        self.session.error.as_ref()
    }

    pub fn is_step_valid(&self) -> bool {
        self.session.step_valid
    }

    /// Registry entries for the components the current step renders, in
    /// layout order. Unknown ids render nothing and are skipped.
    pub fn step_fields(&self) -> Vec<&'static FieldSpec> {
        let Some(bucket) = self.session.step.bucket() else {
            return Vec::new();
        };
        self.layout
            .bucket(bucket)
            .iter()
            .filter_map(fields::lookup)
            .collect()
    }

    // ── Data entry ──────────────────────────────────────────────────

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.session.record.credentials.email = email.into();
        self.refresh_validation();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        let email = std::mem::take(&mut self.session.record.credentials.email);
        self.session.record.credentials = Credentials::new(email, password);
        self.refresh_validation();
    }

    pub fn set_attribute(&mut self, attr: ProfileAttribute, value: impl Into<String>) {
        self.session.record.profile.set(attr, value);
        self.refresh_validation();
    }

    fn refresh_validation(&mut self) {
        self.session.step_valid =
            validation::step_complete(self.session.step, &self.layout, &self.session.record);
    }

    // ── Transitions ─────────────────────────────────────────────────

    /// Advance from step 1 or step 2.
    ///
    /// On failure the step is unchanged, entered data is kept, and the error
    /// is recorded on the session as well as returned.
    pub async fn next(&mut self) -> Result<WizardStep, WizardError> {
        let result = match self.session.step {
            WizardStep::Step1 => self.advance_from_credentials().await,
            WizardStep::Step2 => self.advance_from_profile().await,
            WizardStep::Step3 => Err(WizardError::InvalidTransition {
                action: "advance",
                step: WizardStep::Step3.to_string(),
            }),
        };
        self.settle(result)
    }

    /// Submit step 3. On success the resume marker is cleared and the session
    /// starts over at step 1.
    pub async fn submit(&mut self) -> Result<(), WizardError> {
        let step = self.session.step;
        if !step.is_final() {
            let err = WizardError::InvalidTransition {
                action: "submit",
                step: step.to_string(),
            };
            return self.settle(Err(err));
        }

        let result = match validation::check_step(step, &self.layout, &self.session.record) {
            Ok(()) => self.persist(step).await,
            Err(e) => Err(e),
        };
        self.settle(result.map(|()| step))?;

        info!(
            session = %self.session.id,
            email = %self.session.record.email(),
            "Onboarding submitted"
        );
        self.resume.clear().await;
        self.session = WizardSession::fresh();
        self.refresh_validation();
        Ok(())
    }

    /// Go back one step. No validation and no persistence.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        let current = self.session.step;
        let result = match current.previous() {
            Some(previous) if current.can_transition_to(previous) => {
                debug!(session = %self.session.id, from = %current, to = %previous, "Wizard back");
                self.session.step = previous;
                self.refresh_validation();
                Ok(previous)
            }
            _ => Err(WizardError::InvalidTransition {
                action: "go back",
                step: current.to_string(),
            }),
        };
        self.settle(result)
    }

    /// Drop the session and forget the resume marker.
    pub async fn sign_out(&mut self) {
        info!(session = %self.session.id, "Signing out of onboarding session");
        self.resume.clear().await;
        self.session = WizardSession::fresh();
        self.refresh_validation();
    }

    async fn advance_from_credentials(&mut self) -> Result<WizardStep, WizardError> {
        let record = &self.session.record;
        validation::check_credentials(record.email(), record.password())?;

        let resolved = self.bootstrap.resolve(&record.credentials).await?;
        self.session.record.profile = resolved.profile;
        self.session.authenticated = true;
        self.resume.set(self.session.record.email()).await;
        self.enter(resolved.step)
    }

    async fn advance_from_profile(&mut self) -> Result<WizardStep, WizardError> {
        let step = self.session.step;
        validation::check_step(step, &self.layout, &self.session.record)?;

        let target = step.next().unwrap_or(step);
        self.persist(target).await?;
        self.enter(target)
    }

    /// Save the in-progress record, to resume at `resume_step`.
    async fn persist(&self, resume_step: WizardStep) -> Result<(), WizardError> {
        let update = ProfileUpdate {
            email: self.session.record.email().to_string(),
            current_step: resume_step.number(),
            profile: self.session.record.profile.clone(),
        };
        self.profiles.save(&update).await.map_err(|e| {
            warn!(session = %self.session.id, error = %e, "Failed to save profile");
            WizardError::PersistenceFailure {
                reason: e.to_string(),
            }
        })
    }

    fn enter(&mut self, step: WizardStep) -> Result<WizardStep, WizardError> {
        let current = self.session.step;
        if !current.can_transition_to(step) {
            return Err(WizardError::InvalidTransition {
                action: "advance",
                step: current.to_string(),
            });
        }
        info!(session = %self.session.id, from = %current, to = %step, "Wizard advanced");
        self.session.step = step;
        self.refresh_validation();
        Ok(step)
    }

    fn settle<T>(&mut self, result: Result<T, WizardError>) -> Result<T, WizardError> {
        match &result {
            Ok(_) => self.session.error = None,
            Err(e) => {
                debug!(
                    session = %self.session.id,
                    step = %self.session.step,
                    error = %e,
                    "Wizard transition blocked"
                );
                self.session.error = Some(e.clone());
            }
        }
        result
    }

    /// Enter at the persisted step when a resume marker exists.
    async fn restore(&mut self) {
        let Some(email) = self.resume.get().await else {
            return;
        };
        match self.profiles.progress(&email).await {
            Ok(Some(progress)) => {
                let step = WizardStep::resume_at(progress.current_step);
                info!(session = %self.session.id, %email, %step, "Resuming onboarding session");
                self.session.record.credentials.email = email;
                self.session.record.profile = progress.profile;
                self.session.step = step;
                self.refresh_validation();
            }
            Ok(None) => {
                warn!(%email, "Resume marker names an unknown user, discarding it");
                self.resume.clear().await;
            }
            Err(e) => {
                warn!(%email, error = %e, "Could not fetch saved progress, starting at step 1");
            }
        }
    }
}
