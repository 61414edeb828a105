//! Step completeness checks.
//!
//! Step 1 is checked against fixed credential rules. Steps 2 and 3 are
//! checked against whatever the step configuration assigns to them: every
//! field component that maps to a profile attribute needs a non-blank value.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::WizardError;
use crate::fields::{self, ProfileAttribute, Requirement};
use crate::layout::StepConfiguration;
use crate::profile::{ProfileFields, UserRecord};

use super::state::WizardStep;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"));

pub fn email_valid(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn password_valid(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Step-1 check with the specific message to show. Email is checked first.
pub fn check_credentials(email: &str, password: &str) -> Result<(), WizardError> {
    if !email_valid(email) {
        return Err(WizardError::InvalidEmail);
    }
    if !password_valid(password) {
        return Err(WizardError::PasswordTooShort);
    }
    Ok(())
}

/// Attributes required by `step`'s bucket that are still blank.
///
/// Step 1 and missing buckets require nothing.
pub fn missing_attributes(
    step: WizardStep,
    layout: &StepConfiguration,
    profile: &ProfileFields,
) -> Vec<ProfileAttribute> {
    let Some(bucket) = step.bucket() else {
        return Vec::new();
    };
    layout
        .bucket(bucket)
        .iter()
        .filter_map(|field| match fields::requirement_of(field) {
            Requirement::Attribute(attr) if !profile.is_filled(attr) => Some(attr),
            _ => None,
        })
        .collect()
}

/// Whether `step` is complete for `record` under `layout`.
pub fn step_complete(step: WizardStep, layout: &StepConfiguration, record: &UserRecord) -> bool {
    match step {
        WizardStep::Step1 => check_credentials(record.email(), record.password()).is_ok(),
        WizardStep::Step2 | WizardStep::Step3 => {
            missing_attributes(step, layout, &record.profile).is_empty()
        }
    }
}

/// Like [`step_complete`] but returns the user-facing error on failure.
pub fn check_step(
    step: WizardStep,
    layout: &StepConfiguration,
    record: &UserRecord,
) -> Result<(), WizardError> {
    match step {
        WizardStep::Step1 => check_credentials(record.email(), record.password()),
        WizardStep::Step2 | WizardStep::Step3 => {
            let missing = missing_attributes(step, layout, &record.profile);
            if missing.is_empty() {
                Ok(())
            } else {
                Err(WizardError::IncompleteStep {
                    missing: missing.iter().map(|a| a.key().to_string()).collect(),
                })
            }
        }
    }
}
