//! Wizard steps and the transitions allowed between them.

use serde::{Deserialize, Serialize};

use crate::layout::BucketId;

/// The three wizard steps.
///
/// Step 1 collects credentials; steps 2 and 3 render whatever the step
/// configuration assigns to them. Serializes as the step number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WizardStep {
    Step1,
    Step2,
    Step3,
}

impl WizardStep {
    pub const ALL: [WizardStep; 3] = [Self::Step1, Self::Step2, Self::Step3];

    pub fn number(&self) -> u8 {
        match self {
            Self::Step1 => 1,
            Self::Step2 => 2,
            Self::Step3 => 3,
        }
    }

    /// Map a persisted step number into a post-login step. Anything at or
    /// below 2 resumes at step 2, anything above 3 at step 3.
    pub fn resume_at(number: u8) -> Self {
        if number >= 3 { Self::Step3 } else { Self::Step2 }
    }

    /// The configuration bucket this step renders, if it is configurable.
    pub fn bucket(&self) -> Option<BucketId> {
        match self {
            Self::Step1 => None,
            Self::Step2 => Some(BucketId::Step2),
            Self::Step3 => Some(BucketId::Step3),
        }
    }

    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: WizardStep) -> bool {
        use WizardStep::*;
        matches!(
            (self, target),
            (Step1, Step2) | (Step1, Step3) | (Step2, Step3) | (Step2, Step1) | (Step3, Step2)
        )
    }

    /// Next step in the forward direction, if any.
    pub fn next(&self) -> Option<WizardStep> {
        match self {
            Self::Step1 => Some(Self::Step2),
            Self::Step2 => Some(Self::Step3),
            Self::Step3 => None,
        }
    }

    pub fn previous(&self) -> Option<WizardStep> {
        match self {
            Self::Step1 => None,
            Self::Step2 => Some(Self::Step1),
            Self::Step3 => Some(Self::Step2),
        }
    }

    /// Whether submitting (rather than advancing) ends this step.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Step3)
    }

    /// Heading shown in the progress strip.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Step1 => "Email & Password",
            Self::Step2 => "Personal Information I",
            Self::Step3 => "Personal Information II",
        }
    }

    /// Progress bar fill for this step.
    pub fn progress_percent(&self) -> u8 {
        (u16::from(self.number()) * 100 / Self::ALL.len() as u16) as u8
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::Step1
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Self::Step1),
            2 => Ok(Self::Step2),
            3 => Ok(Self::Step3),
            other => Err(format!("no wizard step {other}")),
        }
    }
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        step.number()
    }
}

impl From<BucketId> for WizardStep {
    fn from(bucket: BucketId) -> Self {
        match bucket {
            BucketId::Step2 => Self::Step2,
            BucketId::Step3 => Self::Step3,
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {}", self.number())
    }
}
