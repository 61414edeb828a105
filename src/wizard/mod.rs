//! Onboarding wizard: a three-step flow whose steps 2 and 3 render and
//! validate whatever the step configuration assigns to them.

pub mod bootstrap;
pub mod machine;
pub mod resume;
pub mod state;
pub mod validation;

pub use bootstrap::{ResolvedSession, SessionBootstrap};
pub use machine::{Wizard, WizardDeps, WizardSession};
pub use resume::{FileResumeMarker, MemoryResumeMarker, ResumeMarker};
pub use state::WizardStep;
