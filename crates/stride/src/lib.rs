//! Step-gated onboarding wizards.
//!
//! A [`Wizard`] walks a fixed list of steps. Each step judges its own slice
//! of the [`OnboardingState`]; the wizard only moves forward on a valid
//! judgment, always allows going back, and freezes both directions while a
//! step is busy with an asynchronous precondition.
//!
//! # Example
//!
//! ```rust
//! use stride::prelude::*;
//! use async_trait::async_trait;
//! use serde_json::json;
//!
//! #[derive(Debug)]
//! struct ObjectiveStep;
//!
//! impl Step for ObjectiveStep {
//!     fn validate(&self, data: &OnboardingState) -> bool {
//!         data.field("goals", "objective").is_some()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct Discard;
//!
//! #[async_trait]
//! impl Submitter for Discard {
//!     async fn submit(&self, _snapshot: OnboardingState) -> Result<(), WizardError> {
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), WizardError> {
//! let mut wizard = Wizard::builder()
//!     .add_step(ObjectiveStep)
//!     .submitter(Discard)
//!     .build()?;
//!
//! assert_eq!(wizard.attempt_next().rejection(), Some(Rejection::Invalid));
//!
//! wizard.update_data("goals", json!({ "objective": "lose_weight" }))?;
//! assert!(wizard.attempt_next().is_moved());
//!
//! wizard.submit().await?;
//! assert!(wizard.is_completed());
//! # Ok(())
//! # }
//! ```

pub mod checkout;
pub mod onboarding;
pub mod plan_change;
mod wizard;

// Re-export core types
pub use stride_core::*;

pub use wizard::{Wizard, WizardBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Feedback, OnboardingState, Phase, Rejection, RetryPolicy, SectionKey, Step, StepConfig,
        StepContext, StepName, StepValidityStore, Submitter, Transition, Wizard, WizardBuilder,
        WizardError,
    };
}
