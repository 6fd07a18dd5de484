//! Core traits and types for the stride onboarding wizard.
//!
//! This crate provides the contracts without runtime dependencies. Flows
//! and custom steps depend on it; the controller lives in `stride`.
//!
//! # Core Types
//!
//! - [`Step`] - One screen of the wizard with its own validity rule
//! - [`StepContext`] - What the active step may read and write
//! - [`OnboardingState`] - The aggregate, partitioned into sections
//! - [`StepValidityStore`] - The current step's validity flag
//! - [`Transition`], [`Rejection`], [`Feedback`] - Navigation outcomes
//! - [`Submitter`] - The terminal handoff
//! - [`WizardError`] - Collaborator and configuration failures

mod context;
mod error;
mod navigation;
mod state;
mod step;
mod traits;
mod validity;

pub use context::{Session, StepContext};
pub use error::WizardError;
pub use navigation::{Feedback, Phase, Rejection, Transition};
pub use state::{OnboardingState, SectionKey};
pub use step::{RetryPolicy, Step, StepConfig, StepName};
pub use traits::Submitter;
pub use validity::StepValidityStore;
