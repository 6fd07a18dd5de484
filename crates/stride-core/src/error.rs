//! Wizard error types.
//!
//! Navigation rejections are not errors; see [`Rejection`](crate::Rejection).
//! Only failures of external collaborators (plan generation, checkout) and
//! misconfiguration surface as [`WizardError`].

use crate::state::SectionKey;
use crate::step::StepName;
use thiserror::Error;

/// Errors that can occur while driving a wizard.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WizardError {
    /// A step's preparation or the terminal handoff failed.
    #[error("Step failed: {step_name}, details: {details}")]
    StepError {
        /// The name of the step that failed.
        step_name: StepName,
        /// Details about the failure.
        details: String,
    },

    /// A step opted into a timeout and exceeded it.
    #[error("Timeout occurred in step: {step_name}")]
    Timeout {
        /// The name of the step that timed out.
        step_name: StepName,
    },

    /// The wizard configuration is invalid.
    #[error("Invalid wizard configuration: {0}")]
    Configuration(String),

    /// A partial update for a section was not a JSON object.
    #[error("Invalid patch for section '{section}': {details}")]
    InvalidPatch {
        /// The section the patch targeted.
        section: SectionKey,
        /// Details about the rejected patch.
        details: String,
    },

    /// The state snapshot is missing data a collaborator requires.
    #[error("Onboarding state is incomplete: missing {0}")]
    IncompleteState(String),

    /// An operation was requested in a phase that does not allow it.
    #[error("Operation '{operation}' not allowed while {phase}")]
    InvalidPhase {
        /// The requested operation.
        operation: &'static str,
        /// The phase the wizard was in.
        phase: String,
    },
}

impl WizardError {
    /// Shorthand for a [`WizardError::StepError`].
    pub fn step(step_name: impl Into<StepName>, details: impl Into<String>) -> Self {
        Self::StepError {
            step_name: step_name.into(),
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = WizardError::step("PlanGeneration", "service unavailable");
        assert_eq!(
            error.to_string(),
            "Step failed: PlanGeneration, details: service unavailable"
        );

        let timeout = WizardError::Timeout {
            step_name: StepName::new("PlanGeneration"),
        };
        assert_eq!(
            timeout.to_string(),
            "Timeout occurred in step: PlanGeneration"
        );
    }

    #[test]
    fn test_invalid_patch_display() {
        let error = WizardError::InvalidPatch {
            section: SectionKey::new("goals"),
            details: "expected object, got number".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid patch for section 'goals': expected object, got number"
        );
    }

    #[test]
    fn test_invalid_phase_display() {
        let error = WizardError::InvalidPhase {
            operation: "submit",
            phase: "on step 2".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Operation 'submit' not allowed while on step 2"
        );
    }
}
