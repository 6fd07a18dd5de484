//! Navigation outcomes.
//!
//! A refused move is an expected result, returned as data for the host to
//! render. Nothing here is an error.

use crate::step::StepName;
use std::fmt;

/// Where the wizard stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Showing the step at this index.
    Step(usize),
    /// Every step passed; waiting for the terminal handoff.
    Submit,
    /// The handoff succeeded.
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Step(index) => write!(f, "on step {}", index),
            Phase::Submit => write!(f, "awaiting submission"),
            Phase::Completed => write!(f, "completed"),
        }
    }
}

/// Why a navigation request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The active step has not reported valid data.
    Invalid,
    /// The active step is waiting on an asynchronous precondition.
    Busy,
    /// Already on the first step.
    AtStart,
    /// All steps passed; only submission moves forward from here.
    AwaitingSubmit,
    /// The wizard already completed.
    Completed,
    /// A jump targeted an index outside the step list.
    OutOfRange {
        /// The requested index.
        requested: usize,
        /// Number of steps.
        total: usize,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Invalid => write!(f, "required fields missing"),
            Rejection::Busy => write!(f, "step is busy"),
            Rejection::AtStart => write!(f, "already on the first step"),
            Rejection::AwaitingSubmit => write!(f, "awaiting submission"),
            Rejection::Completed => write!(f, "wizard already completed"),
            Rejection::OutOfRange { requested, total } => {
                write!(f, "step {} out of range (total {})", requested, total)
            }
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The wizard moved.
    Moved {
        /// Phase before the move.
        from: Phase,
        /// Phase after the move.
        to: Phase,
    },
    /// The wizard stayed put.
    Rejected(Rejection),
}

impl Transition {
    /// Returns `true` if the wizard moved.
    pub fn is_moved(&self) -> bool {
        matches!(self, Transition::Moved { .. })
    }

    /// Returns the rejection reason, if the wizard stayed put.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Transition::Rejected(reason) => Some(*reason),
            Transition::Moved { .. } => None,
        }
    }
}

/// A user-visible message about the active step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// The user tried to advance past an invalid step.
    Invalid {
        /// The step that refused.
        step_name: StepName,
        /// Message to display.
        message: String,
    },
    /// A preparation or the terminal handoff failed; the user may retry.
    ActionFailed {
        /// The step whose action failed.
        step_name: StepName,
        /// Message to display.
        message: String,
    },
}

impl Feedback {
    /// Returns the message to display.
    pub fn message(&self) -> &str {
        match self {
            Feedback::Invalid { message, .. } | Feedback::ActionFailed { message, .. } => message,
        }
    }

    /// Returns the step the feedback concerns.
    pub fn step_name(&self) -> &StepName {
        match self {
            Feedback::Invalid { step_name, .. } | Feedback::ActionFailed { step_name, .. } => {
                step_name
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_helpers() {
        let moved = Transition::Moved {
            from: Phase::Step(0),
            to: Phase::Step(1),
        };
        assert!(moved.is_moved());
        assert_eq!(moved.rejection(), None);

        let rejected = Transition::Rejected(Rejection::Busy);
        assert!(!rejected.is_moved());
        assert_eq!(rejected.rejection(), Some(Rejection::Busy));
    }

    #[test]
    fn test_rejection_display() {
        assert_eq!(Rejection::Invalid.to_string(), "required fields missing");
        assert_eq!(
            Rejection::OutOfRange {
                requested: 14,
                total: 12
            }
            .to_string(),
            "step 14 out of range (total 12)"
        );
    }

    #[test]
    fn test_feedback_accessors() {
        let feedback = Feedback::ActionFailed {
            step_name: StepName::new("PlanGeneration"),
            message: "could not generate your plan, try again".to_string(),
        };
        assert_eq!(feedback.step_name(), "PlanGeneration");
        assert_eq!(
            feedback.message(),
            "could not generate your plan, try again"
        );
    }
}
