//! Per-step view of a wizard session.

use crate::error::WizardError;
use crate::state::{OnboardingState, SectionKey};
use crate::step::{Step, StepName};
use crate::validity::StepValidityStore;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Mutable state of one wizard session.
///
/// Owned by the controller. Only the active step reaches it, through a
/// [`StepContext`].
#[derive(Debug, Default)]
pub struct Session {
    state: OnboardingState,
    validity: StepValidityStore,
    busy: bool,
    requested_jump: Option<usize>,
}

impl Session {
    /// Creates a session around an initial state.
    pub fn new(state: OnboardingState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// Returns the aggregate.
    pub fn state(&self) -> &OnboardingState {
        &self.state
    }

    /// Returns the aggregate mutably.
    pub fn state_mut(&mut self) -> &mut OnboardingState {
        &mut self.state
    }

    /// Returns the validity store.
    pub fn validity(&self) -> &StepValidityStore {
        &self.validity
    }

    /// Returns the validity store mutably.
    pub fn validity_mut(&mut self) -> &mut StepValidityStore {
        &mut self.validity
    }

    /// Returns `true` while an asynchronous precondition is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Sets or clears the busy flag.
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Takes the jump target requested by the active step, if any.
    pub fn take_requested_jump(&mut self) -> Option<usize> {
        self.requested_jump.take()
    }

    /// Consumes the session and returns the aggregate.
    pub fn into_state(self) -> OnboardingState {
        self.state
    }
}

/// The contract handed to the active step.
///
/// Every data update re-runs the step's [`Step::validate`] before
/// returning, so validity never lags behind the data it judges.
pub struct StepContext<'a> {
    step: &'a dyn Step,
    session: &'a mut Session,
}

impl fmt::Debug for StepContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepContext")
            .field("step", &self.step.name())
            .field("session", &self.session)
            .finish()
    }
}

impl<'a> StepContext<'a> {
    /// Binds the active step to the session.
    pub fn new(step: &'a dyn Step, session: &'a mut Session) -> Self {
        Self { step, session }
    }

    /// Returns the active step's name.
    pub fn step_name(&self) -> StepName {
        self.step.name()
    }

    /// Read-only view of the aggregate so far.
    pub fn data(&self) -> &OnboardingState {
        &self.session.state
    }

    /// Merges `partial` into `section`, then re-validates.
    ///
    /// A rejected patch leaves both data and validity untouched.
    pub fn update_data(
        &mut self,
        section: impl Into<SectionKey>,
        partial: Value,
    ) -> Result<(), WizardError> {
        self.session.state.merge(section, partial)?;
        self.revalidate();
        Ok(())
    }

    /// Serializes `partial`, merges it into `section`, then re-validates.
    pub fn update_typed<T: Serialize>(
        &mut self,
        section: impl Into<SectionKey>,
        partial: &T,
    ) -> Result<(), WizardError> {
        self.session.state.merge_typed(section, partial)?;
        self.revalidate();
        Ok(())
    }

    /// Drops a whole section, then re-validates.
    ///
    /// Returns `true` if the section existed.
    pub fn remove_section(&mut self, section: &str) -> bool {
        let removed = self.session.state.remove(section).is_some();
        self.revalidate();
        removed
    }

    /// Overwrites the validity flag with an externally computed judgment.
    pub fn report_validity(&mut self, is_valid: bool) {
        self.session.validity.set_valid(is_valid);
    }

    /// Re-runs the step's own judgment against the current data.
    pub fn revalidate(&mut self) -> bool {
        let is_valid = self.step.validate(&self.session.state);
        self.session.validity.set_valid(is_valid);
        is_valid
    }

    /// Sets or clears the busy flag.
    pub fn report_busy(&mut self, busy: bool) {
        self.session.busy = busy;
    }

    /// Requests a jump to `index`; applied by the controller afterwards.
    pub fn navigate_to(&mut self, index: usize) {
        self.session.requested_jump = Some(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct HeightStep;

    impl Step for HeightStep {
        fn validate(&self, data: &OnboardingState) -> bool {
            data.field("measurements", "height_cm")
                .and_then(Value::as_f64)
                .is_some_and(|h| (100.0..=250.0).contains(&h))
        }
    }

    #[test]
    fn test_update_data_revalidates() {
        let mut session = Session::default();
        let mut ctx = StepContext::new(&HeightStep, &mut session);

        ctx.update_data("measurements", json!({ "height_cm": 50 }))
            .expect("object patch");
        assert!(!ctx.session.validity.is_valid());

        ctx.update_data("measurements", json!({ "height_cm": 180 }))
            .expect("object patch");
        assert!(session.validity().is_valid());
    }

    #[test]
    fn test_rejected_patch_keeps_validity() {
        let mut session = Session::default();
        let mut ctx = StepContext::new(&HeightStep, &mut session);
        ctx.report_validity(true);

        assert!(ctx.update_data("measurements", json!("tall")).is_err());
        assert!(session.validity().is_valid());
        assert!(session.state().is_empty());
    }

    #[test]
    fn test_remove_section_revalidates() {
        let mut session = Session::default();
        let mut ctx = StepContext::new(&HeightStep, &mut session);
        ctx.update_data("measurements", json!({ "height_cm": 180 }))
            .expect("object patch");

        assert!(ctx.remove_section("measurements"));
        assert!(!ctx.remove_section("measurements"));
        assert!(!session.validity().is_valid());
        assert!(session.state().is_empty());
    }

    #[test]
    fn test_default_on_enter_reports_once() {
        let mut session = Session::default();
        assert!(!session.validity().is_judged());

        let mut ctx = StepContext::new(&HeightStep, &mut session);
        HeightStep.on_enter(&mut ctx);

        assert!(session.validity().is_judged());
        assert!(!session.validity().is_valid());
    }

    #[test]
    fn test_navigate_to_is_deferred() {
        let mut session = Session::default();
        let mut ctx = StepContext::new(&HeightStep, &mut session);
        ctx.navigate_to(4);
        ctx.report_busy(true);

        assert!(session.is_busy());
        assert_eq!(session.take_requested_jump(), Some(4));
        assert_eq!(session.take_requested_jump(), None);
    }
}
