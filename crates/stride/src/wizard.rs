//! Wizard controller: sequences steps and gates forward progress.

use std::fmt;
use std::time::Duration;
use stride_core::{
    Feedback, OnboardingState, Phase, Rejection, RetryPolicy, SectionKey, Session, Step,
    StepConfig, StepContext, StepName, Submitter, Transition, WizardError,
};
use tokio::time::timeout;
use tracing::{debug, info, warn};

const DEFAULT_SUBMIT_FAILURE: &str = "We could not complete your signup, please try again";

/// A linear, step-gated wizard.
///
/// Forward moves require the active step to have reported valid data;
/// backward moves never do. While the active step is busy neither
/// direction moves. Index `N` (one past the last step) is the submit
/// phase, from which [`submit`](Self::submit) hands the aggregate to the
/// configured [`Submitter`].
pub struct Wizard {
    steps: Vec<StepEntry>,
    session: Session,
    phase: Phase,
    feedback: Option<Feedback>,
    submitter: Box<dyn Submitter>,
    submit_failure_message: String,
}

struct StepEntry {
    step: Box<dyn Step>,
    timeout: Option<Duration>,
    retry_policy: RetryPolicy,
}

impl fmt::Debug for Wizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wizard")
            .field(
                "steps",
                &self.steps.iter().map(|e| e.step.name()).collect::<Vec<_>>(),
            )
            .field("phase", &self.phase)
            .field("busy", &self.session.is_busy())
            .field("valid", &self.session.validity().is_valid())
            .finish()
    }
}

impl Wizard {
    /// Creates a new wizard builder.
    pub fn builder() -> WizardBuilder {
        WizardBuilder::new()
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the current index; the submit and completed phases map to `N`.
    pub fn current_index(&self) -> usize {
        match self.phase {
            Phase::Step(index) => index,
            Phase::Submit | Phase::Completed => self.steps.len(),
        }
    }

    /// Returns the number of steps.
    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` on the first step.
    pub fn is_first_step(&self) -> bool {
        self.phase == Phase::Step(0)
    }

    /// Returns `true` on the last step.
    pub fn is_last_step(&self) -> bool {
        self.phase == Phase::Step(self.steps.len() - 1)
    }

    /// Returns `true` once every step has passed and submission is pending.
    pub fn is_submit_ready(&self) -> bool {
        self.phase == Phase::Submit
    }

    /// Returns `true` after a successful submission.
    pub fn is_completed(&self) -> bool {
        self.phase == Phase::Completed
    }

    /// Returns `true` while the active step waits on a precondition.
    pub fn is_busy(&self) -> bool {
        self.session.is_busy()
    }

    /// Returns the active step's latest validity judgment.
    pub fn is_valid(&self) -> bool {
        self.session.validity().is_valid()
    }

    /// Returns the message the host should display, if any.
    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Returns `current_index / total_steps`, for display only.
    pub fn progress(&self) -> f64 {
        self.current_index() as f64 / self.steps.len() as f64
    }

    /// Returns the name of the active step.
    pub fn current_step_name(&self) -> Option<StepName> {
        self.active_index().map(|index| self.steps[index].step.name())
    }

    /// Returns `true` if the active step has a preparation to run.
    pub fn needs_preparation(&self) -> bool {
        self.active_index()
            .is_some_and(|index| self.steps[index].step.has_preparation())
    }

    /// Read-only view of the aggregate.
    pub fn data(&self) -> &OnboardingState {
        self.session.state()
    }

    /// Consumes the wizard and returns the aggregate.
    pub fn into_state(self) -> OnboardingState {
        self.session.into_state()
    }

    /// Runs `f` against the active step's context.
    ///
    /// Returns `None` outside the step phases. A jump requested through
    /// [`StepContext::navigate_to`] is applied once `f` returns.
    pub fn with_step<R>(&mut self, f: impl FnOnce(&mut StepContext<'_>) -> R) -> Option<R> {
        let index = self.active_index()?;
        let step = self.steps[index].step.as_ref();
        let mut ctx = StepContext::new(step, &mut self.session);
        let output = f(&mut ctx);
        self.settle();
        Some(output)
    }

    /// Merges `partial` into `section` on behalf of the active step.
    pub fn update_data(
        &mut self,
        section: impl Into<SectionKey>,
        partial: serde_json::Value,
    ) -> Result<(), WizardError> {
        let section = section.into();
        let phase = self.phase;
        self.with_step(|ctx| ctx.update_data(section, partial))
            .unwrap_or_else(|| {
                Err(WizardError::InvalidPhase {
                    operation: "update_data",
                    phase: phase.to_string(),
                })
            })
    }

    /// Overwrites the active step's validity flag.
    pub fn report_validity(&mut self, is_valid: bool) {
        self.with_step(|ctx| ctx.report_validity(is_valid));
    }

    /// Sets or clears the active step's busy flag.
    pub fn report_busy(&mut self, busy: bool) {
        self.with_step(|ctx| ctx.report_busy(busy));
    }

    /// Moves forward if the active step is valid and not busy.
    pub fn attempt_next(&mut self) -> Transition {
        let from = self.phase;
        let index = match from {
            Phase::Completed => return self.reject(Rejection::Completed),
            _ if self.session.is_busy() => return self.reject(Rejection::Busy),
            Phase::Submit => return self.reject(Rejection::AwaitingSubmit),
            Phase::Step(index) => index,
        };

        if !self.session.validity().is_valid() {
            let step = &self.steps[index].step;
            self.feedback = Some(Feedback::Invalid {
                step_name: step.name(),
                message: step.invalid_message(),
            });
            return self.reject(Rejection::Invalid);
        }

        let to = if index + 1 < self.steps.len() {
            Phase::Step(index + 1)
        } else {
            Phase::Submit
        };
        self.enter(to);
        info!("Wizard advanced from {} to {}", from, self.phase);
        Transition::Moved {
            from,
            to: self.phase,
        }
    }

    /// Moves back one step unless busy or already first.
    pub fn attempt_prev(&mut self) -> Transition {
        let from = self.phase;
        let to = match from {
            Phase::Completed => return self.reject(Rejection::Completed),
            _ if self.session.is_busy() => return self.reject(Rejection::Busy),
            Phase::Step(0) => return self.reject(Rejection::AtStart),
            Phase::Step(index) => Phase::Step(index - 1),
            Phase::Submit => Phase::Step(self.steps.len() - 1),
        };
        self.enter(to);
        info!("Wizard went back from {} to {}", from, self.phase);
        Transition::Moved {
            from,
            to: self.phase,
        }
    }

    /// Jumps to `index` without consulting validity, for skippable steps.
    pub fn navigate_to(&mut self, index: usize) -> Transition {
        let from = self.phase;
        if from == Phase::Completed {
            return self.reject(Rejection::Completed);
        }
        if self.session.is_busy() {
            return self.reject(Rejection::Busy);
        }
        if index >= self.steps.len() {
            return self.reject(Rejection::OutOfRange {
                requested: index,
                total: self.steps.len(),
            });
        }
        self.enter(Phase::Step(index));
        info!("Wizard jumped from {} to {}", from, self.phase);
        Transition::Moved {
            from,
            to: self.phase,
        }
    }

    /// Runs the active step's preparation while holding the wizard busy.
    ///
    /// The busy flag is cleared whatever the outcome. On failure the step's
    /// failure message becomes [`Feedback::ActionFailed`] and the error is
    /// returned, leaving the wizard navigable.
    pub async fn run_preparation(&mut self) -> Result<(), WizardError> {
        let index = match self.phase {
            Phase::Step(index) if !self.session.is_busy() => index,
            phase => {
                let phase = if self.session.is_busy() {
                    "busy".to_string()
                } else {
                    phase.to_string()
                };
                return Err(WizardError::InvalidPhase {
                    operation: "run_preparation",
                    phase,
                });
            }
        };

        let entry = &self.steps[index];
        if !entry.step.has_preparation() {
            return Ok(());
        }

        self.feedback = None;
        self.session.set_busy(true);
        self.session.validity_mut().set_valid(false);
        info!("Step '{}' preparing", entry.step.name());

        let result = prepare_with_retry(entry, self.session.state_mut()).await;

        self.session.set_busy(false);
        let step = entry.step.as_ref();
        StepContext::new(step, &mut self.session).revalidate();

        match result {
            Ok(()) => {
                info!("Step '{}' prepared", step.name());
                Ok(())
            }
            Err(e) => {
                warn!("Step '{}' preparation failed: {}", step.name(), e);
                self.feedback = Some(Feedback::ActionFailed {
                    step_name: step.name(),
                    message: step.failure_message(),
                });
                Err(e)
            }
        }
    }

    /// Hands a snapshot of the aggregate to the submitter.
    ///
    /// Only allowed in the submit phase. On failure the wizard returns to
    /// its last step, not busy, so the user can retry.
    pub async fn submit(&mut self) -> Result<(), WizardError> {
        if self.phase != Phase::Submit || self.session.is_busy() {
            return Err(WizardError::InvalidPhase {
                operation: "submit",
                phase: self.phase.to_string(),
            });
        }

        self.session.set_busy(true);
        info!("Submitting onboarding state");
        let result = self.submitter.submit(self.session.state().snapshot()).await;
        self.session.set_busy(false);

        match result {
            Ok(()) => {
                self.phase = Phase::Completed;
                info!(
                    "Wizard completed in {:?}",
                    self.session.state().elapsed()
                );
                Ok(())
            }
            Err(e) => {
                let last = self.steps.len() - 1;
                warn!("Submission failed: {}", e);
                self.enter(Phase::Step(last));
                self.feedback = Some(Feedback::ActionFailed {
                    step_name: self.steps[last].step.name(),
                    message: self.submit_failure_message.clone(),
                });
                Err(e)
            }
        }
    }

    fn active_index(&self) -> Option<usize> {
        match self.phase {
            Phase::Step(index) => Some(index),
            Phase::Submit | Phase::Completed => None,
        }
    }

    fn reject(&self, reason: Rejection) -> Transition {
        debug!("Wizard stayed {}: {}", self.phase, reason);
        Transition::Rejected(reason)
    }

    /// Switches phase; validity never carries over between steps.
    fn enter(&mut self, to: Phase) {
        self.phase = to;
        self.session.validity_mut().reset();
        self.feedback = None;
        if let Phase::Step(index) = to {
            let step = self.steps[index].step.as_ref();
            step.on_enter(&mut StepContext::new(step, &mut self.session));
            self.settle();
        }
    }

    /// Applies side effects a step requested through its context.
    fn settle(&mut self) {
        if self.session.validity().is_valid()
            && matches!(self.feedback, Some(Feedback::Invalid { .. }))
        {
            self.feedback = None;
        }
        if let Some(target) = self.session.take_requested_jump() {
            if self.phase == Phase::Step(target) {
                return;
            }
            if let Transition::Rejected(reason) = self.navigate_to(target) {
                warn!("Requested jump to step {} refused: {}", target, reason);
            }
        }
    }
}

async fn prepare_with_retry(
    entry: &StepEntry,
    state: &mut OnboardingState,
) -> Result<(), WizardError> {
    let max_retries = entry.retry_policy.max_retries();

    for attempt in 0..=max_retries {
        let outcome = match entry.timeout {
            Some(limit) => match timeout(limit, entry.step.prepare(&mut *state)).await {
                Ok(result) => result,
                Err(_) => Err(WizardError::Timeout {
                    step_name: entry.step.name(),
                }),
            },
            None => entry.step.prepare(&mut *state).await,
        };

        match outcome {
            Ok(()) => return Ok(()),
            Err(e) if attempt < max_retries => {
                info!(
                    "Step '{}' failed: {}, retrying ({}/{})",
                    entry.step.name(),
                    e,
                    attempt + 1,
                    max_retries
                );
                if let Some(delay) = entry.retry_policy.delay() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(WizardError::step(
        entry.step.name(),
        "preparation did not run",
    ))
}

/// Builder for constructing [`Wizard`] instances.
pub struct WizardBuilder {
    steps: Vec<StepEntry>,
    submitter: Option<Box<dyn Submitter>>,
    initial_state: OnboardingState,
    submit_failure_message: String,
}

impl Default for WizardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardBuilder {
    /// Creates a new empty wizard builder.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            submitter: None,
            initial_state: OnboardingState::new(),
            submit_failure_message: DEFAULT_SUBMIT_FAILURE.to_string(),
        }
    }

    /// Appends a step, using the step's own configuration.
    pub fn add_step<S: Step + 'static>(self, step: S) -> Self {
        let config = step.config();
        self.add_configured(step, config)
    }

    /// Appends a step with a configuration overriding its own.
    pub fn add_configured<S: Step + 'static>(mut self, step: S, config: StepConfig) -> Self {
        self.steps.push(StepEntry {
            step: Box::new(step),
            timeout: config.timeout,
            retry_policy: config.retry_policy,
        });
        self
    }

    /// Appends an already boxed step.
    pub fn add_boxed(mut self, step: Box<dyn Step>) -> Self {
        let config = step.config();
        self.steps.push(StepEntry {
            step,
            timeout: config.timeout,
            retry_policy: config.retry_policy,
        });
        self
    }

    /// Seeds the aggregate, e.g. with the subscriber's current plan.
    pub fn initial_state(mut self, state: OnboardingState) -> Self {
        self.initial_state = state;
        self
    }

    /// Sets the collaborator receiving the finished aggregate.
    pub fn submitter<S: Submitter + 'static>(mut self, submitter: S) -> Self {
        self.submitter = Some(Box::new(submitter));
        self
    }

    /// Sets the message shown when submission fails.
    pub fn submit_failure_message(mut self, message: impl Into<String>) -> Self {
        self.submit_failure_message = message.into();
        self
    }

    /// Builds the wizard and mounts the first step.
    pub fn build(self) -> Result<Wizard, WizardError> {
        if self.steps.is_empty() {
            return Err(WizardError::Configuration(
                "At least one step must be added".to_string(),
            ));
        }
        let submitter = self.submitter.ok_or_else(|| {
            WizardError::Configuration("Submitter must be specified".to_string())
        })?;

        let mut wizard = Wizard {
            steps: self.steps,
            session: Session::new(self.initial_state),
            phase: Phase::Step(0),
            feedback: None,
            submitter,
            submit_failure_message: self.submit_failure_message,
        };
        wizard.enter(Phase::Step(0));
        debug!("Wizard built with {} steps", wizard.steps.len());
        Ok(wizard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct FieldStep {
        section: &'static str,
        field: &'static str,
    }

    impl Step for FieldStep {
        fn name(&self) -> StepName {
            StepName::new(self.field)
        }

        fn validate(&self, data: &OnboardingState) -> bool {
            data.field(self.section, self.field).is_some()
        }
    }

    #[derive(Debug)]
    struct SkipStep;

    impl Step for SkipStep {
        fn validate(&self, _data: &OnboardingState) -> bool {
            false
        }

        fn on_enter(&self, ctx: &mut StepContext<'_>) {
            ctx.revalidate();
            if ctx.data().field("goals", "skip_measurements").is_some() {
                ctx.navigate_to(2);
            }
        }
    }

    #[derive(Debug)]
    struct FlakyStep {
        attempts: Arc<AtomicU32>,
        fail_until: u32,
    }

    #[async_trait]
    impl Step for FlakyStep {
        fn validate(&self, data: &OnboardingState) -> bool {
            data.contains_key("generated_plan")
        }

        fn has_preparation(&self) -> bool {
            true
        }

        async fn prepare(&self, data: &mut OnboardingState) -> Result<(), WizardError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_until {
                return Err(WizardError::step(self.name(), "generator unavailable"));
            }
            data.merge("generated_plan", json!({ "daily_calories": 2100 }))
        }

        fn config(&self) -> StepConfig {
            StepConfig {
                timeout: None,
                retry_policy: RetryPolicy::fixed(2, Duration::from_millis(1)),
            }
        }
    }

    #[derive(Debug)]
    struct NoopSubmitter;

    #[async_trait]
    impl Submitter for NoopSubmitter {
        async fn submit(&self, _snapshot: OnboardingState) -> Result<(), WizardError> {
            Ok(())
        }
    }

    fn field(section: &'static str, field: &'static str) -> FieldStep {
        FieldStep { section, field }
    }

    #[test]
    fn test_builder_requires_steps() {
        let result = Wizard::builder().submitter(NoopSubmitter).build();
        assert!(matches!(result, Err(WizardError::Configuration(_))));
    }

    #[test]
    fn test_builder_requires_submitter() {
        let result = Wizard::builder()
            .add_step(field("goals", "objective"))
            .build();
        match result {
            Err(WizardError::Configuration(msg)) => {
                assert_eq!(msg, "Submitter must be specified");
            }
            other => panic!("Unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_first_step_reports_on_mount() {
        let wizard = Wizard::builder()
            .add_step(field("goals", "objective"))
            .submitter(NoopSubmitter)
            .build()
            .expect("valid wizard");

        assert!(wizard.is_first_step());
        assert!(wizard.is_last_step());
        assert!(!wizard.is_valid());
        assert_eq!(wizard.current_step_name(), Some(StepName::new("objective")));
    }

    #[test]
    fn test_update_outside_steps_is_rejected() {
        let mut wizard = Wizard::builder()
            .add_step(field("goals", "objective"))
            .submitter(NoopSubmitter)
            .build()
            .expect("valid wizard");
        wizard
            .update_data("goals", json!({ "objective": "maintain" }))
            .expect("object patch");
        assert!(wizard.attempt_next().is_moved());

        let result = wizard.update_data("goals", json!({ "objective": "lose_weight" }));
        assert!(matches!(
            result,
            Err(WizardError::InvalidPhase { operation: "update_data", .. })
        ));
    }

    #[test]
    fn test_invalid_feedback_clears_once_valid() {
        let mut wizard = Wizard::builder()
            .add_step(field("goals", "objective"))
            .submitter(NoopSubmitter)
            .build()
            .expect("valid wizard");

        assert_eq!(wizard.attempt_next().rejection(), Some(Rejection::Invalid));
        assert!(matches!(wizard.feedback(), Some(Feedback::Invalid { .. })));

        wizard
            .update_data("goals", json!({ "objective": "gain_muscle" }))
            .expect("object patch");
        assert_eq!(wizard.feedback(), None);
    }

    #[test]
    fn test_jump_requested_on_enter() {
        let mut state = OnboardingState::new();
        state
            .merge("goals", json!({ "skip_measurements": true }))
            .expect("object patch");

        let mut wizard = Wizard::builder()
            .add_step(SkipStep)
            .add_step(field("measurements", "height_cm"))
            .add_step(field("preferences", "diet"))
            .initial_state(state)
            .submitter(NoopSubmitter)
            .build()
            .expect("valid wizard");

        assert_eq!(wizard.current_index(), 2);
        assert!(!wizard.is_valid());
        assert!(wizard.attempt_prev().is_moved());
        assert_eq!(wizard.current_index(), 1);
    }

    #[test]
    fn test_navigate_to_out_of_range() {
        let mut wizard = Wizard::builder()
            .add_step(field("goals", "objective"))
            .submitter(NoopSubmitter)
            .build()
            .expect("valid wizard");

        assert_eq!(
            wizard.navigate_to(5).rejection(),
            Some(Rejection::OutOfRange {
                requested: 5,
                total: 1
            })
        );
        assert_eq!(wizard.current_index(), 0);
    }

    #[tokio::test]
    async fn test_preparation_retries_then_validates() {
        let attempts = Arc::new(AtomicU32::new(0));
        let mut wizard = Wizard::builder()
            .add_step(FlakyStep {
                attempts: attempts.clone(),
                fail_until: 2,
            })
            .submitter(NoopSubmitter)
            .build()
            .expect("valid wizard");

        assert!(wizard.needs_preparation());
        wizard.run_preparation().await.expect("prepared");

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(!wizard.is_busy());
        assert!(wizard.is_valid());
    }

    #[tokio::test]
    async fn test_preparation_exhausted_leaves_wizard_navigable() {
        let attempts = Arc::new(AtomicU32::new(0));
        let mut wizard = Wizard::builder()
            .add_step(field("goals", "objective"))
            .add_step(FlakyStep {
                attempts: attempts.clone(),
                fail_until: 10,
            })
            .submitter(NoopSubmitter)
            .build()
            .expect("valid wizard");
        wizard.navigate_to(1);

        let result = wizard.run_preparation().await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(!wizard.is_busy());
        assert!(!wizard.is_valid());
        assert!(matches!(
            wizard.feedback(),
            Some(Feedback::ActionFailed { .. })
        ));
        assert!(wizard.attempt_prev().is_moved());
    }

    #[tokio::test]
    async fn test_preparation_refused_while_busy() {
        let mut wizard = Wizard::builder()
            .add_step(field("goals", "objective"))
            .submitter(NoopSubmitter)
            .build()
            .expect("valid wizard");
        wizard.report_busy(true);

        let result = wizard.run_preparation().await;
        assert!(matches!(
            result,
            Err(WizardError::InvalidPhase { ref phase, .. }) if phase == "busy"
        ));
    }

    #[tokio::test]
    async fn test_submit_outside_submit_phase() {
        let mut wizard = Wizard::builder()
            .add_step(field("goals", "objective"))
            .submitter(NoopSubmitter)
            .build()
            .expect("valid wizard");

        let result = wizard.submit().await;
        assert!(matches!(
            result,
            Err(WizardError::InvalidPhase { operation: "submit", .. })
        ));
    }
}
