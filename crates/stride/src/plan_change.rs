//! Plan-change flow for existing subscribers.
//!
//! Reuses the wizard with two steps, tier then billing period. The state is
//! seeded with the current plan, so the tier step is valid on mount and the
//! billing step only refuses an unchanged selection.

use crate::onboarding::sections::{PlanTier, SelectedPlan};
use crate::onboarding::ChoiceStep;
use crate::wizard::Wizard;
use stride_core::{OnboardingState, SectionKey, Step, StepName, Submitter, WizardError};

/// Valid when a billing period is chosen and the plan differs from `current`.
#[derive(Debug)]
pub struct PlanChangeStep {
    current: SelectedPlan,
}

impl PlanChangeStep {
    pub fn new(current: SelectedPlan) -> Self {
        Self { current }
    }
}

impl Step for PlanChangeStep {
    fn name(&self) -> StepName {
        StepName::new("BillingPeriod")
    }

    fn validate(&self, data: &OnboardingState) -> bool {
        let selected = SelectedPlan {
            tier: data.field_as(SectionKey::PLAN, "tier"),
            billing: data.field_as(SectionKey::PLAN, "billing"),
        };
        selected.tier.is_some() && selected.billing.is_some() && selected != self.current
    }

    fn invalid_message(&self) -> String {
        "Choose a plan different from your current one".to_string()
    }
}

/// Assembles the plan-change wizard around the subscriber's current plan.
pub fn plan_change_wizard<S>(current: SelectedPlan, submitter: S) -> Result<Wizard, WizardError>
where
    S: Submitter + 'static,
{
    let mut state = OnboardingState::new();
    state.insert(SectionKey::PLAN, &current)?;

    Wizard::builder()
        .add_step(ChoiceStep::<PlanTier>::new("PlanTier", SectionKey::PLAN, "tier"))
        .add_step(PlanChangeStep::new(current))
        .initial_state(state)
        .submitter(submitter)
        .submit_failure_message("We could not update your plan, please try again")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::sections::BillingPeriod;
    use async_trait::async_trait;
    use serde_json::json;

    #[derive(Debug)]
    struct NoopSubmitter;

    #[async_trait]
    impl Submitter for NoopSubmitter {
        async fn submit(&self, _snapshot: OnboardingState) -> Result<(), WizardError> {
            Ok(())
        }
    }

    fn current() -> SelectedPlan {
        SelectedPlan {
            tier: Some(PlanTier::Basic),
            billing: Some(BillingPeriod::Monthly),
        }
    }

    #[test]
    fn test_seeded_tier_is_valid_on_mount() {
        let wizard = plan_change_wizard(current(), NoopSubmitter).expect("valid wizard");
        assert!(wizard.is_valid());
    }

    #[test]
    fn test_unchanged_plan_is_refused() {
        let mut wizard = plan_change_wizard(current(), NoopSubmitter).expect("valid wizard");
        assert!(wizard.attempt_next().is_moved());
        assert!(!wizard.is_valid());

        wizard
            .update_data("plan", json!({ "billing": "yearly" }))
            .expect("object patch");
        assert!(wizard.is_valid());
        assert!(wizard.attempt_next().is_moved());
        assert!(wizard.is_submit_ready());
    }
}
