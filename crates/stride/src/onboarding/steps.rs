//! Reusable onboarding steps.

use super::sections::{BillingPeriod, Objective, PlanTier};
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::ops::RangeInclusive;
use stride_core::{OnboardingState, SectionKey, Step, StepName};

/// Tolerance for a "maintain" target weight, in kilograms.
const MAINTAIN_TOLERANCE_KG: f64 = 2.0;

/// Valid when `section.field` holds a value of type `T`.
pub struct ChoiceStep<T> {
    name: &'static str,
    section: &'static str,
    field: &'static str,
    _choice: PhantomData<fn() -> T>,
}

impl<T> ChoiceStep<T> {
    pub fn new(name: &'static str, section: &'static str, field: &'static str) -> Self {
        Self {
            name,
            section,
            field,
            _choice: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ChoiceStep<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChoiceStep")
            .field("name", &self.name)
            .field("section", &self.section)
            .field("field", &self.field)
            .finish()
    }
}

impl<T: DeserializeOwned + 'static> Step for ChoiceStep<T> {
    fn name(&self) -> StepName {
        StepName::new(self.name)
    }

    fn validate(&self, data: &OnboardingState) -> bool {
        data.field(self.section, self.field)
            .is_some_and(|value| serde_json::from_value::<T>(value.clone()).is_ok())
    }

    fn invalid_message(&self) -> String {
        "Please choose an option to continue".to_string()
    }
}

/// Valid when `section.field` is a number inside `range`.
#[derive(Debug)]
pub struct RangeStep {
    name: &'static str,
    section: &'static str,
    field: &'static str,
    range: RangeInclusive<f64>,
    whole: bool,
}

impl RangeStep {
    pub fn new(
        name: &'static str,
        section: &'static str,
        field: &'static str,
        range: RangeInclusive<f64>,
    ) -> Self {
        Self {
            name,
            section,
            field,
            range,
            whole: false,
        }
    }

    /// Only accepts non-negative integers, for fields stored as integers.
    pub fn whole_numbers(mut self) -> Self {
        self.whole = true;
        self
    }
}

impl Step for RangeStep {
    fn name(&self) -> StepName {
        StepName::new(self.name)
    }

    fn validate(&self, data: &OnboardingState) -> bool {
        data.field(self.section, self.field)
            .and_then(|value| {
                if self.whole {
                    value.as_u64().map(|n| n as f64)
                } else {
                    value.as_f64()
                }
            })
            .is_some_and(|n| self.range.contains(&n))
    }

    fn invalid_message(&self) -> String {
        let kind = if self.whole { "a whole number" } else { "a value" };
        format!(
            "Enter {} between {} and {}",
            kind,
            self.range.start(),
            self.range.end()
        )
    }
}

/// Valid when the target weight is plausible and agrees with the objective.
#[derive(Debug)]
pub struct TargetWeightStep {
    range: RangeInclusive<f64>,
}

impl Default for TargetWeightStep {
    fn default() -> Self {
        Self {
            range: 30.0..=300.0,
        }
    }
}

impl Step for TargetWeightStep {
    fn name(&self) -> StepName {
        StepName::new("TargetWeight")
    }

    fn validate(&self, data: &OnboardingState) -> bool {
        let objective = data.field_as::<Objective>(SectionKey::GOALS, "objective");
        let target = data.field_as::<f64>(SectionKey::GOALS, "target_weight_kg");
        let current = data.field_as::<f64>(SectionKey::MEASUREMENTS, "weight_kg");

        let (Some(objective), Some(target), Some(current)) = (objective, target, current) else {
            return false;
        };
        if !self.range.contains(&target) {
            return false;
        }
        match objective {
            Objective::LoseWeight => target < current,
            Objective::GainMuscle => target >= current,
            Objective::Maintain => (target - current).abs() <= MAINTAIN_TOLERANCE_KG,
        }
    }

    fn invalid_message(&self) -> String {
        "Enter a target weight that matches your objective".to_string()
    }
}

/// Valid when a tier, a billing period and a contact email are present.
#[derive(Debug, Default)]
pub struct PlanSelectionStep;

impl Step for PlanSelectionStep {
    fn name(&self) -> StepName {
        StepName::new("PlanSelection")
    }

    fn validate(&self, data: &OnboardingState) -> bool {
        let tier = data.field_as::<PlanTier>(SectionKey::PLAN, "tier");
        let billing = data.field_as::<BillingPeriod>(SectionKey::PLAN, "billing");
        let email = data.field_as::<String>(SectionKey::PERSONAL, "email");

        tier.is_some() && billing.is_some() && email.is_some_and(|e| is_email(&e))
    }

    fn invalid_message(&self) -> String {
        "Pick a plan and enter a valid email".to_string()
    }
}

/// Loose shape check: one `@`, non-empty local part, dotted domain.
pub(crate) fn is_email(candidate: &str) -> bool {
    let candidate = candidate.trim();
    match candidate.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && tld.len() >= 2)
                && !candidate.contains(char::is_whitespace)
        }
        None => false,
    }
}
