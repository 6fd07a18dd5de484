//! The main onboarding flow.
//!
//! Twelve steps, one question each, ending with plan generation. The
//! submit phase that follows hands the aggregate to checkout.

mod plan;
pub mod sections;
mod steps;

pub use plan::{PlanGenerationStep, PlanGenerator, Profile, SimulatedPlanGenerator};
pub use steps::{ChoiceStep, PlanSelectionStep, RangeStep, TargetWeightStep};

use crate::wizard::Wizard;
use sections::{ActivityLevel, DietStyle, Experience, Gender, Objective, TrainingLocation};
use stride_core::{SectionKey, Submitter, WizardError};

/// Number of steps in [`onboarding_wizard`].
pub const ONBOARDING_STEPS: usize = 12;

/// Index of the objective selection step.
pub const OBJECTIVE_STEP: usize = 1;

/// Index of the plan generation step, the last one.
pub const PLAN_GENERATION_STEP: usize = ONBOARDING_STEPS - 1;

/// Assembles the onboarding wizard.
pub fn onboarding_wizard<G, S>(generator: G, submitter: S) -> Result<Wizard, WizardError>
where
    G: PlanGenerator + 'static,
    S: Submitter + 'static,
{
    Wizard::builder()
        .add_step(ChoiceStep::<Gender>::new(
            "Gender",
            SectionKey::PERSONAL,
            "gender",
        ))
        .add_step(ChoiceStep::<Objective>::new(
            "Objective",
            SectionKey::GOALS,
            "objective",
        ))
        .add_step(
            RangeStep::new("Age", SectionKey::PERSONAL, "age", 16.0..=99.0).whole_numbers(),
        )
        .add_step(RangeStep::new(
            "Height",
            SectionKey::MEASUREMENTS,
            "height_cm",
            120.0..=230.0,
        ))
        .add_step(RangeStep::new(
            "Weight",
            SectionKey::MEASUREMENTS,
            "weight_kg",
            35.0..=300.0,
        ))
        .add_step(TargetWeightStep::default())
        .add_step(ChoiceStep::<ActivityLevel>::new(
            "ActivityLevel",
            SectionKey::PREFERENCES,
            "activity_level",
        ))
        .add_step(ChoiceStep::<Experience>::new(
            "Experience",
            SectionKey::PREFERENCES,
            "experience",
        ))
        .add_step(ChoiceStep::<TrainingLocation>::new(
            "TrainingLocation",
            SectionKey::PREFERENCES,
            "training_location",
        ))
        .add_step(ChoiceStep::<DietStyle>::new(
            "Diet",
            SectionKey::PREFERENCES,
            "diet",
        ))
        .add_step(PlanSelectionStep)
        .add_step(PlanGenerationStep::new(generator))
        .submitter(submitter)
        .submit_failure_message("We could not reach checkout, please try again")
        .build()
}
