//! Personalized plan generation.

use super::sections::{ActivityLevel, Experience, Gender, GeneratedPlan, Objective};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use stride_core::{
    OnboardingState, SectionKey, Step, StepConfig, StepContext, StepName, WizardError,
};
use tracing::debug;

/// Lowest daily intake a generated plan will recommend.
const MIN_DAILY_CALORIES: f64 = 1200.0;

/// Everything plan generation needs, pulled out of the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub gender: Gender,
    pub age: u8,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub objective: Objective,
    pub activity_level: ActivityLevel,
    pub experience: Experience,
}

impl Profile {
    /// Reads the profile, naming the first missing field on failure.
    pub fn from_state(state: &OnboardingState) -> Result<Self, WizardError> {
        use SectionKey as K;

        Ok(Self {
            gender: required(state, K::PERSONAL, "gender")?,
            age: required(state, K::PERSONAL, "age")?,
            height_cm: required(state, K::MEASUREMENTS, "height_cm")?,
            weight_kg: required(state, K::MEASUREMENTS, "weight_kg")?,
            objective: required(state, K::GOALS, "objective")?,
            activity_level: required(state, K::PREFERENCES, "activity_level")?,
            experience: required(state, K::PREFERENCES, "experience")?,
        })
    }

    /// Basal metabolic rate (Mifflin-St Jeor), kcal/day.
    pub fn basal_metabolic_rate(&self) -> f64 {
        let base = 10.0 * self.weight_kg + 6.25 * self.height_cm - 5.0 * f64::from(self.age);
        match self.gender {
            Gender::Male => base + 5.0,
            Gender::Female => base - 161.0,
        }
    }
}

fn required<T: DeserializeOwned>(
    state: &OnboardingState,
    section: &str,
    field: &str,
) -> Result<T, WizardError> {
    state
        .field_as(section, field)
        .ok_or_else(|| WizardError::IncompleteState(format!("{}.{}", section, field)))
}

/// `true` when the stored plan was computed from the current answers.
fn plan_is_current(data: &OnboardingState) -> bool {
    match (
        Profile::from_state(data),
        data.get::<Profile>(SectionKey::PLAN_INPUTS),
    ) {
        (Ok(current), Some(used)) => current == used,
        _ => false,
    }
}

impl GeneratedPlan {
    /// Derives daily targets from a profile.
    pub fn calculate(profile: &Profile) -> Self {
        let maintenance = profile.basal_metabolic_rate() * profile.activity_level.factor();
        let calories = match profile.objective {
            Objective::LoseWeight => (maintenance - 500.0).max(MIN_DAILY_CALORIES),
            Objective::Maintain => maintenance,
            Objective::GainMuscle => maintenance + 300.0,
        }
        .round();

        let protein_per_kg = match profile.objective {
            Objective::LoseWeight => 1.8,
            Objective::Maintain => 1.6,
            Objective::GainMuscle => 2.0,
        };
        let protein_g = (profile.weight_kg * protein_per_kg).round();
        let fat_g = (calories * 0.25 / 9.0).round();
        let carbs_g = ((calories - protein_g * 4.0 - fat_g * 9.0) / 4.0).max(0.0).round();

        let workouts_per_week = match profile.experience {
            Experience::Beginner => 3,
            Experience::Intermediate => 4,
            Experience::Advanced => 5,
        };

        Self {
            daily_calories: calories as u32,
            protein_g: protein_g as u32,
            carbs_g: carbs_g as u32,
            fat_g: fat_g as u32,
            workouts_per_week,
        }
    }
}

/// Produces a personalized plan; may be remote and slow.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate(&self, profile: &Profile) -> Result<GeneratedPlan, WizardError>;
}

/// Computes the plan locally after a placeholder delay.
#[derive(Debug, Clone)]
pub struct SimulatedPlanGenerator {
    delay: Duration,
}

impl SimulatedPlanGenerator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedPlanGenerator {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

#[async_trait]
impl PlanGenerator for SimulatedPlanGenerator {
    async fn generate(&self, profile: &Profile) -> Result<GeneratedPlan, WizardError> {
        tokio::time::sleep(self.delay).await;
        Ok(GeneratedPlan::calculate(profile))
    }
}

/// Generates the plan before the user may continue.
///
/// Busy while the generator runs; valid once a plan computed from the
/// current answers is stored. A plan left over from answers the user has
/// since changed is dropped on entry.
pub struct PlanGenerationStep<G> {
    generator: G,
    config: StepConfig,
}

impl<G> std::fmt::Debug for PlanGenerationStep<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanGenerationStep")
            .field("config", &self.config)
            .finish()
    }
}

impl<G: PlanGenerator> PlanGenerationStep<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            config: StepConfig::default(),
        }
    }

    pub fn with_config(mut self, config: StepConfig) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl<G: PlanGenerator> Step for PlanGenerationStep<G> {
    fn name(&self) -> StepName {
        StepName::new("PlanGeneration")
    }

    fn validate(&self, data: &OnboardingState) -> bool {
        data.get::<GeneratedPlan>(SectionKey::GENERATED_PLAN).is_some() && plan_is_current(data)
    }

    fn on_enter(&self, ctx: &mut StepContext<'_>) {
        if ctx.data().contains_key(SectionKey::GENERATED_PLAN) && !plan_is_current(ctx.data()) {
            debug!("Discarding plan generated from outdated answers");
            ctx.remove_section(SectionKey::GENERATED_PLAN);
            ctx.remove_section(SectionKey::PLAN_INPUTS);
        }
        ctx.revalidate();
    }

    fn invalid_message(&self) -> String {
        "Your plan is still being prepared".to_string()
    }

    fn failure_message(&self) -> String {
        "We could not generate your plan, please try again".to_string()
    }

    fn has_preparation(&self) -> bool {
        true
    }

    async fn prepare(&self, data: &mut OnboardingState) -> Result<(), WizardError> {
        let profile = Profile::from_state(data)?;
        let plan = self.generator.generate(&profile).await?;
        debug!(
            "Generated plan: {} kcal, {} workouts/week",
            plan.daily_calories, plan.workouts_per_week
        );
        data.insert(SectionKey::PLAN_INPUTS, &profile)?;
        data.insert(SectionKey::GENERATED_PLAN, &plan)
    }

    fn config(&self) -> StepConfig {
        self.config.clone()
    }
}
