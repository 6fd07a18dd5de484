//! Step trait and related types.

use crate::context::StepContext;
use crate::error::WizardError;
use crate::state::OnboardingState;
use async_trait::async_trait;
use std::fmt::{self, Debug};
use std::time::Duration;

/// Type-safe step name wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepName(String);

impl StepName {
    /// Creates a new StepName.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a StepName from a type's name, without path or generics.
    pub fn from_type_name<T: ?Sized>() -> Self {
        let path = std::any::type_name::<T>();
        let path = path.split_once('<').map_or(path, |(head, _)| head);
        Self::new(path.rsplit("::").next().unwrap_or(path))
    }

    /// Returns the step name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StepName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StepName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for StepName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for StepName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for StepName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for StepName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A step of the wizard.
///
/// A step owns one slice of the [`OnboardingState`] and judges whether that
/// slice is complete. The controller calls [`validate`](Self::validate) on
/// mount and after every data update, so implementations only describe the
/// rule, never when to apply it.
///
/// # Examples
///
/// ```
/// use stride_core::{OnboardingState, Step, StepName};
///
/// #[derive(Debug)]
/// struct ObjectiveStep;
///
/// impl Step for ObjectiveStep {
///     fn name(&self) -> StepName {
///         StepName::new("Objective")
///     }
///
///     fn validate(&self, data: &OnboardingState) -> bool {
///         data.field("goals", "objective").is_some()
///     }
/// }
///
/// let mut state = OnboardingState::new();
/// assert!(!ObjectiveStep.validate(&state));
///
/// state.merge("goals", serde_json::json!({ "objective": "lose_weight" }))?;
/// assert!(ObjectiveStep.validate(&state));
/// # Ok::<(), stride_core::WizardError>(())
/// ```
#[async_trait]
pub trait Step: Send + Sync + Debug {
    /// Returns the step name.
    ///
    /// By default, uses the type name.
    fn name(&self) -> StepName {
        StepName::from_type_name::<Self>()
    }

    /// Judges the step's slice of the aggregate.
    fn validate(&self, data: &OnboardingState) -> bool;

    /// Message shown when the user tries to advance past an invalid step.
    fn invalid_message(&self) -> String {
        "Please complete the required fields".to_string()
    }

    /// Message shown when [`prepare`](Self::prepare) fails.
    fn failure_message(&self) -> String {
        "Something went wrong, please try again".to_string()
    }

    /// Called when the step becomes active.
    ///
    /// The default reports the step's validity once, which every step must
    /// do on mount. Overrides should keep doing so.
    fn on_enter(&self, ctx: &mut StepContext<'_>) {
        ctx.revalidate();
    }

    /// Returns `true` if the step runs [`prepare`](Self::prepare) before it
    /// can become valid.
    fn has_preparation(&self) -> bool {
        false
    }

    /// Long-running precondition, such as generating a plan.
    ///
    /// The controller holds the wizard busy while this runs.
    async fn prepare(&self, _data: &mut OnboardingState) -> Result<(), WizardError> {
        Ok(())
    }

    /// Returns the configuration applied to [`prepare`](Self::prepare).
    fn config(&self) -> StepConfig {
        StepConfig::default()
    }
}

/// How often a failed preparation is attempted again.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Fail on the first error.
    #[default]
    None,
    /// Retry up to `max_retries` times, waiting `delay` before each.
    Fixed { max_retries: u32, delay: Duration },
}

impl RetryPolicy {
    /// Creates a fixed retry policy.
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        RetryPolicy::Fixed { max_retries, delay }
    }

    /// Returns the maximum number of retries.
    pub fn max_retries(&self) -> u32 {
        match self {
            RetryPolicy::None => 0,
            RetryPolicy::Fixed { max_retries, .. } => *max_retries,
        }
    }

    /// Returns the wait before a retry, if any.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            RetryPolicy::None => None,
            RetryPolicy::Fixed { delay, .. } => Some(*delay),
        }
    }
}

/// Configuration for a step's preparation.
///
/// The wizard enforces no timeout unless a step opts in.
#[derive(Debug, Clone, Default)]
pub struct StepConfig {
    /// Maximum time allowed for preparation. `None` means no timeout.
    pub timeout: Option<Duration>,
    /// Retry policy when preparation fails. Default: no retry.
    pub retry_policy: RetryPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct AlwaysValid;

    impl Step for AlwaysValid {
        fn validate(&self, _data: &OnboardingState) -> bool {
            true
        }
    }

    #[test]
    fn test_default_step_name() {
        assert_eq!(AlwaysValid.name(), StepName::new("AlwaysValid"));
    }

    #[test]
    fn test_type_name_strips_generics() {
        #[allow(dead_code)]
        struct Wrapper<T>(T);
        assert_eq!(StepName::from_type_name::<Wrapper<u8>>().as_str(), "Wrapper");
    }

    #[test]
    fn test_default_config() {
        let config = AlwaysValid.config();
        assert_eq!(config.timeout, None);
        assert_eq!(config.retry_policy, RetryPolicy::None);
        assert!(!AlwaysValid.has_preparation());
    }

    #[tokio::test]
    async fn test_default_prepare_is_noop() {
        let mut state = OnboardingState::new();
        assert!(AlwaysValid.prepare(&mut state).await.is_ok());
        assert!(state.is_empty());
    }

    #[test]
    fn test_retry_policy_fixed() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(1));
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.delay(), Some(Duration::from_secs(1)));
        assert_eq!(RetryPolicy::None.max_retries(), 0);
        assert_eq!(RetryPolicy::None.delay(), None);
    }
}
