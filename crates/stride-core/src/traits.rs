//! Collaborator traits.

use crate::error::WizardError;
use crate::state::OnboardingState;
use async_trait::async_trait;

/// Receives the finished aggregate once every step has passed.
///
/// This is the wizard's only outward handoff. Implementations talk to the
/// checkout or profile API; the wizard's responsibility ends when
/// [`submit`](Self::submit) returns.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use stride_core::{OnboardingState, Submitter, WizardError};
///
/// #[derive(Debug)]
/// struct Discard;
///
/// #[async_trait]
/// impl Submitter for Discard {
///     async fn submit(&self, _snapshot: OnboardingState) -> Result<(), WizardError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Hands the snapshot to the external collaborator.
    ///
    /// An `Err` is treated as recoverable: the wizard returns to its last
    /// step so the user can retry.
    async fn submit(&self, snapshot: OnboardingState) -> Result<(), WizardError>;
}

#[async_trait]
impl<S: Submitter + ?Sized> Submitter for std::sync::Arc<S> {
    async fn submit(&self, snapshot: OnboardingState) -> Result<(), WizardError> {
        (**self).submit(snapshot).await
    }
}
