//! Checkout handoff: turns a finished aggregate into a payment request.

use crate::onboarding::sections::{BillingPeriod, GeneratedPlan, PlanTier};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stride_core::{OnboardingState, SectionKey, Submitter, WizardError};
use tracing::info;

impl PlanTier {
    /// List price for one month, in cents.
    pub fn monthly_price_cents(self) -> u64 {
        match self {
            PlanTier::Basic => 1999,
            PlanTier::Premium => 2999,
            PlanTier::Elite => 4999,
        }
    }
}

impl BillingPeriod {
    /// Number of months charged up front.
    pub fn months(self) -> u64 {
        match self {
            BillingPeriod::Monthly => 1,
            BillingPeriod::Quarterly => 3,
            BillingPeriod::Yearly => 12,
        }
    }

    /// Discount applied to the list price, in percent.
    pub fn discount_percent(self) -> u64 {
        match self {
            BillingPeriod::Monthly => 0,
            BillingPeriod::Quarterly => 10,
            BillingPeriod::Yearly => 25,
        }
    }
}

/// Amount charged for `tier` billed every `billing` period, in cents.
pub fn price_cents(tier: PlanTier, billing: BillingPeriod) -> u64 {
    let list = tier.monthly_price_cents() * billing.months();
    list * (100 - billing.discount_percent()) / 100
}

/// What the payment provider needs to open a checkout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub email: String,
    pub tier: PlanTier,
    pub billing: BillingPeriod,
    pub amount_cents: u64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_calories: Option<u32>,
}

impl CheckoutRequest {
    /// Builds the request from a snapshot of the aggregate.
    pub fn from_state(state: &OnboardingState) -> Result<Self, WizardError> {
        let tier = state
            .field_as::<PlanTier>(SectionKey::PLAN, "tier")
            .ok_or_else(|| WizardError::IncompleteState("plan.tier".to_string()))?;
        let billing = state
            .field_as::<BillingPeriod>(SectionKey::PLAN, "billing")
            .ok_or_else(|| WizardError::IncompleteState("plan.billing".to_string()))?;
        let email = state
            .field_as::<String>(SectionKey::PERSONAL, "email")
            .map(|e| e.trim().to_string())
            .ok_or_else(|| WizardError::IncompleteState("personal.email".to_string()))?;

        Ok(Self {
            email,
            tier,
            billing,
            amount_cents: price_cents(tier, billing),
            currency: "EUR".to_string(),
            daily_calories: state
                .get::<GeneratedPlan>(SectionKey::GENERATED_PLAN)
                .map(|p| p.daily_calories),
        })
    }
}

/// Identifier of a checkout session opened by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
}

/// The payment provider, as seen from the wizard.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn open_session(&self, request: CheckoutRequest) -> Result<CheckoutSession, WizardError>;
}

/// Submits a finished onboarding to a [`CheckoutGateway`].
#[derive(Debug, Clone)]
pub struct CheckoutSubmitter<G> {
    gateway: G,
}

impl<G: CheckoutGateway> CheckoutSubmitter<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Returns the wrapped gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

#[async_trait]
impl<G: CheckoutGateway> Submitter for CheckoutSubmitter<G> {
    async fn submit(&self, snapshot: OnboardingState) -> Result<(), WizardError> {
        let request = CheckoutRequest::from_state(&snapshot)?;
        info!(
            "Opening checkout: {:?}/{:?} for {} cents",
            request.tier, request.billing, request.amount_cents
        );
        let session = self.gateway.open_session(request).await?;
        info!("Checkout session '{}' opened", session.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn finished_state() -> OnboardingState {
        let mut state = OnboardingState::new();
        state
            .merge("plan", json!({ "tier": "premium", "billing": "quarterly" }))
            .expect("object patch");
        state
            .merge("personal", json!({ "email": " ana@example.com " }))
            .expect("object patch");
        state
    }

    #[test]
    fn test_price_applies_discount() {
        assert_eq!(price_cents(PlanTier::Basic, BillingPeriod::Monthly), 1999);
        // 2999 * 3 * 0.9
        assert_eq!(price_cents(PlanTier::Premium, BillingPeriod::Quarterly), 8097);
        // 4999 * 12 * 0.75
        assert_eq!(price_cents(PlanTier::Elite, BillingPeriod::Yearly), 44991);
    }

    #[test]
    fn test_request_from_state() {
        let request = CheckoutRequest::from_state(&finished_state()).expect("complete state");

        assert_eq!(request.email, "ana@example.com");
        assert_eq!(request.tier, PlanTier::Premium);
        assert_eq!(request.billing, BillingPeriod::Quarterly);
        assert_eq!(request.amount_cents, 8097);
        assert_eq!(request.daily_calories, None);
    }

    #[test]
    fn test_request_keeps_email_beside_malformed_fields() {
        let mut state = finished_state();
        state
            .merge("personal", json!({ "age": 30.5 }))
            .expect("object patch");

        let request = CheckoutRequest::from_state(&state).expect("complete state");
        assert_eq!(request.email, "ana@example.com");
    }

    #[test]
    fn test_request_requires_plan() {
        let mut state = finished_state();
        state.remove("plan");

        match CheckoutRequest::from_state(&state) {
            Err(WizardError::IncompleteState(field)) => assert_eq!(field, "plan.tier"),
            other => panic!("Unexpected result: {:?}", other),
        }
    }
}
