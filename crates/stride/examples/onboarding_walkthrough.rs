//! Walks the onboarding wizard from the first question to checkout.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use stride::checkout::{CheckoutGateway, CheckoutRequest, CheckoutSession, CheckoutSubmitter};
use stride::onboarding::{onboarding_wizard, SimulatedPlanGenerator};
use stride::prelude::*;

#[derive(Debug)]
struct PrintingGateway;

#[async_trait]
impl CheckoutGateway for PrintingGateway {
    async fn open_session(&self, request: CheckoutRequest) -> Result<CheckoutSession, WizardError> {
        println!(
            "Checkout for {}: {:.2} {}",
            request.email,
            request.amount_cents as f64 / 100.0,
            request.currency
        );
        Ok(CheckoutSession {
            id: "cs_demo".to_string(),
        })
    }
}

fn print_position(wizard: &Wizard) {
    println!(
        "[{:>3.0}%] {}",
        wizard.progress() * 100.0,
        wizard
            .current_step_name()
            .map(|name| name.to_string())
            .unwrap_or_else(|| wizard.phase().to_string())
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut wizard = onboarding_wizard(
        SimulatedPlanGenerator::new(Duration::from_millis(800)),
        CheckoutSubmitter::new(PrintingGateway),
    )?;

    let answers = [
        vec![("personal", json!({ "gender": "female" }))],
        vec![("goals", json!({ "objective": "lose_weight" }))],
        vec![("personal", json!({ "age": 34 }))],
        vec![("measurements", json!({ "height_cm": 168 }))],
        vec![("measurements", json!({ "weight_kg": 72 }))],
        vec![("goals", json!({ "target_weight_kg": 65 }))],
        vec![("preferences", json!({ "activity_level": "light" }))],
        vec![("preferences", json!({ "experience": "beginner" }))],
        vec![("preferences", json!({ "training_location": "home" }))],
        vec![("preferences", json!({ "diet": "vegetarian" }))],
        vec![
            ("plan", json!({ "tier": "premium", "billing": "quarterly" })),
            ("personal", json!({ "email": "lea@example.com" })),
        ],
    ];

    for step_answers in answers {
        print_position(&wizard);
        if let Transition::Rejected(reason) = wizard.attempt_next() {
            let message = wizard.feedback().map(Feedback::message).unwrap_or_default();
            println!("  refused ({}): {}", reason, message);
        }
        for (section, partial) in step_answers {
            wizard.update_data(section, partial)?;
        }
        wizard.attempt_next();
    }

    print_position(&wizard);
    println!("  generating your plan...");
    wizard.run_preparation().await?;
    if let Some(plan) = wizard.data().section("generated_plan") {
        println!("  plan: {}", serde_json::Value::Object(plan.clone()));
    }
    wizard.attempt_next();

    print_position(&wizard);
    match wizard.submit().await {
        Ok(()) => println!("Onboarding completed"),
        Err(e) => {
            let message = wizard.feedback().map(Feedback::message).unwrap_or_default();
            eprintln!("Submission failed: {} ({})", message, e);
        }
    }

    Ok(())
}
