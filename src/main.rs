//! Telco churn analysis - Main Entry Point
//!
//! Runs the full batch analysis on a customer CSV and scores one example
//! customer with the winning model.

use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use telco_churn::run_analysis;

#[derive(Parser, Debug)]
#[command(name = "telco-churn")]
#[command(about = "Telco customer churn analysis and prediction")]
struct Cli {
    /// Path to the customer CSV file
    #[arg(default_value = "Telco-Customer-Churn.csv")]
    data: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "telco_churn=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let (_result, predictor) = run_analysis(&cli.data)?;

    let example_customer = json!({
        "gender": "Male",
        "SeniorCitizen": 0,
        "Partner": "Yes",
        "Dependents": "No",
        "tenure": 36,
        "PhoneService": "Yes",
        "MultipleLines": "Yes",
        "InternetService": "Fiber optic",
        "OnlineSecurity": "No",
        "OnlineBackup": "No",
        "DeviceProtection": "Yes",
        "TechSupport": "No",
        "StreamingTV": "Yes",
        "StreamingMovies": "Yes",
        "Contract": "Month-to-month",
        "PaperlessBilling": "Yes",
        "PaymentMethod": "Electronic check",
        "MonthlyCharges": 95.7,
        "TotalCharges": 3455.3
    });
    let record = example_customer
        .as_object()
        .cloned()
        .unwrap_or_default();
    let outcome = predictor.predict(&record)?;

    println!(
        "Churn prediction for example customer: {} (Probability: {:.2})",
        outcome.prediction, outcome.probability
    );

    Ok(())
}
