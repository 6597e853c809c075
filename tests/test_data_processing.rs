//! Integration test: loading, cleaning, splitting, preprocessing

use polars::prelude::*;
use std::fs;
use telco_churn::data::{clean, load_dataset, summarize, train_test_split, TARGET_COLUMN};
use telco_churn::preprocessing::FeaturePreprocessor;
use telco_churn::RANDOM_SEED;

fn raw_customers() -> DataFrame {
    df!(
        "customerID" => &["0001-A", "0002-B", "0003-C", "0004-D", "0005-E",
                          "0006-F", "0007-G", "0008-H", "0009-I", "0010-J"],
        "gender" => &["Male", "Female", "Male", "Female", "Male",
                      "Female", "Male", "Female", "Male", "Female"],
        "Partner" => &["Yes", "No", "No", "Yes", "No",
                       "Yes", "No", "No", "Yes", "No"],
        "Dependents" => &["No", "No", "Yes", "No", "No",
                          "Yes", "No", "No", "No", "Yes"],
        "PhoneService" => &["Yes", "Yes", "No", "Yes", "Yes",
                            "Yes", "No", "Yes", "Yes", "Yes"],
        "PaperlessBilling" => &["Yes", "No", "Yes", "No", "Yes",
                                "No", "Yes", "No", "Yes", "No"],
        "tenure" => &[1i64, 34, 2, 45, 2, 8, 22, 10, 28, 62],
        "Contract" => &["Month-to-month", "One year", "Month-to-month", "One year",
                        "Month-to-month", "Month-to-month", "Two year", "Month-to-month",
                        "Two year", "Two year"],
        "MonthlyCharges" => &[29.85, 56.95, 53.85, 42.30, 70.70,
                              99.65, 89.10, 29.75, 104.80, 56.15],
        "TotalCharges" => &["29.85", "1889.5", "108.15", "1840.75", "151.65",
                            " ", "1949.4", "301.9", "3046.05", "3487.95"],
        "Churn" => &["No", "No", "Yes", "No", "Yes",
                     "Yes", "No", "No", "Yes", "No"],
    )
    .unwrap()
}

#[test]
fn test_load_dataset_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    fs::write(
        &path,
        "customerID,tenure,Churn\n0001-A,12,No\n0002-B,1,Yes\n",
    )
    .unwrap();

    let df = load_dataset(&path).unwrap();
    assert_eq!(df.shape(), (2, 3));
}

#[test]
fn test_load_missing_file_is_fatal() {
    assert!(load_dataset(std::path::Path::new("/nonexistent/data.csv")).is_err());
}

#[test]
fn test_clean_maps_and_drops() {
    let prepared = clean(&raw_customers()).unwrap();

    // identifier never reaches the feature table
    assert!(prepared.features.column("customerID").is_err());
    assert!(prepared.features.column(TARGET_COLUMN).is_err());

    // binary text columns became numeric features
    assert!(prepared.numeric_columns.contains(&"gender".to_string()));
    assert!(prepared.numeric_columns.contains(&"PaperlessBilling".to_string()));
    assert!(prepared.categorical_columns.contains(&"Contract".to_string()));

    // target is 0/1
    assert!(prepared.target.iter().all(|&v| v == 0.0 || v == 1.0));
    assert_eq!(prepared.target.iter().filter(|&&v| v == 1.0).count(), 4);
}

#[test]
fn test_clean_coerces_total_charges() {
    let prepared = clean(&raw_customers()).unwrap();
    let charges = prepared.features.column("TotalCharges").unwrap();

    // the blank cell became a null, not a parse failure
    assert_eq!(charges.null_count(), 1);
    assert!(prepared.numeric_columns.contains(&"TotalCharges".to_string()));
}

#[test]
fn test_split_is_stratified_and_seeded() {
    let prepared = clean(&raw_customers()).unwrap();
    let split = train_test_split(&prepared, 0.2, RANDOM_SEED).unwrap();

    assert_eq!(
        split.x_train.height() + split.x_test.height(),
        prepared.features.height()
    );
    assert_eq!(split.x_train.height(), split.y_train.len());
    assert_eq!(split.x_test.height(), split.y_test.len());

    let again = train_test_split(&prepared, 0.2, RANDOM_SEED).unwrap();
    assert_eq!(split.y_test, again.y_test);
}

#[test]
fn test_summary_covers_every_column() {
    let df = raw_customers();
    let eda = summarize(&df).unwrap();

    assert_eq!(eda.missing_values.len(), df.width());
    assert!(eda.statistics.contains_key("MonthlyCharges"));
    assert!(eda.churn_distribution.contains_key("Yes"));

    let corr = &eda.correlation_matrix["tenure"];
    assert!((corr["tenure"] - 1.0).abs() < 1e-9);
}

#[test]
fn test_preprocessor_end_to_end() {
    let prepared = clean(&raw_customers()).unwrap();
    let mut preprocessor = FeaturePreprocessor::new(
        prepared.numeric_columns.clone(),
        prepared.categorical_columns.clone(),
    );
    let x = preprocessor.fit_transform(&prepared.features).unwrap();

    assert_eq!(x.nrows(), prepared.features.height());
    assert_eq!(x.ncols(), preprocessor.n_output_features());
    assert!(x.iter().all(|v| v.is_finite()));

    let names = preprocessor.expanded_feature_names().unwrap();
    assert_eq!(names.len(), x.ncols());
    assert!(names.contains(&"Contract_Two year".to_string()));
}
