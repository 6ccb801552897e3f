//! # Vulnerable Customer Scenarios
//!
//! CSV upload through the store, then classification, filtering and ranking
//! through the view, with the threshold taken from configuration.

use cduty_core::{CdutyError, DashboardConfig};
use cduty_vulnerability::{
    CustomerRecord, CustomerStore, ProductCategory, ScoreBand, Selection, ThresholdClassifier,
    UploadError, VulnerabilityView, EMPTY_STATE_MESSAGE,
};

const UPLOAD: &str = "\
Customer ID,Customer Name,Vulnerability Score,Product Category,Product,Vulnerability Flags,Branch
C01,Alice Hart,85,Mortgages,Fixed Rate,,Leeds
C02,Bob Stone,20,Mortgages,Tracker,,Leeds
C03,Cara Penn,62,Mortgages,Tracker,,York
C04,Dev Shah,10,Loans,Personal Loan,,York
C05,Eve Lamb,,Loans,Car Finance,Life Events,Hull
C06,Finn Oak,30,Saver plans,ISA,,Hull
C07,Gia Moss,95,Saver plans,Easy Access,,Leeds
C08,Hal Birch,49,Loans,Personal Loan,,York
C09,Ivy Fern,,Mortgages,Fixed Rate,,Hull
C10,Jon Reed,5,Saver plans,ISA,,Leeds
";

fn ids(rows: &[&CustomerRecord]) -> Vec<String> {
    rows.iter().map(|c| c.id().to_string()).collect()
}

fn category(s: &str) -> Selection<ProductCategory> {
    Selection::Only(ProductCategory::new(s).unwrap())
}

fn band(s: &str) -> Selection<ScoreBand> {
    Selection::Only(s.parse().unwrap())
}

#[test]
fn ten_customers_four_vulnerable() {
    let mut store = CustomerStore::new();
    let snapshot = store.upload_str(UPLOAD).unwrap();
    assert!(store.is_validated());
    assert_eq!(snapshot.len(), 10);

    let classifier = ThresholdClassifier::default();
    let mut view = VulnerabilityView::new(&snapshot, &classifier);
    assert_eq!(ids(&view.rows()), vec!["C07", "C01", "C03", "C05"]);

    view.select_category(category("Mortgages"));
    assert_eq!(ids(&view.rows()), vec!["C01", "C03"]);
    assert_eq!(
        view.summary().filtered_from().as_deref(),
        Some("Filtered from 4 total")
    );

    view.select_band(band("80-90"));
    assert_eq!(ids(&view.rows()), vec!["C01"]);

    view.clear_filters();
    assert_eq!(view.rows().len(), 4);
    assert!(!view.summary().has_active_filters);
}

#[test]
fn flagged_customer_without_score_is_never_in_a_band() {
    let mut store = CustomerStore::new();
    let snapshot = store.upload_str(UPLOAD).unwrap();
    let classifier = ThresholdClassifier::default();
    let mut view = VulnerabilityView::new(&snapshot, &classifier);

    view.select_category(category("Loans"));
    assert_eq!(ids(&view.rows()), vec!["C05"]);
    assert_eq!(view.available_products(), vec!["Car Finance"]);

    for b in ScoreBand::STANDARD {
        view.select_band(band(b));
        assert!(view.rows().is_empty(), "band {b}");
        assert_eq!(view.summary().empty_state(), Some(EMPTY_STATE_MESSAGE));
    }

    view.select_band(Selection::All);
    assert_eq!(ids(&view.rows()), vec!["C05"]);
}

#[test]
fn category_change_resets_product() {
    let mut store = CustomerStore::new();
    let snapshot = store.upload_str(UPLOAD).unwrap();
    let classifier = ThresholdClassifier::default();
    let mut view = VulnerabilityView::new(&snapshot, &classifier);

    view.select_category(category("Mortgages"));
    view.select_product(Selection::Only("Tracker".into())).unwrap();
    assert_eq!(ids(&view.rows()), vec!["C03"]);

    view.select_category(category("Saver plans"));
    assert!(view.filters().product().is_all());
    assert_eq!(ids(&view.rows()), vec!["C07"]);
}

#[test]
fn passthrough_columns_survive_upload() {
    let mut store = CustomerStore::new();
    let snapshot = store.upload_str(UPLOAD).unwrap();
    let first = &snapshot.customers()[0];
    assert_eq!(first.field("Branch"), Some("Leeds"));
    assert!(snapshot.columns().iter().any(|c| c == "Branch"));
}

#[test]
fn rejected_upload_keeps_previous_snapshot() {
    let mut store = CustomerStore::new();
    let first = store.upload_str(UPLOAD).unwrap();

    let duplicate = "\
Customer ID,Customer Name,Vulnerability Score,Product Category,Product
C01,Alice Hart,85,Mortgages,Fixed Rate
C01,Alice Again,70,Loans,Personal Loan
";
    let err = store.upload_str(duplicate).unwrap_err();
    assert!(matches!(err, UploadError::DuplicateCustomer { row: 2, first_row: 1, .. }));
    assert!(matches!(CdutyError::from(err), CdutyError::Upload(_)));

    let current = store.snapshot().unwrap();
    assert_eq!(current.len(), first.len());
    assert_eq!(current.uploaded_at(), first.uploaded_at());
}

#[test]
fn threshold_from_config_changes_classification() {
    let config = DashboardConfig::default()
        .with_env(|var| (var == "CDUTY_VULNERABILITY_THRESHOLD").then(|| "60".to_string()))
        .unwrap();
    let classifier = ThresholdClassifier::from_config(&config).unwrap();

    let mut store = CustomerStore::new();
    let snapshot = store.upload_str(UPLOAD).unwrap();
    let view = VulnerabilityView::new(&snapshot, &classifier);
    assert_eq!(ids(&view.rows()), vec!["C07", "C01", "C03", "C05"]);

    let config = DashboardConfig::default()
        .with_env(|var| (var == "CDUTY_VULNERABILITY_THRESHOLD").then(|| "90".to_string()))
        .unwrap();
    let classifier = ThresholdClassifier::from_config(&config).unwrap();
    let view = VulnerabilityView::new(&snapshot, &classifier);
    assert_eq!(ids(&view.rows()), vec!["C07", "C05"]);
}

#[test]
fn upload_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("customers.csv");
    std::fs::write(&path, UPLOAD).unwrap();

    let mut store = CustomerStore::new();
    let snapshot = store.upload_path(&path).unwrap();
    assert_eq!(snapshot.len(), 10);

    let missing = dir.path().join("absent.csv");
    assert!(matches!(
        store.upload_path(&missing),
        Err(UploadError::Read(_))
    ));
    assert!(store.is_validated());
}
