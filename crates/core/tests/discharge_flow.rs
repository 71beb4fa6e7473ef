use hms_core::{
    BillingParams, CoreConfig, ErrorKind, FeeSchedule, PatientFilter, PatientRegistry,
    PatientStatus,
};
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn open_registry(temp_dir: &TempDir) -> (CoreConfig, PatientRegistry) {
    let cfg = CoreConfig::new(temp_dir.path().join("hms.db"), FeeSchedule::default())
        .expect("CoreConfig::new should succeed");
    let registry = PatientRegistry::open(&cfg).expect("registry should open");
    (cfg, registry)
}

#[test]
fn admit_update_search_and_discharge() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (cfg, mut registry) = open_registry(&temp_dir);

    let jane = registry
        .admit("Jane Doe", "34", "F", "Fracture")
        .expect("admit should succeed");
    registry
        .admit("John Smith", "61", "M", "Influenza")
        .expect("admit should succeed");

    registry
        .update_status(jane.id, PatientStatus::Critical)
        .expect("status update should succeed");

    let filter = PatientFilter::new("Jane").unwrap();
    let found = registry.list(Some(&filter)).expect("list should succeed");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, jane.id);
    assert_eq!(found[0].status, PatientStatus::Critical);

    let params = cfg.default_billing_params().with_days_stayed(3);
    let (discharged, invoice) = registry
        .discharge_with_invoice(jane.id, &params)
        .expect("discharge should succeed");

    assert_eq!(discharged.status, PatientStatus::Discharged);
    assert_eq!(invoice.grand_total, dec!(10000));
    let descriptions: Vec<&str> = invoice
        .line_items
        .iter()
        .map(|item| item.description.as_str())
        .collect();
    assert_eq!(
        descriptions,
        vec!["Room Charges (3 days)", "Doctor Fees", "Medical/Lab"]
    );

    let lowercase = PatientFilter::new("doe").unwrap();
    let found = registry.list(Some(&lowercase)).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].status, PatientStatus::Discharged);
}

#[test]
fn discharge_state_survives_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (cfg, mut registry) = open_registry(&temp_dir);

    let patient = registry.admit("Ada Lovelace", "36", "F", "Fever").unwrap();
    let params = BillingParams::parse(Some("2"), "1000", "250.50", "0").unwrap();
    let (_, invoice) = registry.discharge_with_invoice(patient.id, &params).unwrap();
    assert_eq!(invoice.grand_total, dec!(2250.50));
    registry.close().expect("close should succeed");

    let mut registry = PatientRegistry::open(&cfg).expect("reopen should succeed");
    let stored = registry.get(patient.id).unwrap();
    assert_eq!(stored.status, PatientStatus::Discharged);
    assert_eq!(stored.admitted_at, patient.admitted_at);

    let err = registry
        .update_status(patient.id, PatientStatus::Admitted)
        .expect_err("discharged record stays closed");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn delete_after_restart_leaves_other_records() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let (cfg, mut registry) = open_registry(&temp_dir);

    let first = registry.admit("First", "10", "M", "Cut").unwrap();
    let second = registry.admit("Second", "11", "F", "Bruise").unwrap();
    drop(registry);

    let mut registry = PatientRegistry::open(&cfg).unwrap();
    registry.delete(first.id).expect("delete should succeed");

    let remaining = registry.list(None).unwrap();
    assert_eq!(remaining, vec![second]);
    assert_eq!(
        registry.delete(first.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}
