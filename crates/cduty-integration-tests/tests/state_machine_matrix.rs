//! # Dataset Lifecycle Transition Matrix
//!
//! Exhaustive 4x4 matrix over the dataset states, then every writer
//! operation driven from every reachable state.

use cduty_core::{AttemptId, DatasetDescriptor, DatasetName};
use cduty_state::{
    DatasetRegistry, DatasetState, DatasetStateKind, DatasetTransitionError, RegistryError,
    RegistryWriter,
};

fn name() -> DatasetName {
    DatasetName::new("ProductData").unwrap()
}

fn writer() -> RegistryWriter {
    let (writer, _) = DatasetRegistry::new(vec![DatasetDescriptor::new(
        name(),
        "ProductPerformance.csv",
    )])
    .unwrap()
    .into_shared();
    writer
}

#[test]
fn dataset_transition_matrix_exhaustive() {
    // Idle → Loading
    // Loading → Loaded, Error
    // Loaded → Loading (reload)
    // Error → Loading (retry)
    let expected_valid = [
        (DatasetStateKind::Idle, DatasetStateKind::Loading),
        (DatasetStateKind::Loading, DatasetStateKind::Loaded),
        (DatasetStateKind::Loading, DatasetStateKind::Error),
        (DatasetStateKind::Loaded, DatasetStateKind::Loading),
        (DatasetStateKind::Error, DatasetStateKind::Loading),
    ];

    for from in DatasetStateKind::ALL {
        for to in DatasetStateKind::ALL {
            let actual = from.can_transition_to(to);
            let expected = expected_valid.contains(&(from, to));
            assert_eq!(
                actual, expected,
                "Dataset transition {from:?} → {to:?}: expected valid={expected}, got valid={actual}"
            );
        }
    }
}

#[test]
fn idle_rejects_completion_and_failure() {
    let w = writer();
    let stray = AttemptId::new();
    assert!(matches!(
        w.complete_load(&name(), stray, 1),
        Err(RegistryError::Transition(DatasetTransitionError::InvalidTransition {
            from: DatasetStateKind::Idle,
            to: DatasetStateKind::Loaded,
            ..
        }))
    ));
    assert!(w.fail_load(&name(), stray, "x").is_err());
    assert_eq!(w.reader().state_of(&name()), Some(DatasetState::Idle));
}

#[test]
fn loading_rejects_second_begin() {
    let w = writer();
    let attempt = w.begin_load(&name()).unwrap();
    match w.begin_load(&name()) {
        Err(RegistryError::Transition(DatasetTransitionError::AlreadyLoading {
            attempt: outstanding,
            ..
        })) => assert_eq!(outstanding, attempt),
        other => panic!("expected AlreadyLoading, got {other:?}"),
    }
}

#[test]
fn loaded_rejects_failure_but_allows_reload() {
    let w = writer();
    let attempt = w.begin_load(&name()).unwrap();
    w.complete_load(&name(), attempt, 120).unwrap();

    assert!(w.fail_load(&name(), attempt, "late").is_err());
    assert_eq!(
        w.reader().state_of(&name()),
        Some(DatasetState::Loaded { row_count: 120 })
    );

    assert!(w.begin_load(&name()).is_ok());
    assert_eq!(w.reader().state_of(&name()), Some(DatasetState::Loading));
}

#[test]
fn error_allows_retry_and_clears_message() {
    let w = writer();
    let first = w.begin_load(&name()).unwrap();
    w.fail_load(&name(), first, "network error").unwrap();

    let second = w.begin_load(&name()).unwrap();
    let state = w.reader().state_of(&name()).unwrap();
    assert_eq!(state, DatasetState::Loading);
    assert!(state.error_message().is_none());

    // The earlier attempt can no longer settle the record.
    assert!(matches!(
        w.complete_load(&name(), first, 9),
        Err(RegistryError::Transition(DatasetTransitionError::StaleAttempt { .. }))
    ));
    w.complete_load(&name(), second, 9).unwrap();

    let snapshot = w.reader().snapshot();
    let kinds: Vec<_> = snapshot
        .get(&name())
        .unwrap()
        .transitions()
        .iter()
        .map(|t| (t.from_state, t.to_state))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (DatasetStateKind::Idle, DatasetStateKind::Loading),
            (DatasetStateKind::Loading, DatasetStateKind::Error),
            (DatasetStateKind::Error, DatasetStateKind::Loading),
            (DatasetStateKind::Loading, DatasetStateKind::Loaded),
        ]
    );
}

#[test]
fn unknown_dataset_rejected_by_writer() {
    let w = writer();
    let other = DatasetName::new("SupportData").unwrap();
    assert_eq!(
        w.begin_load(&other),
        Err(RegistryError::UnknownDataset("SupportData".into()))
    );
}
