use validator_lib::{Row, RunState};

// Re-export shared test utilities from src/test_utils.rs
// These are the core functions used by most tests
pub use validator_lib::test_utils::{
    ScriptedLookup, numbers_csv, phone_numbers, transport_failure,
    valid_payload,
};

/// A state loaded the same way an upload would be
#[allow(dead_code)]
pub fn loaded_state(numbers: &[String]) -> RunState {
    let mut state = RunState::new();
    state
        .load(&numbers_csv(numbers), validator_lib::FileKind::Csv)
        .unwrap();
    state
}

#[allow(dead_code)]
pub fn numbers_of(rows: &[Row]) -> Vec<String> {
    rows.iter().map(|row| row.number.clone()).collect()
}
