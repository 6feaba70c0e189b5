use thiserror::Error;

use crate::model::{RunPhase, RunState};
use crate::proxy::{NumberLookup, ProviderResponse};
use crate::utils::{LogCategory, write_error_to_log};

/// Error recorded on a row whose lookup never produced a payload
pub const ROW_FAILURE_MESSAGE: &str = "Failed to validate";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("The API key was rejected by the provider, validation stopped")]
    InvalidCredential,

    #[error("Lookup for {number} failed: {message}")]
    PerRowFailure { number: String, message: String },
}

/// Why `run` returned without touching the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyRunning,
    NoRows,
    MissingApiKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every row was visited. `failed` counts rows whose lookup errored.
    Completed { validated: usize, failed: usize },
    /// Stopped after row `at_row` (0-indexed); later rows were not dispatched.
    Halted { at_row: usize, reason: PipelineError },
    Skipped(SkipReason),
}

/// Validate every row of `state`, one lookup at a time, in row order.
///
/// `on_update` sees the state after each row is marked in flight and after
/// each row is resolved. A credential rejection stops the run and leaves
/// progress where it was; a normal finish resets progress to 0.
pub fn run(
    state: &mut RunState,
    api_key: &str,
    lookup: &dyn NumberLookup,
    mut on_update: impl FnMut(&RunState),
) -> RunOutcome {
    if state.phase() == RunPhase::Running {
        return RunOutcome::Skipped(SkipReason::AlreadyRunning);
    }
    if state.is_empty() {
        return RunOutcome::Skipped(SkipReason::NoRows);
    }
    if api_key.is_empty() {
        return RunOutcome::Skipped(SkipReason::MissingApiKey);
    }

    state.begin_run();
    on_update(state);

    let total = state.len();
    let mut failed = 0;

    for index in 0..total {
        state.row_mut(index).is_processing = true;
        on_update(state);

        let number = state.rows()[index].number.clone();
        let halted = match lookup.lookup(&number, api_key) {
            Ok(response) => apply_response(state, index, &response),
            Err(e) => {
                let failure = PipelineError::PerRowFailure {
                    number,
                    message: e.to_string(),
                };
                write_error_to_log(LogCategory::NumberValidationFailure, &failure.to_string());

                let row = state.row_mut(index);
                row.status = Some(false);
                row.error = Some(ROW_FAILURE_MESSAGE.to_string());
                failed += 1;
                false
            }
        };

        state.row_mut(index).is_processing = false;
        state.set_progress(progress_percent(index + 1, total));

        if halted {
            state.phase = RunPhase::HaltedOnCredentialError;
            write_error_to_log(
                LogCategory::ValidationHalted,
                &format!(
                    "{} (row {} of {total})",
                    PipelineError::InvalidCredential,
                    index + 1
                ),
            );
            on_update(state);
            return RunOutcome::Halted {
                at_row: index,
                reason: PipelineError::InvalidCredential,
            };
        }

        on_update(state);
    }

    state.phase = RunPhase::Completed;
    state.set_progress(0);
    on_update(state);

    RunOutcome::Completed {
        validated: total - failed,
        failed,
    }
}

/// Copy the payload onto the row. Returns true when the payload rejects the API key.
fn apply_response(state: &mut RunState, index: usize, response: &ProviderResponse) -> bool {
    let invalid_credential = response.is_invalid_credential();
    let row = state.row_mut(index);
    row.status = if invalid_credential {
        Some(false)
    } else {
        response.number_status()
    };
    row.error = response.error();
    invalid_credential
}

/// `round(100 * done / total)`, halves rounded up
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (200 * done + total) / (2 * total);
    percent.min(100) as u8
}
