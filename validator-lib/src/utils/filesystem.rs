use std::fs::OpenOptions;
use std::io::Write;

use crate::ERRORS_LOG_FILE;
use crate::utils::get_utc_iso_datetime;

/// Kinds of entries appended to `errors.log`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    /// An upload was refused, e.g. more than `MAX_ROWS` numbers
    UploadRejected,
    /// A run stopped because the provider rejected the API key
    ValidationHalted,
    /// A single lookup failed and the row was marked invalid
    NumberValidationFailure,
}

impl LogCategory {
    pub fn label(self) -> &'static str {
        match self {
            LogCategory::UploadRejected => "Upload Rejected",
            LogCategory::ValidationHalted => "Validation Halted",
            LogCategory::NumberValidationFailure => "Number Validation Failure",
        }
    }
}

fn format_log_entry(timestamp: &str, category: LogCategory, message: &str) -> String {
    format!("\n[{timestamp}] {}:\n{message}\n", category.label())
}

/// Append a timestamped entry to `errors.log` in the working directory.
///
/// Logging never fails the caller; an unwritable log is ignored.
pub fn write_error_to_log(category: LogCategory, message: &str) {
    let entry = format_log_entry(&get_utc_iso_datetime(), category, message);

    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(ERRORS_LOG_FILE)
    {
        let _ = writeln!(file, "{entry}");
    }
}
