use crate::presenter::{PAGE_SIZE, page_count};
use crate::spreadsheet::{FileKind, IngestError, ingest};

/// One phone number taken from the uploaded sheet, plus its validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub number: String,
    /// `Some(true)` = valid/active, `Some(false)` = invalid, `None` = not checked yet
    pub status: Option<bool>,
    pub error: Option<String>,
    pub is_processing: bool,
}

impl Row {
    pub fn new(number: impl Into<String>) -> Self {
        Row {
            number: number.into(),
            status: None,
            error: None,
            is_processing: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status.is_some()
    }

    fn clear_result(&mut self) {
        self.status = None;
        self.error = None;
        self.is_processing = false;
    }
}

/// Lifecycle of a validation run over a `RunState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Running,
    Completed,
    HaltedOnCredentialError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub unchecked: usize,
}

/// The single piece of shared state: the ordered rows of the current upload,
/// the run progress and the page being displayed.
///
/// Only the pipeline mutates rows, and only their result fields; the row order
/// is fixed when the rows are loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    rows: Vec<Row>,
    progress: u8,
    current_page: usize,
    pub(crate) phase: RunPhase,
}

impl Default for RunState {
    fn default() -> Self {
        RunState {
            rows: Vec::new(),
            progress: 0,
            current_page: 1,
            phase: RunPhase::Idle,
        }
    }
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Row>) -> Self {
        RunState {
            rows,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Replace the whole state with a freshly ingested upload.
    ///
    /// On failure the current rows are left untouched.
    pub fn load(&mut self, bytes: &[u8], kind: FileKind) -> Result<usize, IngestError> {
        let rows = ingest(bytes, kind)?;
        let count = rows.len();
        *self = RunState::from_rows(rows);
        Ok(count)
    }

    /// Move the display to `page`, clamped to the pages that exist.
    pub fn set_current_page(&mut self, page: usize) {
        let last = page_count(self.rows.len(), PAGE_SIZE).max(1);
        self.current_page = page.clamp(1, last);
    }

    /// True once at least one row carries a validation status.
    pub fn has_results(&self) -> bool {
        self.rows.iter().any(Row::is_resolved)
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            total: self.rows.len(),
            ..RunSummary::default()
        };
        for row in &self.rows {
            match row.status {
                Some(true) => summary.valid += 1,
                Some(false) => summary.invalid += 1,
                None => summary.unchecked += 1,
            }
        }
        summary
    }

    pub(crate) fn begin_run(&mut self) {
        self.phase = RunPhase::Running;
        self.progress = 0;
        self.rows.iter_mut().for_each(Row::clear_result);
    }

    pub(crate) fn row_mut(&mut self, index: usize) -> &mut Row {
        &mut self.rows[index]
    }

    pub(crate) fn set_progress(&mut self, progress: u8) {
        self.progress = progress;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(numbers: &[&str]) -> RunState {
        RunState::from_rows(numbers.iter().map(|n| Row::new(*n)).collect())
    }

    #[test]
    fn test_new_state_is_idle_and_empty() {
        let state = RunState::new();
        assert!(state.is_empty());
        assert_eq!(state.progress(), 0);
        assert_eq!(state.current_page(), 1);
        assert_eq!(state.phase(), RunPhase::Idle);
        assert!(!state.has_results());
    }

    #[test]
    fn test_summary_counts_each_status() {
        let mut state = state_with(&["1", "2", "3", "4"]);
        state.row_mut(0).status = Some(true);
        state.row_mut(1).status = Some(false);
        state.row_mut(2).status = Some(true);

        let summary = state.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.valid, 2);
        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.unchecked, 1);
        assert!(state.has_results());
    }

    #[test]
    fn test_set_current_page_clamps_to_existing_pages() {
        let numbers: Vec<String> = (0..120).map(|i| i.to_string()).collect();
        let mut state = RunState::from_rows(numbers.into_iter().map(Row::new).collect());

        state.set_current_page(0);
        assert_eq!(state.current_page(), 1);
        state.set_current_page(3);
        assert_eq!(state.current_page(), 3);
        state.set_current_page(9);
        assert_eq!(state.current_page(), 3);

        let mut empty = RunState::new();
        empty.set_current_page(4);
        assert_eq!(empty.current_page(), 1);
    }

    #[test]
    fn test_begin_run_clears_previous_results() {
        let mut state = state_with(&["1", "2"]);
        state.row_mut(0).status = Some(false);
        state.row_mut(0).error = Some("nope".to_string());
        state.set_progress(50);

        state.begin_run();

        assert_eq!(state.phase(), RunPhase::Running);
        assert_eq!(state.progress(), 0);
        assert!(state.rows().iter().all(|row| row.status.is_none() && row.error.is_none()));
        assert_eq!(state.rows()[0].number, "1");
    }

    #[test]
    fn test_failed_load_keeps_existing_rows() {
        let mut state = state_with(&["+15550001"]);
        let mut csv = String::from("Number\n");
        for i in 0..=crate::MAX_ROWS {
            csv.push_str(&format!("{i}\n"));
        }

        let result = state.load(csv.as_bytes(), FileKind::Csv);

        assert!(matches!(result, Err(IngestError::TooManyRows(n)) if n == crate::MAX_ROWS + 1));
        assert_eq!(state.len(), 1);
        assert_eq!(state.rows()[0].number, "+15550001");
    }

    #[test]
    fn test_load_replaces_rows_and_resets_page() {
        let mut state = state_with(&["old"]);
        state.row_mut(0).status = Some(true);

        let count = state.load(b"Phone\n111\n222\n", FileKind::Csv).unwrap();

        assert_eq!(count, 2);
        assert_eq!(state.rows()[0], Row::new("111"));
        assert_eq!(state.rows()[1], Row::new("222"));
        assert_eq!(state.current_page(), 1);
        assert!(!state.has_results());
    }
}
