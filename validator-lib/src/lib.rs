#![allow(clippy::needless_return)]

pub mod model;
pub mod pipeline;
pub mod presenter;
pub mod proxy;
pub mod spreadsheet;
pub mod utils;

// Test utilities - only compiled when testing or with test feature
// #[cfg(test)] alone doesn't work for integration tests (they're external crates)
// The feature flag makes it available to integration tests via dev-dependencies
#[cfg(any(test, feature = "test"))]
pub mod test_utils;

pub use anyhow;
pub use reqwest;
pub use serde_json;

pub use model::{Row, RunPhase, RunState, RunSummary};
pub use pipeline::{PipelineError, RunOutcome, SkipReason, run};
pub use presenter::{PageView, export, export_to_path, page, page_count, page_window};
pub use proxy::{
    NumberLookup, ProviderClient, ProviderResponse, ProxyClient, ProxyError, ValidateQuery,
};
pub use spreadsheet::{FileKind, IngestError, ingest, ingest_file};

pub const ERRORS_LOG_FILE: &str = "errors.log";

/// Hard cap on the number of phone numbers accepted from a single upload
pub const MAX_ROWS: usize = 5000;
