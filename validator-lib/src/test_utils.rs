// Test utilities available to both unit and integration tests
// Only compiled when testing

use std::cell::RefCell;
use std::collections::VecDeque;

use serde_json::json;

use crate::model::Row;
use crate::proxy::{NumberLookup, ProviderResponse, ProxyError};

/// A `NumberLookup` that answers from a script, in call order.
///
/// Once the script runs out every further lookup answers `{"numberstatus": true}`.
pub struct ScriptedLookup {
    script: RefCell<VecDeque<Result<ProviderResponse, ProxyError>>>,
    calls: RefCell<Vec<(String, String)>>,
}

impl ScriptedLookup {
    pub fn new(script: Vec<Result<ProviderResponse, ProxyError>>) -> Self {
        ScriptedLookup {
            script: RefCell::new(script.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn always_valid() -> Self {
        Self::new(Vec::new())
    }

    /// Lookups `1..k-1` succeed, lookup `k` (1-indexed) rejects the API key
    pub fn invalid_key_at(k: usize) -> Self {
        let mut script: Vec<_> = (1..k).map(|_| Ok(valid_payload())).collect();
        script.push(Ok(invalid_credential_payload()));
        Self::new(script)
    }

    /// Numbers passed to `lookup` so far, with the API key used
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl NumberLookup for ScriptedLookup {
    fn lookup(&self, number: &str, api_key: &str) -> Result<ProviderResponse, ProxyError> {
        self.calls
            .borrow_mut()
            .push((number.to_string(), api_key.to_string()));
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(valid_payload()))
    }
}

pub fn valid_payload() -> ProviderResponse {
    ProviderResponse(json!({ "numberstatus": true }))
}

pub fn invalid_number_payload(error: &str) -> ProviderResponse {
    ProviderResponse(json!({ "numberstatus": false, "error": error }))
}

pub fn invalid_credential_payload() -> ProviderResponse {
    ProviderResponse(json!({ "status": false, "error": "Invalid API Key" }))
}

pub fn transport_failure() -> Result<ProviderResponse, ProxyError> {
    Err(ProxyError::UpstreamFailure("connection refused".to_string()))
}

pub fn rows_from(numbers: &[&str]) -> Vec<Row> {
    numbers.iter().map(|number| Row::new(*number)).collect()
}

/// `count` distinct phone numbers, e.g. `+1555000001`
pub fn phone_numbers(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("+1555{i:06}")).collect()
}

/// A CSV upload with a header row followed by one number per line
pub fn numbers_csv(numbers: &[String]) -> Vec<u8> {
    let mut csv = String::from("Phone Number\n");
    for number in numbers {
        csv.push_str(number);
        csv.push('\n');
    }
    csv.into_bytes()
}
