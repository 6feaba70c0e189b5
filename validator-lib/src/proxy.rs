use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Third-party WhatsApp number lookup endpoint
pub const PROVIDER_URL: &str = "https://proweblook.com/api/v1/checkwanumber";

/// Error text the provider returns when the API key is rejected
pub const INVALID_API_KEY: &str = "Invalid API Key";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    #[error("Missing required parameters")]
    MissingParameters,

    #[error("Failed to validate number")]
    UpstreamFailure(String),
}

impl ProxyError {
    /// HTTP status the proxy endpoint answers with
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::MissingParameters => 400,
            ProxyError::UpstreamFailure(_) => 500,
        }
    }

    /// JSON body the proxy endpoint answers with. The upstream cause is never exposed.
    pub fn body(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

/// Query string of the inbound `/api/validate` endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidateQuery {
    pub number: Option<String>,
    pub api_key: Option<String>,
}

impl ValidateQuery {
    /// Build from decoded query pairs. A repeated parameter keeps its first value.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = ValidateQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "number" => &mut query.number,
                "apiKey" => &mut query.api_key,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        query
    }
}

/// Provider payload, kept verbatim.
///
/// The provider answers lookups with a `numberstatus` field and credential
/// problems with a `status` field; both shapes are read from the same value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ProviderResponse(pub Value);

impl ProviderResponse {
    pub fn into_inner(self) -> Value {
        self.0
    }

    /// `numberstatus` read as a boolean-like value
    pub fn number_status(&self) -> Option<bool> {
        match self.0.get("numberstatus")? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "valid" | "1" => Some(true),
                "false" | "invalid" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn error(&self) -> Option<String> {
        self.0
            .get("error")
            .and_then(|e| e.as_str())
            .map(|e| e.to_string())
    }

    /// `{"status": false, "error": "Invalid API Key"}`
    pub fn is_invalid_credential(&self) -> bool {
        self.0.get("status").and_then(|s| s.as_bool()) == Some(false)
            && self.0.get("error").and_then(|e| e.as_str()) == Some(INVALID_API_KEY)
    }
}

/// Something that can look a phone number up.
pub trait NumberLookup {
    fn lookup(&self, number: &str, api_key: &str) -> Result<ProviderResponse, ProxyError>;
}

/// Handle one inbound validation request.
///
/// Missing or empty parameters are rejected before any outbound call. Any
/// upstream problem comes back as `UpstreamFailure`; nothing is retried.
pub fn validate(
    query: &ValidateQuery,
    upstream: &dyn NumberLookup,
) -> Result<ProviderResponse, ProxyError> {
    let number = query.number.as_deref().filter(|n| !n.is_empty());
    let api_key = query.api_key.as_deref().filter(|k| !k.is_empty());

    let (Some(number), Some(api_key)) = (number, api_key) else {
        return Err(ProxyError::MissingParameters);
    };

    upstream.lookup(number, api_key)
}

/// Talks to the third-party provider directly
pub struct ProviderClient {
    client: Client,
    base_url: String,
}

impl ProviderClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        ProviderClient {
            client,
            base_url: base_url.to_string(),
        }
    }
}

impl NumberLookup for ProviderClient {
    fn lookup(&self, number: &str, api_key: &str) -> Result<ProviderResponse, ProxyError> {
        fetch_json(
            &self.client,
            &self.base_url,
            &[("number", number), ("api_key", api_key)],
        )
    }
}

/// Talks to a running `/api/validate` proxy endpoint
pub struct ProxyClient {
    client: Client,
    endpoint: String,
}

impl ProxyClient {
    /// `base_url` is the proxy server root, e.g. `http://localhost:3000`
    pub fn new(client: Client, base_url: &str) -> Self {
        ProxyClient {
            client,
            endpoint: format!("{}/api/validate", base_url.trim_end_matches('/')),
        }
    }
}

impl NumberLookup for ProxyClient {
    fn lookup(&self, number: &str, api_key: &str) -> Result<ProviderResponse, ProxyError> {
        fetch_json(
            &self.client,
            &self.endpoint,
            &[("number", number), ("apiKey", api_key)],
        )
    }
}

fn fetch_json(
    client: &Client,
    url: &str,
    params: &[(&str, &str)],
) -> Result<ProviderResponse, ProxyError> {
    let response = client
        .get(url)
        .query(params)
        .send()
        .map_err(|e| ProxyError::UpstreamFailure(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().unwrap_or_default();
        return Err(ProxyError::UpstreamFailure(format!(
            "{url} answered {status}: {error_text}"
        )));
    }

    let body: Value = response
        .json()
        .map_err(|e| ProxyError::UpstreamFailure(e.to_string()))?;
    Ok(ProviderResponse(body))
}
