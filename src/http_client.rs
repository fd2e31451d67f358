use bytes::Bytes;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Query parameters, keyed so every key appears once and in a stable order.
pub type QueryParams = BTreeMap<String, String>;

const STATUS_KEY: &str = "stat";
const STATUS_FAILURE: &str = "fail";
const MESSAGE_KEY: &str = "message";
const CODE_KEY: &str = "code";

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// GET `base_url` with the given query and parse the body as JSON.
    ///
    /// A body carrying a failure envelope (`"stat": "fail"`) becomes
    /// [`AppError::Api`] with the envelope's message, whatever the HTTP status.
    pub async fn get(&self, params: &QueryParams) -> AppResult<Value> {
        let url = format!("{}{}", self.base_url, escaped_parameters(params));
        tracing::debug!("GET {}", self.base_url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        let parsed: Option<Value> = serde_json::from_slice(&body).ok();
        if let Some(err) = parsed.as_ref().and_then(failure_from_envelope) {
            tracing::warn!("API returned failure envelope: {}", err);
            return Err(err);
        }

        if !status.is_success() {
            return Err(AppError::UnexpectedStatus(status.as_u16()));
        }

        parsed.ok_or_else(|| {
            AppError::MalformedResponse(format!("response body is not JSON ({} bytes)", body.len()))
        })
    }

    /// GET arbitrary binary content, without JSON parsing.
    pub async fn get_raw(&self, url: &str) -> AppResult<Bytes> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UnexpectedStatus(status.as_u16()));
        }
        Ok(response.bytes().await?)
    }
}

/// Build `?k1=v1&k2=v2` from the parameters, percent-encoding keys and values
/// (RFC 3986 unreserved characters pass through, space becomes `%20`).
/// An empty map gives an empty string.
pub fn escaped_parameters(params: &QueryParams) -> String {
    if params.is_empty() {
        return String::new();
    }

    let pairs: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();

    format!("?{}", pairs.join("&"))
}

/// Map a `{"stat": "fail", "message": ...}` envelope to an error.
fn failure_from_envelope(body: &Value) -> Option<AppError> {
    if body.get(STATUS_KEY).and_then(Value::as_str) != Some(STATUS_FAILURE) {
        return None;
    }

    let message = body
        .get(MESSAGE_KEY)
        .and_then(Value::as_str)
        .unwrap_or("The photo service reported a failure")
        .to_string();
    let code = body.get(CODE_KEY).and_then(Value::as_i64);

    Some(AppError::Api { code, message })
}
