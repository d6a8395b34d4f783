pub mod error;
pub mod fundamental;
pub mod news;
pub mod time_series;

pub use error::{AlphaVantageError, Result};
pub use fundamental::*;
pub use news::*;
pub use time_series::*;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Upstream query parameters. Entries with an empty value are kept in the
/// mapping but never emitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters for one upstream `function`.
    pub fn for_function(function: &str) -> Self {
        let mut params = Self::new();
        params.insert("function", function);
        params
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    /// Non-empty entries, sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries that will be emitted.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Append `params` to `base_url` as an encoded query string.
///
/// Pairs already on the base URL survive unless `params` sets the same key.
pub fn build_request_url(base_url: &str, params: &QueryParams) -> Result<Url> {
    let mut url = Url::parse(base_url)?;

    let existing: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !params.contains(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.set_query(None);
    if existing.is_empty() && params.is_empty() {
        return Ok(url);
    }

    url.query_pairs_mut()
        .extend_pairs(existing.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .extend_pairs(params.iter());

    Ok(url)
}

#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl AlphaVantageClient {
    /// Every request made through this client is bounded by `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            client,
        })
    }

    /// Issue the GET and hand back the live response. The body is left
    /// unread for the caller.
    pub async fn fetch(&self, params: &QueryParams) -> Result<Response> {
        let mut params = params.clone();
        params.insert("apikey", self.api_key.as_str());
        let url = build_request_url(&self.base_url, &params)?;

        tracing::debug!(
            function = params.get("function").unwrap_or_default(),
            symbol = params.get("symbol").unwrap_or_default(),
            "Alpha Vantage request"
        );

        // the URL carries the key; keep it out of error text
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        Ok(response)
    }

    /// Fetch and decode the body as a JSON object, failing on an upstream
    /// error payload.
    pub async fn get_json(&self, params: &QueryParams) -> Result<Map<String, Value>> {
        let response = self.fetch(params).await?;
        let status = response.status();
        let body = response.bytes().await.map_err(reqwest::Error::without_url)?;

        let payload: Map<String, Value> = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(%status, "Alpha Vantage returned a non-object body");
            e
        })?;

        check_payload(&payload)?;
        Ok(payload)
    }

    /// Fetch and decode straight into `T`. `null` entries count as missing,
    /// so `#[serde(default)]` fields take their default.
    pub async fn get_typed<T: DeserializeOwned>(&self, params: &QueryParams) -> Result<T> {
        let mut payload = Value::Object(self.get_json(params).await?);
        strip_nulls(&mut payload);
        Ok(serde_json::from_value(payload)?)
    }

    /// Fetch and decode into a record whose fields are all strings.
    /// See [`decode_string_record`].
    pub async fn get_string_record<T: DeserializeOwned>(&self, params: &QueryParams) -> Result<T> {
        let payload = self.get_json(params).await?;
        decode_string_record(payload)
    }
}

fn check_payload(payload: &Map<String, Value>) -> Result<()> {
    if let Some(message) = payload.get("Error Message") {
        return Err(AlphaVantageError::Upstream(value_text(message)));
    }

    // A lone notice replaces the data when the key is rate limited or the
    // endpoint is premium-only.
    if payload.len() == 1 {
        for key in ["Information", "Note"] {
            if let Some(message) = payload.get(key) {
                return Err(AlphaVantageError::Notice(value_text(message)));
            }
        }
    }

    Ok(())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decode an upstream object into a string-only record.
///
/// Missing fields take their default (empty string, empty list), `null`
/// entries are treated as missing, and numbers or booleans keep their
/// textual form. No numeric parsing happens.
pub fn decode_string_record<T: DeserializeOwned>(payload: Map<String, Value>) -> Result<T> {
    let mut value = Value::Object(payload);
    stringify_scalars(&mut value);
    Ok(serde_json::from_value(value)?)
}

/// Drop `null` object entries and array items, recursively.
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => {
            items.retain(|v| !v.is_null());
            items.iter_mut().for_each(strip_nulls);
        }
        _ => {}
    }
}

fn stringify_scalars(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(stringify_scalars);
        }
        Value::Array(items) => items.iter_mut().for_each(stringify_scalars),
        Value::Number(n) => *value = Value::String(n.to_string()),
        Value::Bool(b) => *value = Value::String(b.to_string()),
        Value::Null | Value::String(_) => {}
    }
}
