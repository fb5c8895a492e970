use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tipster_models::{Result, TipsterError};
use tracing::debug;

/// Shared client for all providers.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("tipster-rs/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| TipsterError::Config(format!("failed to build HTTP client: {e}")))
}

/// Sends the request and decodes a JSON body. Transport and HTTP status failures are
/// `ProviderUnavailable`; a body that does not decode is `MalformedProviderResponse`.
pub async fn fetch_json<T: DeserializeOwned>(provider: &str, request: RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| TipsterError::unavailable(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TipsterError::unavailable(provider, format!("HTTP {status}")));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| TipsterError::unavailable(provider, e))?;
    debug!("📥 {} responded with {} bytes", provider, body.len());

    serde_json::from_slice(&body).map_err(|e| TipsterError::malformed(provider, e))
}

/// Accepts RFC 3339 plus the looser shapes providers actually send
/// (`2024-08-17T15:00Z`, naive `2024-08-17T15:00:00`, `2024-08-17 15:00:00`), naive
/// values being UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%MZ",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Date plus optional time of day, as split by some providers.
pub fn parse_date_time(date: &str, time: Option<&str>) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = time
        .map(|t| t.trim().trim_end_matches("+00:00"))
        .and_then(|t| {
            chrono::NaiveTime::parse_from_str(t, "%H:%M:%S")
                .or_else(|_| chrono::NaiveTime::parse_from_str(t, "%H:%M"))
                .ok()
        })
        .unwrap_or_default();
    Some(date.and_time(time).and_utc())
}

/// Scores arrive as numbers or numeric strings depending on the provider.
pub fn json_u16(value: &serde_json::Value) -> Option<u16> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|v| u16::try_from(v).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
