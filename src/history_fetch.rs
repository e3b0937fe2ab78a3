use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde_json::Value;

const REQUEST_TIMEOUT_SECS: u64 = 15;

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// One flattened daily contribution record. Any payload field may be
/// missing; absence of the contribution is kept distinct from zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributionRecord {
    pub member_id: String,
    pub member_name: String,
    pub day: Option<i64>,
    pub contribution: Option<f64>,
}

/// Fetch the club profile payload and flatten it into records.
pub fn fetch_club_history(url: &str) -> Result<Vec<ContributionRecord>> {
    let client = http_client()?;
    let resp = client
        .get(url)
        .header(USER_AGENT, "Mozilla/5.0")
        .send()
        .context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, body));
    }
    parse_club_history_json(&body)
}

/// True for connection-level failures worth another attempt. An HTTP error
/// status is a server answer and is never retried.
pub fn is_transient_fetch_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .is_some_and(|e| e.is_connect() || e.is_timeout())
    })
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    club_friend_history: Option<Vec<RawHistoryRow>>,
}

#[derive(Debug, Deserialize)]
struct RawHistoryRow {
    #[serde(default)]
    friend_viewer_id: Option<Value>,
    #[serde(default)]
    friend_name: Option<Value>,
    #[serde(default)]
    actual_date: Option<Value>,
    #[serde(default)]
    adjusted_interpolated_fan_gain: Option<Value>,
}

/// Normalize the raw payload. Missing fields degrade to empty strings or
/// absent values; only a fundamentally non-JSON body is an error.
pub fn parse_club_history_json(raw: &str) -> Result<Vec<ContributionRecord>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow::anyhow!("empty club response"));
    }

    let parsed: HistoryResponse = serde_json::from_str(trimmed).context("invalid club json")?;
    let rows = parsed.club_friend_history.unwrap_or_default();

    Ok(rows
        .into_iter()
        .map(|row| ContributionRecord {
            member_id: value_to_text(row.friend_viewer_id.as_ref()),
            member_name: value_to_text(row.friend_name.as_ref()),
            day: value_to_day(row.actual_date.as_ref()),
            contribution: value_to_number(row.adjusted_interpolated_fan_gain.as_ref()),
        })
        .collect())
}

fn value_to_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn value_to_day(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn value_to_number(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
