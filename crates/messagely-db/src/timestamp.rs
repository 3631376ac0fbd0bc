use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};

/// Fixed-width RFC 3339 so that text order matches time order.
/// Every timestamp written by this crate goes through here.
pub fn format(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| anyhow::anyhow!("Invalid timestamp '{}': {}", raw, e))
}
