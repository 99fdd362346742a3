//! Lenient timestamp ingestion.
//!
//! The scheduling service is not consistent about how it writes dates:
//! RFC 3339 with an offset, naive ISO-8601 date-times, bare `YYYY-MM-DD`
//! dates, occasionally `null`. Everything is normalized to `DateTime<Utc>`
//! here; anything unrecognizable becomes `None` so that downstream code
//! treats the topic as unscheduled instead of failing.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use tracing::debug;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a wire timestamp.
///
/// - RFC 3339 keeps its offset.
/// - Naive date-times are read as local wall-clock time.
/// - Bare dates are UTC midnight.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|midnight| Utc.from_utc_datetime(&midnight));
    }

    debug!(raw, "Unrecognized timestamp, treating as absent");
    None
}

/// Serde adapter for optional timestamps that never fails.
///
/// Strings go through [`parse_timestamp`], integers are epoch milliseconds,
/// everything else is `None`.
pub fn lenient<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(raw)) => parse_timestamp(&raw),
        Some(serde_json::Value::Number(millis)) => {
            millis.as_i64().and_then(DateTime::from_timestamp_millis)
        }
        _ => None,
    })
}
