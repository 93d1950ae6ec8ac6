use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{AppError, AppResult};

const SECONDS_PER_DAY: i64 = 86_400;

/// Canonical storage format: UTC, whole seconds, `Z` suffix.
///
/// Every stored timestamp uses this shape so that SQL string comparison
/// orders them chronologically.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| AppError::validation(format!("invalid timestamp '{raw}': {err}")))
}

pub fn normalize_timestamp(raw: &str) -> AppResult<String> {
    parse_timestamp(raw).map(format_timestamp)
}

/// Whole days elapsed from `earlier` to `now`, rounded toward negative infinity.
pub fn days_since(earlier: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - earlier).num_seconds().div_euclid(SECONDS_PER_DAY)
}
