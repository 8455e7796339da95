//! Timestamp parsing and display helpers shared by the engine and reports.
//!
//! Every timestamp entering the crate goes through [`parse_timestamp`], so all
//! comparisons happen on UTC instants. Values without an offset are taken to
//! already be UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{Error, Result};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Display format for last-visit strings in visit listings.
pub const VISIT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse an ISO 8601 timestamp and normalize it to UTC.
///
/// Accepts RFC 3339 (`Z` or `+hh:mm`), compact offsets (`+hhmm`), naive
/// date-times and bare dates (midnight).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(ts.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(Error::InvalidTimeRange(format!(
        "unparsable timestamp {:?}",
        raw
    )))
}

/// Format a timestamp as ISO 8601 with an explicit `+00:00` offset.
///
/// Whole seconds print without a fraction; anything else prints six
/// fractional digits (`23:59:59.999000+00:00`). Sub-microsecond precision is
/// dropped.
pub fn format_iso(ts: DateTime<Utc>) -> String {
    let format = if ts.timestamp_subsec_micros() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    ts.to_rfc3339_opts(format, false)
}

/// Format a last-visit timestamp for listings (e.g., "2025-02-17 09:30:00").
pub fn format_visit_time(ts: DateTime<Utc>) -> String {
    ts.format(VISIT_TIME_FORMAT).to_string()
}

/// Whole days elapsed between `then` and `now`, rounded toward negative
/// infinity (a visit 1 second in the future is -1 days ago).
pub fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(then)
        .num_seconds()
        .div_euclid(86_400)
}

/// Serde adapter for UTC timestamps stored as ISO 8601 strings.
///
/// Use with `#[serde(with = "crate::format::utc_timestamp")]`, or the
/// [`option`](utc_timestamp::option) submodule for optional fields.
pub mod utc_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_iso(*ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => serializer.serialize_some(&super::super::format_iso(*ts)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            raw.map(|s| super::super::parse_timestamp(&s))
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_zulu_and_naive_agree() {
        let zulu = parse_timestamp("2025-02-17T23:59:59.999Z").unwrap();
        let naive = parse_timestamp("2025-02-17T23:59:59.999").unwrap();
        assert_eq!(zulu, naive);
    }

    #[test]
    fn test_parse_normalizes_offset() {
        let ts = parse_timestamp("2025-02-17T07:00:00+07:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 2, 17, 0, 0, 0).unwrap());

        let compact = parse_timestamp("2025-02-17T07:00:00+0700").unwrap();
        assert_eq!(compact, ts);
    }

    #[test]
    fn test_parse_bare_date() {
        let ts = parse_timestamp("2024-01-31").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_timestamp("    ").unwrap_err();
        assert!(matches!(err, Error::InvalidTimeRange(_)));
        assert!(parse_timestamp("2025-13-01T00:00:00Z").is_err());
    }

    #[test]
    fn test_format_iso() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(format_iso(ts), "2024-01-01T10:00:00+00:00");
    }

    #[test]
    fn test_format_iso_fraction_uses_micros() {
        let ts = parse_timestamp("2025-12-31T23:59:59.999Z").unwrap();
        assert_eq!(format_iso(ts), "2025-12-31T23:59:59.999000+00:00");

        let ts = parse_timestamp("2025-12-31T23:59:59.000000500Z").unwrap();
        assert_eq!(format_iso(ts), "2025-12-31T23:59:59+00:00");
    }

    #[test]
    fn test_days_since_floors() {
        let now = Utc.with_ymd_and_hms(2025, 2, 20, 12, 0, 0).unwrap();
        let then = Utc.with_ymd_and_hms(2025, 2, 17, 18, 0, 0).unwrap();
        assert_eq!(days_since(then, now), 2);

        let future = Utc.with_ymd_and_hms(2025, 2, 20, 12, 0, 1).unwrap();
        assert_eq!(days_since(future, now), -1);
    }

    #[test]
    fn test_format_visit_time() {
        let ts = Utc.with_ymd_and_hms(2025, 2, 17, 9, 30, 0).unwrap();
        assert_eq!(format_visit_time(ts), "2025-02-17 09:30:00");
    }
}
