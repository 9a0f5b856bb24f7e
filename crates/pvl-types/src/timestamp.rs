use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Record creation time, UTC, with microsecond precision.
///
/// The textual form is RFC 3339 with exactly six fractional digits and a `Z`
/// suffix (`2026-10-17T08:30:00.123456Z`). That text is part of every record
/// digest, so the value is truncated to microseconds on construction and the
/// text round-trips exactly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current wall-clock time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Wrap an existing instant, dropping sub-microsecond precision.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.trunc_subsecs(6))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// The exact string hashed into record digests.
    pub fn to_canonical_string(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl FromStr for Timestamp {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = DateTime::parse_from_rfc3339(s).map_err(|e| TypeError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_datetime(parsed.with_timezone(&Utc)))
    }
}

impl TryFrom<String> for Timestamp {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.to_canonical_string()
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.to_canonical_string())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn canonical_string_has_six_fraction_digits() {
        let at = Utc.with_ymd_and_hms(2026, 10, 17, 8, 30, 0).unwrap();
        let ts = Timestamp::from_datetime(at);
        assert_eq!(ts.to_canonical_string(), "2026-10-17T08:30:00.000000Z");
    }

    #[test]
    fn nanoseconds_are_truncated() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let ts = Timestamp::from_datetime(at);
        assert_eq!(ts.as_datetime().timestamp_subsec_nanos(), 123_456_000);
    }

    #[test]
    fn text_roundtrip_is_exact() {
        let ts = Timestamp::now();
        let text = ts.to_canonical_string();
        let parsed: Timestamp = text.parse().unwrap();
        assert_eq!(parsed, ts);
        assert_eq!(parsed.to_canonical_string(), text);
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let parsed: Timestamp = "2026-10-17T10:30:00.5+02:00".parse().unwrap();
        assert_eq!(parsed.to_canonical_string(), "2026-10-17T08:30:00.500000Z");
    }

    #[test]
    fn invalid_text_is_rejected() {
        let err = "yesterday".parse::<Timestamp>().unwrap_err();
        assert!(matches!(err, TypeError::InvalidTimestamp { .. }));
    }

    #[test]
    fn ordering_follows_time() {
        let a: Timestamp = "2026-01-01T00:00:00Z".parse().unwrap();
        let b: Timestamp = "2026-01-01T00:00:00.000001Z".parse().unwrap();
        assert!(a < b);
    }
}
