//! # Temporal Types — UTC-Only Timestamps
//!
//! `Timestamp` stamps every dataset transition and customer upload. It is
//! UTC with a `Z` suffix and truncated to seconds, so two transition logs
//! rendered on different hosts compare byte-for-byte.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_has_no_subseconds() {
        let ts = Timestamp::now();
        assert_eq!(ts.0.nanosecond(), 0);
        assert!(ts.to_iso8601().ends_with('Z'));
        assert_eq!(ts.to_string(), ts.to_iso8601());
    }

    #[test]
    fn truncation_drops_nanoseconds() {
        use chrono::TimeZone;
        let dt = Utc
            .with_ymd_and_hms(2026, 3, 2, 9, 15, 30)
            .unwrap()
            .with_nanosecond(987_000_000)
            .unwrap();
        let ts = Timestamp(truncate_to_seconds(dt));
        assert_eq!(ts.to_iso8601(), "2026-03-02T09:15:30Z");
        assert!(Timestamp(truncate_to_seconds(dt)) <= Timestamp::now());
    }
}
