//! Fixed employee schedules and the registration tolerance.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::ValidationError;

/// Parses a schedule time written as `HH:MM` (or `HH:MM:SS`).
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, ValidationError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTimeOfDay {
            value: value.to_string(),
        })
}

/// Whole minutes since midnight. Seconds are ignored.
pub fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// An employee's fixed daily schedule, in the civil time of the fixed zone.
///
/// The two times are not required to be ordered; an exit earlier than the
/// entrance is accepted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(with = "hhmm")]
    pub entrance: NaiveTime,
    #[serde(with = "hhmm")]
    pub exit: NaiveTime,
}

impl Schedule {
    /// Builds a schedule from two `HH:MM` strings.
    pub fn parse(entrance: &str, exit: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            entrance: parse_time_of_day(entrance)?,
            exit: parse_time_of_day(exit)?,
        })
    }
}

/// Grace period, in whole minutes, after a scheduled time during which
/// registration stays open.
///
/// A tolerance of zero shrinks each window to the exact scheduled instant,
/// which at second granularity is practically never hit. Evaluation does not
/// treat it specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tolerance(u32);

impl Tolerance {
    pub const DEFAULT_MINUTES: u32 = 30;

    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    pub const fn minutes(self) -> u32 {
        self.0
    }

    /// True when registration is effectively disabled.
    pub const fn is_disabled(self) -> bool {
        self.0 == 0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(Self::DEFAULT_MINUTES)
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} min", self.0)
    }
}

/// Serde adapter rendering a `NaiveTime` as `HH:MM`.
pub mod hhmm {
    use super::{Deserialize, Deserializer, NaiveTime, Serializer, parse_time_of_day};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_time_of_day(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hh_mm_and_ignores_seconds_for_minutes() {
        let t = parse_time_of_day("17:00").unwrap();
        assert_eq!(minutes_since_midnight(t), 1020);

        let t = parse_time_of_day("08:30:45").unwrap();
        assert_eq!(minutes_since_midnight(t), 510);
    }

    #[test]
    fn rejects_malformed_times() {
        assert!(parse_time_of_day("25:00").is_err());
        assert!(parse_time_of_day("noon").is_err());
        assert!(parse_time_of_day("").is_err());
    }

    #[test]
    fn schedule_allows_exit_before_entrance() {
        let schedule = Schedule::parse("22:00", "06:00").unwrap();
        assert!(schedule.exit < schedule.entrance);
    }

    #[test]
    fn schedule_serde_uses_hh_mm() {
        let schedule = Schedule::parse("09:00", "18:00").unwrap();
        let json = serde_json::to_string(&schedule).unwrap();
        assert_eq!(json, r#"{"entrance":"09:00","exit":"18:00"}"#);
        let parsed: Schedule = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, schedule);
    }

    #[test]
    fn tolerance_defaults_to_thirty_minutes() {
        assert_eq!(Tolerance::default().minutes(), 30);
        assert!(!Tolerance::default().is_disabled());
        assert!(Tolerance::from_minutes(0).is_disabled());
        assert_eq!(Tolerance::default().to_string(), "+30 min");
    }
}
