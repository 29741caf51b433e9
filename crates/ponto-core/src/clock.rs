//! Clock source: the current instant decomposed into civil fields of one
//! fixed timezone.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Timelike, Utc};

use crate::types::{DayKey, ValidationError};

/// Abstraction over "current instant" so the time source can be injected.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The single civil timezone all attendance arithmetic happens in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CivilZone {
    offset: FixedOffset,
    abbreviation: String,
}

impl CivilZone {
    /// Brasília time, UTC-03:00 year-round.
    pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;
    pub const DEFAULT_ABBREVIATION: &'static str = "BRT";

    pub fn new(offset: FixedOffset, abbreviation: impl Into<String>) -> Self {
        Self {
            offset,
            abbreviation: abbreviation.into(),
        }
    }

    /// Builds a zone from a signed offset east of UTC, in minutes.
    pub fn from_utc_offset_minutes(
        minutes: i32,
        abbreviation: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ValidationError::InvalidUtcOffset { minutes })?;
        Ok(Self::new(offset, abbreviation))
    }

    /// Converts an instant into this zone's civil calendar and clock.
    pub fn reading(&self, instant: DateTime<Utc>) -> ClockReading {
        ClockReading::from_local(instant.with_timezone(&self.offset))
    }
}

impl Default for CivilZone {
    fn default() -> Self {
        Self::from_utc_offset_minutes(
            Self::DEFAULT_UTC_OFFSET_MINUTES,
            Self::DEFAULT_ABBREVIATION,
        )
        .unwrap_or_else(|_| Self::new(Utc.fix(), "UTC"))
    }
}

/// Civil date and time-of-day fields of one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockReading {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// `DD/MM/YYYY HH:MM:SS`
    pub label: String,
    date: NaiveDate,
}

impl ClockReading {
    fn from_local(local: DateTime<FixedOffset>) -> Self {
        Self {
            year: local.year(),
            month: local.month(),
            day: local.day(),
            hour: local.hour(),
            minute: local.minute(),
            second: local.second(),
            label: local.format("%d/%m/%Y %H:%M:%S").to_string(),
            date: local.date_naive(),
        }
    }

    /// Minutes since local midnight, with sub-minute precision from seconds.
    pub fn minutes_of_day(&self) -> f64 {
        f64::from(self.hour * 60 + self.minute) + f64::from(self.second) / 60.0
    }

    pub const fn day_key(&self) -> DayKey {
        DayKey::new(self.date)
    }
}

/// A clock read through the fixed civil timezone.
#[derive(Debug, Clone, Default)]
pub struct CivilClock<C> {
    clock: C,
    zone: CivilZone,
}

impl<C: Clock> CivilClock<C> {
    pub const fn new(clock: C, zone: CivilZone) -> Self {
        Self { clock, zone }
    }

    pub fn now(&self) -> ClockReading {
        self.zone.reading(self.clock.now())
    }

    pub fn now_minutes_of_day(&self) -> f64 {
        self.now().minutes_of_day()
    }

    pub fn today_key(&self) -> DayKey {
        self.now().day_key()
    }

    /// Human-readable stamp stored in the ledger, e.g. `19/10/2026 08:15:00 (BRT)`.
    pub fn stamp(&self, reading: &ClockReading) -> String {
        format!("{} ({})", reading.label, self.zone.abbreviation)
    }
}
