//! Registration use case: clock → window → ledger.

use chrono::NaiveTime;
use serde::Serialize;
use thiserror::Error;

use crate::clock::{CivilClock, Clock, ClockReading};
use crate::directory::Session;
use crate::event_type::EventType;
use crate::ledger::{DayRecord, Ledger, LedgerError};
use crate::schedule::Tolerance;
use crate::types::DayKey;
use crate::window::{Evaluation, evaluate};

/// Errors that abort a registration attempt without committing anything.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The ledger could not be read or written. Safe to retry.
    #[error(transparent)]
    Storage(#[from] LedgerError),
}

/// Why an attempt was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    OutsideWindow,
    AlreadyRecordedToday,
}

/// Result of one registration attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    Accepted {
        event_type: EventType,
        day: DayKey,
        stamp: String,
    },
    Rejected {
        reason: RejectionReason,
        event_type: EventType,
        #[serde(with = "crate::schedule::hhmm")]
        reference_time: NaiveTime,
    },
}

impl RegistrationOutcome {
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// What the check-in screen shows: the current window and whether it is
/// still usable today.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowStatus {
    pub now: String,
    pub day: DayKey,
    pub tolerance: Tolerance,
    pub evaluation: Evaluation,
    pub already_recorded: bool,
}

impl WindowStatus {
    pub const fn can_register(&self) -> bool {
        self.evaluation.admissible && !self.already_recorded
    }
}

/// Orchestrates one clock, one ledger and the configured tolerance.
#[derive(Debug)]
pub struct Registrar<C, L> {
    clock: CivilClock<C>,
    ledger: L,
    tolerance: Tolerance,
}

impl<C: Clock, L: Ledger> Registrar<C, L> {
    pub const fn new(clock: CivilClock<C>, ledger: L, tolerance: Tolerance) -> Self {
        Self {
            clock,
            ledger,
            tolerance,
        }
    }

    pub const fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    fn evaluate_at(&self, session: &Session, reading: &ClockReading) -> Evaluation {
        evaluate(&session.schedule, self.tolerance, reading.minutes_of_day())
    }

    /// Current window for the session, without side effects.
    pub fn status(&self, session: &Session) -> Result<WindowStatus, RegistrationError> {
        let reading = self.clock.now();
        let evaluation = self.evaluate_at(session, &reading);
        let day = reading.day_key();
        let already_recorded = self
            .ledger
            .has(&session.employee_id, &day, evaluation.event_type)?;
        Ok(WindowStatus {
            now: self.clock.stamp(&reading),
            day,
            tolerance: self.tolerance,
            evaluation,
            already_recorded,
        })
    }

    /// Tries to register the event the current window admits.
    ///
    /// The clock is read once; the window, the day key and the stamp all come
    /// from that single reading.
    pub fn attempt(&self, session: &Session) -> Result<RegistrationOutcome, RegistrationError> {
        let reading = self.clock.now();
        let evaluation = self.evaluate_at(session, &reading);
        let employee_id = &session.employee_id;

        if !evaluation.admissible {
            tracing::info!(
                %employee_id,
                next = %evaluation.event_type,
                now = %reading.label,
                "registration outside tolerance window"
            );
            return Ok(RegistrationOutcome::Rejected {
                reason: RejectionReason::OutsideWindow,
                event_type: evaluation.event_type,
                reference_time: evaluation.reference_time,
            });
        }

        let day = reading.day_key();
        let already_recorded = RegistrationOutcome::Rejected {
            reason: RejectionReason::AlreadyRecordedToday,
            event_type: evaluation.event_type,
            reference_time: evaluation.reference_time,
        };
        if self.ledger.has(employee_id, &day, evaluation.event_type)? {
            tracing::info!(%employee_id, %day, event_type = %evaluation.event_type, "already registered today");
            return Ok(already_recorded);
        }

        let stamp = self.clock.stamp(&reading);
        match self
            .ledger
            .record(employee_id, &day, evaluation.event_type, &stamp)
        {
            Ok(()) => {
                tracing::info!(%employee_id, %day, event_type = %evaluation.event_type, %stamp, "registration accepted");
                Ok(RegistrationOutcome::Accepted {
                    event_type: evaluation.event_type,
                    day,
                    stamp,
                })
            }
            Err(LedgerError::AlreadyRecorded { .. }) => {
                tracing::info!(%employee_id, %day, event_type = %evaluation.event_type, "lost registration race");
                Ok(already_recorded)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The session's attendance history, most recent day first.
    pub fn history(&self, session: &Session) -> Result<Vec<DayRecord>, RegistrationError> {
        Ok(self.ledger.history_for(&session.employee_id)?)
    }
}
