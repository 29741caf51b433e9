//! Core attendance logic.
//!
//! This crate contains the rules for check-in registration:
//! - Clock: the current instant read in one fixed civil timezone
//! - Window evaluation: which event a schedule admits at a given minute
//! - Ledger: at most one stamp per employee, day and event type
//! - Registration: the use case tying the three together

pub mod clock;
pub mod directory;
pub mod event_type;
pub mod ledger;
mod registration;
pub mod schedule;
pub mod types;
mod window;

pub use clock::{CivilClock, CivilZone, Clock, ClockReading, FixedClock, SystemClock};
pub use directory::{AuthError, Directory, EmployeeRecord, EmployeeSummary, Roster, Session};
pub use event_type::{EventType, UnknownEventType};
pub use ledger::{DayRecord, Ledger, LedgerError, MemoryLedger};
pub use registration::{
    Registrar, RegistrationError, RegistrationOutcome, RejectionReason, WindowStatus,
};
pub use schedule::{Schedule, Tolerance};
pub use types::{DayKey, EmployeeId, ValidationError};
pub use window::{Evaluation, evaluate};
