//! Attendance ledger: one stamp per (day, employee, event type), forever.
//!
//! Implementations must make the duplicate check and the insert a single
//! atomic step. Two callers racing on the same triple must end with exactly
//! one stored stamp and one [`LedgerError::AlreadyRecorded`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;

use crate::event_type::EventType;
use crate::types::{DayKey, EmployeeId};

/// Ledger errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The triple already holds a stamp; nothing was written.
    #[error("{event_type} already recorded for employee {employee_id} on {day}")]
    AlreadyRecorded {
        employee_id: EmployeeId,
        day: DayKey,
        event_type: EventType,
    },
    /// The underlying store failed to read or write.
    #[error("ledger storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// One day of an employee's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRecord {
    pub day: DayKey,
    pub entrance: Option<String>,
    pub exit: Option<String>,
}

impl DayRecord {
    pub const fn new(day: DayKey) -> Self {
        Self {
            day,
            entrance: None,
            exit: None,
        }
    }

    pub fn set(&mut self, event_type: EventType, stamp: String) {
        match event_type {
            EventType::Entrance => self.entrance = Some(stamp),
            EventType::Exit => self.exit = Some(stamp),
        }
    }

    pub fn get(&self, event_type: EventType) -> Option<&str> {
        match event_type {
            EventType::Entrance => self.entrance.as_deref(),
            EventType::Exit => self.exit.as_deref(),
        }
    }
}

/// Folds `(day, event_type, stamp)` rows into per-day records, most recent
/// day first.
pub fn fold_history(rows: impl IntoIterator<Item = (DayKey, EventType, String)>) -> Vec<DayRecord> {
    let mut days: BTreeMap<DayKey, DayRecord> = BTreeMap::new();
    for (day, event_type, stamp) in rows {
        days.entry(day)
            .or_insert_with(|| DayRecord::new(day))
            .set(event_type, stamp);
    }
    days.into_values().rev().collect()
}

/// Durable store of attendance stamps.
pub trait Ledger {
    /// True iff a stamp exists for the triple. Absence is never an error.
    fn has(
        &self,
        employee_id: &EmployeeId,
        day: &DayKey,
        event_type: EventType,
    ) -> Result<bool, LedgerError>;

    /// Stores `stamp` unless the triple already holds one.
    fn record(
        &self,
        employee_id: &EmployeeId,
        day: &DayKey,
        event_type: EventType,
        stamp: &str,
    ) -> Result<(), LedgerError>;

    /// Snapshot of the employee's history, most recent day first.
    fn history_for(&self, employee_id: &EmployeeId) -> Result<Vec<DayRecord>, LedgerError>;
}

impl<L: Ledger + ?Sized> Ledger for &L {
    fn has(
        &self,
        employee_id: &EmployeeId,
        day: &DayKey,
        event_type: EventType,
    ) -> Result<bool, LedgerError> {
        (**self).has(employee_id, day, event_type)
    }

    fn record(
        &self,
        employee_id: &EmployeeId,
        day: &DayKey,
        event_type: EventType,
        stamp: &str,
    ) -> Result<(), LedgerError> {
        (**self).record(employee_id, day, event_type, stamp)
    }

    fn history_for(&self, employee_id: &EmployeeId) -> Result<Vec<DayRecord>, LedgerError> {
        (**self).history_for(employee_id)
    }
}

impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    fn has(
        &self,
        employee_id: &EmployeeId,
        day: &DayKey,
        event_type: EventType,
    ) -> Result<bool, LedgerError> {
        (**self).has(employee_id, day, event_type)
    }

    fn record(
        &self,
        employee_id: &EmployeeId,
        day: &DayKey,
        event_type: EventType,
        stamp: &str,
    ) -> Result<(), LedgerError> {
        (**self).record(employee_id, day, event_type, stamp)
    }

    fn history_for(&self, employee_id: &EmployeeId) -> Result<Vec<DayRecord>, LedgerError> {
        (**self).history_for(employee_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct LedgerKey {
    day: DayKey,
    employee_id: EmployeeId,
    event_type: EventType,
}

/// In-process ledger keyed by the composite (day, employee, event type).
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Mutex<BTreeMap<LedgerKey, String>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<LedgerKey, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Ledger for MemoryLedger {
    fn has(
        &self,
        employee_id: &EmployeeId,
        day: &DayKey,
        event_type: EventType,
    ) -> Result<bool, LedgerError> {
        let key = LedgerKey {
            day: *day,
            employee_id: employee_id.clone(),
            event_type,
        };
        Ok(self.lock().contains_key(&key))
    }

    fn record(
        &self,
        employee_id: &EmployeeId,
        day: &DayKey,
        event_type: EventType,
        stamp: &str,
    ) -> Result<(), LedgerError> {
        let key = LedgerKey {
            day: *day,
            employee_id: employee_id.clone(),
            event_type,
        };
        let mut entries = self.lock();
        if entries.contains_key(&key) {
            return Err(LedgerError::AlreadyRecorded {
                employee_id: key.employee_id,
                day: key.day,
                event_type,
            });
        }
        entries.insert(key, stamp.to_string());
        Ok(())
    }

    fn history_for(&self, employee_id: &EmployeeId) -> Result<Vec<DayRecord>, LedgerError> {
        let entries = self.lock();
        let rows = entries
            .iter()
            .filter(|(key, _)| &key.employee_id == employee_id)
            .map(|(key, stamp)| (key.day, key.event_type, stamp.clone()));
        Ok(fold_history(rows))
    }
}
