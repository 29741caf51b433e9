//! Employee directory and authenticated sessions.
//!
//! Login happens here and only here. The attendance core receives a
//! [`Session`] and never sees a password.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::Schedule;
use crate::types::EmployeeId;

/// Authentication failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown badge number or wrong password. The two are not distinguished.
    #[error("invalid badge number or password")]
    InvalidCredentials,
}

/// An authenticated employee, valid for the lifetime of one login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub employee_id: EmployeeId,
    pub name: String,
    pub schedule: Schedule,
}

/// Looks employees up by badge number and password.
pub trait Directory {
    fn authenticate(&self, employee_id: &str, password: &str) -> Result<Session, AuthError>;
}

/// A directory entry as written in configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub password: String,
    pub name: String,
    #[serde(flatten)]
    pub schedule: Schedule,
}

impl fmt::Debug for EmployeeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmployeeRecord")
            .field("id", &self.id)
            .field("password", &"[redacted]")
            .field("name", &self.name)
            .field("schedule", &self.schedule)
            .finish()
    }
}

/// Public view of a roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeSummary {
    pub id: EmployeeId,
    pub name: String,
    pub schedule: Schedule,
}

/// Fixed in-memory directory.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    employees: HashMap<EmployeeId, EmployeeRecord>,
}

impl Roster {
    /// Builds a roster; a later record with the same ID replaces an earlier one.
    pub fn new(records: impl IntoIterator<Item = EmployeeRecord>) -> Self {
        let employees = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self { employees }
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    /// Lists employees ordered by ID, without credentials.
    pub fn summaries(&self) -> Vec<EmployeeSummary> {
        let mut summaries: Vec<EmployeeSummary> = self
            .employees
            .values()
            .map(|record| EmployeeSummary {
                id: record.id.clone(),
                name: record.name.clone(),
                schedule: record.schedule,
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }
}

impl Directory for Roster {
    fn authenticate(&self, employee_id: &str, password: &str) -> Result<Session, AuthError> {
        let id = EmployeeId::new(employee_id).map_err(|_| AuthError::InvalidCredentials)?;
        let record = self
            .employees
            .get(&id)
            .filter(|record| record.password == password.trim())
            .ok_or(AuthError::InvalidCredentials)?;
        tracing::debug!(employee_id = %record.id, "employee authenticated");
        Ok(Session {
            employee_id: record.id.clone(),
            name: record.name.clone(),
            schedule: record.schedule,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new([
            EmployeeRecord {
                id: EmployeeId::new("01").unwrap(),
                password: "123456".to_string(),
                name: "Fulano da Silva".to_string(),
                schedule: Schedule::parse("08:00", "17:00").unwrap(),
            },
            EmployeeRecord {
                id: EmployeeId::new("02").unwrap(),
                password: "abcdef".to_string(),
                name: "Maria Oliveira".to_string(),
                schedule: Schedule::parse("09:00", "18:00").unwrap(),
            },
        ])
    }

    #[test]
    fn valid_credentials_open_a_session() {
        let session = roster().authenticate(" 02 ", "abcdef").unwrap();
        assert_eq!(session.employee_id.as_str(), "02");
        assert_eq!(session.name, "Maria Oliveira");
        assert_eq!(session.schedule, Schedule::parse("09:00", "18:00").unwrap());
    }

    #[test]
    fn wrong_password_and_unknown_badge_look_the_same() {
        let roster = roster();
        assert_eq!(
            roster.authenticate("01", "wrong"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            roster.authenticate("99", "123456"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            roster.authenticate("", "123456"),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn summaries_are_sorted_and_omit_passwords() {
        let summaries = roster().summaries();
        let ids: Vec<&str> = summaries.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["01", "02"]);
        let json = serde_json::to_string(&summaries).unwrap();
        assert!(!json.contains("123456"));
    }

    #[test]
    fn debug_redacts_password() {
        let record = roster().employees.remove(&EmployeeId::new("01").unwrap()).unwrap();
        let debug = format!("{record:?}");
        assert!(debug.contains("[redacted]"));
        assert!(!debug.contains("123456"));
    }

    #[test]
    fn record_deserializes_with_flat_schedule() {
        let record: EmployeeRecord = serde_json::from_str(
            r#"{"id":"03","password":"pw","name":"Ana","entrance":"07:30","exit":"16:30"}"#,
        )
        .unwrap();
        assert_eq!(record.schedule, Schedule::parse("07:30", "16:30").unwrap());
    }
}
