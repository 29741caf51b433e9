//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{employees, history, register, status};

/// Attendance check-in.
///
/// Registers an employee's entrance and exit once per day, inside a
/// tolerance window after their fixed schedule.
#[derive(Debug, Parser)]
#[command(name = "ponto", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the current registration window for an employee.
    Status(status::StatusArgs),

    /// Register the entrance or exit the current window admits.
    Register(register::RegisterArgs),

    /// Show an employee's registrations, most recent day first.
    History(history::HistoryArgs),

    /// List the configured employees and their schedules.
    Employees(employees::EmployeesArgs),

    /// Write the whole ledger to stdout as nested JSON (day, employee, event type).
    Export,

    /// Read a nested JSON ledger from stdin, keeping stamps already stored.
    Import,
}
