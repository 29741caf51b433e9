//! Status command showing the current registration window.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;

use ponto_core::{Clock, Ledger, Registrar, Session};

use super::util::{self, LoginArgs};

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub login: LoginArgs,

    /// Show the window at this instant (RFC 3339) instead of now.
    #[arg(long, value_parser = util::parse_instant)]
    pub at: Option<DateTime<Utc>>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write, C: Clock, L: Ledger>(
    writer: &mut W,
    registrar: &Registrar<C, L>,
    session: &Session,
    json: bool,
) -> Result<()> {
    let status = registrar.status(session)?;

    if json {
        serde_json::to_writer(&mut *writer, &status)?;
        writeln!(writer)?;
        return Ok(());
    }

    let evaluation = &status.evaluation;
    let event = evaluation.event_type.label();
    let state = if status.can_register() {
        "Valid period".to_string()
    } else if status.already_recorded && evaluation.admissible {
        format!("{event} already registered today")
    } else {
        "Outside period".to_string()
    };

    writeln!(writer, "{} ({})", session.name, session.employee_id)?;
    writeln!(
        writer,
        "Schedule: entrance {}, exit {}",
        session.schedule.entrance.format("%H:%M"),
        session.schedule.exit.format("%H:%M")
    )?;
    writeln!(writer, "Now:      {}", status.now)?;
    writeln!(writer, "Status:   {state}")?;
    writeln!(
        writer,
        "Period:   {event}, base time {}, tolerance {}",
        evaluation.reference_time.format("%H:%M"),
        status.tolerance
    )?;
    if status.tolerance.is_disabled() {
        writeln!(writer, "Tolerance is zero; registration is practically disabled.")?;
    }
    if status.can_register() {
        writeln!(writer, "Run `ponto register` to register {event} now.")?;
    } else {
        writeln!(writer, "Waiting for a valid window.")?;
    }

    Ok(())
}
