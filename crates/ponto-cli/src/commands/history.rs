//! History command listing an employee's stamps per day.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use ponto_core::{Clock, Ledger, Registrar, Session};

use super::util::LoginArgs;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub login: LoginArgs,

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
    let history = registrar.history(session)?;

    if json {
        serde_json::to_writer_pretty(&mut *writer, &history)?;
        writeln!(writer)?;
        return Ok(());
    }

    if history.is_empty() {
        writeln!(writer, "No registrations yet.")?;
        return Ok(());
    }

    writeln!(writer, "{:<12} {:<27} EXIT", "DAY", "ENTRANCE")?;
    for day in &history {
        writeln!(
            writer,
            "{:<12} {:<27} {}",
            day.day.to_string(),
            day.entrance.as_deref().unwrap_or("-"),
            day.exit.as_deref().unwrap_or("-")
        )?;
    }

    Ok(())
}
