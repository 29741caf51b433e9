//! Employees command listing the configured directory.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use ponto_core::Roster;

#[derive(Debug, Args)]
pub struct EmployeesArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, roster: &Roster, args: &EmployeesArgs) -> Result<()> {
    let employees = roster.summaries();

    if args.json {
        serde_json::to_writer_pretty(&mut *writer, &employees)?;
        writeln!(writer)?;
        return Ok(());
    }

    if employees.is_empty() {
        writeln!(
            writer,
            "No employees configured. Add [[employees]] entries to the config file."
        )?;
        return Ok(());
    }

    writeln!(writer, "{:<8} {:<24} {:<9} EXIT", "ID", "NAME", "ENTRANCE")?;
    for employee in &employees {
        writeln!(
            writer,
            "{:<8} {:<24} {:<9} {}",
            employee.id.as_str(),
            employee.name,
            employee.schedule.entrance.format("%H:%M").to_string(),
            employee.schedule.exit.format("%H:%M")
        )?;
    }

    Ok(())
}
