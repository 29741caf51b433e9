//! Register command: stamp the entrance or exit the current window admits.

use std::io::Write;

use anyhow::{Result, bail};
use clap::Args;

use ponto_core::{Clock, Ledger, Registrar, RegistrationOutcome, RejectionReason, Session};

use super::util::LoginArgs;

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[command(flatten)]
    pub login: LoginArgs,
}

/// Runs one registration attempt. Rejections are returned as errors so the
/// process exits non-zero.
pub fn run<W: Write, C: Clock, L: Ledger>(
    writer: &mut W,
    registrar: &Registrar<C, L>,
    session: &Session,
) -> Result<()> {
    match registrar.attempt(session)? {
        RegistrationOutcome::Accepted {
            event_type, stamp, ..
        } => {
            writeln!(writer, "{} registered at {stamp}.", event_type.label())?;
            Ok(())
        }
        RegistrationOutcome::Rejected {
            reason: RejectionReason::OutsideWindow,
            event_type,
            reference_time,
        } => bail!(
            "outside the tolerance window (next: {} at {}, tolerance {})",
            event_type.label(),
            reference_time.format("%H:%M"),
            registrar.tolerance()
        ),
        RegistrationOutcome::Rejected {
            reason: RejectionReason::AlreadyRecordedToday,
            event_type,
            ..
        } => bail!("{} already registered today", event_type.label()),
    }
}
