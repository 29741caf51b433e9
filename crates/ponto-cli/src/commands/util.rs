//! Shared utilities for CLI commands.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;

use ponto_core::{Directory, Session};

/// Badge number and password identifying the employee.
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Badge number.
    #[arg(short, long)]
    pub employee: String,

    /// Password (prefer the environment variable over the flag).
    #[arg(long, env = "PONTO_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl LoginArgs {
    /// Opens a session; bad credentials never reach the attendance core.
    pub fn login(&self, directory: &impl Directory) -> anyhow::Result<Session> {
        Ok(directory.authenticate(&self.employee, &self.password)?)
    }
}

/// Environment variable pinning the clock of debug builds.
pub const TEST_CLOCK_ENV: &str = "PONTO_TEST_CLOCK";

/// Parse an ISO 8601 / RFC 3339 instant, e.g. `2026-10-19T11:15:00Z`.
pub fn parse_instant(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let dt = DateTime::parse_from_rfc3339(s).with_context(|| {
        format!("invalid instant {s}, expected RFC 3339 (e.g., 2026-10-19T11:15:00Z)")
    })?;
    Ok(dt.with_timezone(&Utc))
}

/// Instant from [`TEST_CLOCK_ENV`], read only when debug assertions are on.
///
/// Release builds always stamp registrations with the system clock.
pub fn test_clock() -> anyhow::Result<Option<DateTime<Utc>>> {
    if !cfg!(debug_assertions) {
        return Ok(None);
    }
    pinned_instant(std::env::var(TEST_CLOCK_ENV).ok().as_deref())
        .with_context(|| format!("invalid {TEST_CLOCK_ENV}"))
}

fn pinned_instant(value: Option<&str>) -> anyhow::Result<Option<DateTime<Utc>>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(parse_instant)
        .transpose()
}
