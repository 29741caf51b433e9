//! Export command writing the ledger as a nested JSON blob.
//!
//! The layout is `{ day: { employee: { event_type: stamp } } }`, the same
//! shape the browser check-in page kept in local storage.

use std::io::Write;

use anyhow::Result;

use ponto_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let blob = db.export_blob()?;
    serde_json::to_writer_pretty(&mut *writer, &blob)?;
    writeln!(writer)?;
    Ok(())
}
