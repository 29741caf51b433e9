//! Import command for ingesting a nested JSON ledger blob.
//!
//! Accepts the layout written by `ponto export` as well as the browser
//! check-in page's stored blob, whose event types are `Entrada`/`Saída`.
//! Stamps already present for a (day, employee, event type) are kept. A blob
//! that labels one event twice, e.g. both `Entrada` and `entrance`, is refused.

use std::io::Read;

use anyhow::{Context, Result};

use ponto_db::{Database, RawLedgerBlob};

pub fn run<R: Read>(reader: R, db: &mut Database) -> Result<usize> {
    let blob: RawLedgerBlob =
        serde_json::from_reader(reader).context("invalid ledger JSON on stdin")?;
    let inserted = db.import_blob(blob).context("failed to import ledger blob")?;
    Ok(inserted)
}
