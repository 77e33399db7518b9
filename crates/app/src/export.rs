//! CSV export of the ledger.

use std::io::Write;

use csv::Writer;
use engine::SpendEvent;
use serde::Serialize;

use crate::error::Result;

#[derive(Serialize)]
struct ExportRow<'a> {
    id: String,
    date: String,
    category: &'a str,
    amount: String,
    description: &'a str,
    payment_method: &'a str,
    created_at: String,
}

/// Writes one row per event, in ledger order, and returns the row count.
pub fn write_csv<W: Write>(events: &[SpendEvent], out: W) -> Result<usize> {
    let mut writer = Writer::from_writer(out);
    for event in events {
        writer.serialize(ExportRow {
            id: event.id.to_string(),
            date: event.date.to_string(),
            category: &event.category,
            amount: event.amount_minor.to_string(),
            description: &event.description,
            payment_method: &event.payment_method,
            created_at: event.created_at.to_rfc3339(),
        })?;
    }
    writer.flush()?;
    Ok(events.len())
}
