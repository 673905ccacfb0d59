//! CSV output of collected records.

use crate::core::error::Result;
use crate::core::models::Record;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const CSV_HEADERS: [&str; 5] = ["Company Name", "Website", "Email", "Phone", "Address"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes a byte-order mark, the header row and one row per record.
pub fn write_csv<W: Write>(mut writer: W, records: &[Record]) -> Result<()> {
    writer.write_all(UTF8_BOM)?;

    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(CSV_HEADERS)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_csv_file(path: impl AsRef<Path>, records: &[Record]) -> Result<()> {
    let path = path.as_ref();
    tracing::debug!("Writing {} record(s) to {}", records.len(), path.display());
    let file = File::create(path)?;
    write_csv(BufWriter::new(file), records)
}
