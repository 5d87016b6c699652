//! Decoder for CFS public use file extracts.
//!
//! Accepts the plain CSV, a gzip-compressed CSV, or the zip archive the
//! Census Bureau publishes (first `.csv` member is read).

use anyhow::{Context, Result, anyhow};
use flate2::read::GzDecoder;
use std::io::{Cursor, Read};
use tracing::debug;

use crate::puf::ShipmentRecord;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

/// Container format of a PUF download, detected from its leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Gzip,
    Zip,
}

impl SourceFormat {
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) {
            SourceFormat::Zip
        } else if bytes.starts_with(GZIP_MAGIC) {
            SourceFormat::Gzip
        } else {
            SourceFormat::Csv
        }
    }
}

/// Decodes shipment records from raw bytes.
///
/// # Errors
///
/// Returns an error if decompression fails, a zip archive has no `.csv`
/// member, or a row does not deserialize into a [`ShipmentRecord`].
pub fn parse_records(bytes: &[u8]) -> Result<Vec<ShipmentRecord>> {
    let format = SourceFormat::detect(bytes);
    debug!(?format, bytes = bytes.len(), "Decoding CFS source");

    match format {
        SourceFormat::Csv => read_csv(bytes),
        SourceFormat::Gzip => read_csv(GzDecoder::new(bytes)),
        SourceFormat::Zip => read_csv(Cursor::new(extract_csv(bytes)?)),
    }
}

fn extract_csv(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).context("Invalid zip archive")?;

    for i in 0..archive.len() {
        let mut member = archive.by_index(i)?;
        if !member.name().to_ascii_lowercase().ends_with(".csv") {
            continue;
        }

        debug!(member = member.name(), "Reading CSV member from archive");
        let mut out = Vec::new();
        member.read_to_end(&mut out)?;
        return Ok(out);
    }

    Err(anyhow!("Zip archive contains no .csv member"))
}

fn read_csv<R: Read>(reader: R) -> Result<Vec<ShipmentRecord>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut records = Vec::new();

    for (i, result) in rdr.deserialize().enumerate() {
        // +2: one for the header, one for 1-based numbering
        let record: ShipmentRecord = result.with_context(|| format!("Bad CFS row {}", i + 2))?;
        records.push(record);
    }

    Ok(records)
}
