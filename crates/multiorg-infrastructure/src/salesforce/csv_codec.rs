//! CSV bodies exchanged with Bulk API v2 ingest jobs.

use multiorg_core::bulk::{FailedRecord, TabularData};
use multiorg_core::{MultiorgError, Result};
use std::collections::BTreeMap;

const SF_ID_COLUMN: &str = "sf__Id";
const SF_ERROR_COLUMN: &str = "sf__Error";

fn csv_error(err: impl std::fmt::Display) -> MultiorgError {
    MultiorgError::Serialization {
        format: "CSV".to_string(),
        message: err.to_string(),
    }
}

/// Encodes the upload body (header row + data rows, LF line endings).
pub(crate) fn encode_rows(data: &TabularData) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(data.columns()).map_err(csv_error)?;
    for row in data.rows() {
        writer.write_record(row).map_err(csv_error)?;
    }

    let bytes = writer.into_inner().map_err(csv_error)?;
    String::from_utf8(bytes).map_err(csv_error)
}

/// Decodes a `failedResults` body.
pub(crate) fn decode_failed_records(body: &str) -> Result<Vec<FailedRecord>> {
    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let headers = reader.headers().map_err(csv_error)?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;

        let mut sf_id = None;
        let mut sf_error = String::new();
        let mut fields = BTreeMap::new();
        for (header, value) in headers.iter().zip(row.iter()) {
            match header {
                SF_ID_COLUMN => {
                    if !value.is_empty() {
                        sf_id = Some(value.to_string());
                    }
                }
                SF_ERROR_COLUMN => sf_error = value.to_string(),
                _ => {
                    fields.insert(header.to_string(), value.to_string());
                }
            }
        }

        records.push(FailedRecord {
            sf_id,
            sf_error,
            fields,
        });
    }

    Ok(records)
}
