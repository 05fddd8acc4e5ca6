//! Delimited-file loading into [`RawTable`]s.

use crate::config::SourceConfig;
use crate::error::InputError;
use crate::models::RawTable;
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Read a headed, delimited table. Headers are trimmed; empty cells become `None`.
pub fn read_csv_table<R: Read>(
    label: &str,
    reader: R,
    delimiter: u8,
) -> Result<RawTable, InputError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| malformed(label, &e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(InputError::MissingHeader {
            source_label: label.to_string(),
        });
    }

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for rec in rdr.records() {
        let rec = rec.map_err(|e| malformed(label, &e))?;
        rows.push(
            rec.iter()
                .map(|cell| {
                    if cell.trim().is_empty() {
                        None
                    } else {
                        Some(cell.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawTable {
        label: label.to_string(),
        headers,
        rows,
    })
}

fn malformed(label: &str, e: &csv::Error) -> InputError {
    InputError::Malformed {
        source_label: label.to_string(),
        line: e.position().map(|p| p.line()).unwrap_or(0),
        reason: e.to_string(),
    }
}

/// Load one configured source. A missing `optional` source yields an empty table.
pub fn load_csv_source(src: &SourceConfig) -> Result<RawTable, InputError> {
    let path = Path::new(&src.path);
    if !path.exists() && src.optional {
        log::warn!(
            "Source '{}' not found at {}; continuing with an empty table",
            src.label,
            src.path
        );
        return Ok(RawTable::empty(&src.label));
    }

    let file = File::open(path).map_err(|e| InputError::SourceLoad {
        source_label: src.label.clone(),
        path: src.path.clone(),
        reason: e.to_string(),
    })?;
    let delimiter = u8::try_from(src.delimiter).map_err(|_| InputError::SourceLoad {
        source_label: src.label.clone(),
        path: src.path.clone(),
        reason: format!("delimiter '{}' is not a single byte", src.delimiter),
    })?;

    let table = read_csv_table(&src.label, BufReader::new(file), delimiter)?;
    log::info!(
        "Loaded source '{}' from {}: {} rows, {} columns",
        src.label,
        src.path,
        table.rows.len(),
        table.headers.len()
    );
    Ok(table)
}
