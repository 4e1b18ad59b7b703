use crate::domain::model::{Dataset, Record};
use crate::utils::error::{EtlError, Result};
use std::collections::{HashMap, HashSet};

/// Parses a header row plus data rows. Every value is kept as a string.
pub fn parse_delimited(data: &[u8], delimiter: u8, source: &str) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| EtlError::extract(source, format!("unreadable header row: {}", e)))?
        .clone();

    if headers.is_empty() {
        return Err(EtlError::extract(source, "file is empty (no header row)"));
    }

    let mut columns = Vec::with_capacity(headers.len());
    let mut seen = HashSet::new();
    for name in headers.iter() {
        let name = name.trim();
        if name.is_empty() {
            return Err(EtlError::extract(source, "header contains an empty column name"));
        }
        if !seen.insert(name.to_string()) {
            return Err(EtlError::extract(
                source,
                format!("header contains duplicate column '{}'", name),
            ));
        }
        columns.push(name.to_string());
    }

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row =
            row.map_err(|e| EtlError::extract(source, format!("data row {}: {}", index + 1, e)))?;
        let data: HashMap<String, serde_json::Value> = columns
            .iter()
            .zip(row.iter())
            .map(|(column, value)| (column.clone(), serde_json::Value::String(value.to_string())))
            .collect();
        records.push(Record { data });
    }

    if records.is_empty() {
        return Err(EtlError::extract(source, "file has a header but no data rows"));
    }

    tracing::debug!(
        "Parsed {} rows x {} columns from {}",
        records.len(),
        columns.len(),
        source
    );
    Ok(Dataset::new(columns, records))
}

/// Serializes a dataset as comma-separated text with a header row.
pub fn write_csv(dataset: &Dataset) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&dataset.columns)?;

    for record in &dataset.records {
        writer.write_record(dataset.columns.iter().map(|column| record.text(column)))?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}
