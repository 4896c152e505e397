//! CSV persistence for [`Table`] values.
//!
//! Reading produces a raw table (every cell `Str`); typing is the schema
//! normalizer's job. Writing renders dates as `YYYY-MM-DD` and `Null` as an
//! empty field, so a written table reads back into the same content after
//! normalization.

use std::{fs::File, io::Read, path::Path};

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};

use super::{Table, Value};

/// Read a CSV file into a raw table. The first record is the header row.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let file = File::open(&path)
        .with_context(|| format!("opening CSV file {}", path.as_ref().display()))?;
    read_table_from(file)
        .with_context(|| format!("reading CSV file {}", path.as_ref().display()))
}

/// Read CSV content from any reader into a raw table.
pub fn read_table_from<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = Table::new(headers);
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        let row: Vec<Value> = record
            .iter()
            .map(|field| Value::Str(field.to_string()))
            .collect();
        table
            .push_row(row)
            .with_context(|| format!("CSV record {} has the wrong field count", idx))?;
    }
    Ok(table)
}

/// Write a table to a CSV file, creating parent directories as needed.
pub fn write_table<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
    }

    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating CSV file {}", path.display()))?;
    wtr.write_record(&table.headers)
        .context("writing CSV header row")?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(format_value))
            .context("writing CSV record")?;
    }
    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Num(n) => n.to_string(),
        Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        Value::Null => String::new(),
    }
}
