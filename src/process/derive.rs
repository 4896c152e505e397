//! Metric deriver: append one column computed by a pure rule over existing
//! canonical columns. Existing columns are never mutated or removed.

use anyhow::{Context, Result};

use crate::table::{Table, Value};

/// Append `name`, computed per row by `rule` from the named input columns.
pub fn with_derived_column<F>(table: Table, name: &str, inputs: &[&str], rule: F) -> Result<Table>
where
    F: Fn(&[&Value]) -> Value,
{
    let indices = inputs
        .iter()
        .map(|col| table.column_index(col))
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("deriving column '{}'", name))?;

    let values = table
        .rows
        .iter()
        .map(|row| {
            let args: Vec<&Value> = indices.iter().map(|&i| &row[i]).collect();
            rule(&args)
        })
        .collect();
    table.with_column(name, values)
}

/// `positive_rate = positive / total`. A zero or unknown denominator yields
/// `Null` ("rate unknown for that date"), not an error and never zero.
pub fn positive_rate(table: Table) -> Result<Table> {
    with_derived_column(table, "positive_rate", &["positive", "total"], |args| {
        match (args[0].as_num(), args[1].as_num()) {
            (Some(positive), Some(total)) if total != 0.0 => Value::Num(positive / total),
            _ => Value::Null,
        }
    })
}
