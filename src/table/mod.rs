use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;

pub mod csv;

/// A single cell of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Num(f64),
    Date(NaiveDate),
    /// Explicit "unknown" (incomplete rolling window, division by zero).
    /// Never coerced to zero; serializes to an empty CSV field.
    Null,
}

impl Value {
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// An ordered table: column names plus rows of scalar cells.
///
/// One type serves every pipeline stage: raw tables (all cells `Str`),
/// normalized tables, rolled tables and the combined report. Every row is
/// exactly `headers.len()` wide.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Index of `name`, or a schema error naming the missing column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("missing column '{}'", name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.headers.len() {
            bail!(
                "row width {} does not match {} columns",
                row.len(),
                self.headers.len()
            );
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append one column. The name must be new and `values` must cover every row.
    pub fn with_column(mut self, name: &str, values: Vec<Value>) -> Result<Self> {
        if self.has_column(name) {
            bail!("column '{}' already exists", name);
        }
        if values.len() != self.rows.len() {
            bail!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            );
        }
        self.headers.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(self)
    }

    /// Drop the named columns. Names not present are ignored.
    pub fn drop_columns(self, names: &[&str]) -> Self {
        let keep: Vec<usize> = (0..self.headers.len())
            .filter(|&i| !names.contains(&self.headers[i].as_str()))
            .collect();
        let headers = keep.iter().map(|&i| self.headers[i].clone()).collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Self { headers, rows }
    }

    /// Project to `(source, renamed)` columns, in the given order.
    pub fn select(&self, columns: &[(&str, &str)]) -> Result<Self> {
        let indices = columns
            .iter()
            .map(|(source, _)| self.column_index(source))
            .collect::<Result<Vec<_>>>()?;
        let headers = columns.iter().map(|(_, name)| name.to_string()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Self { headers, rows })
    }

    /// Rows whose string cell in `column` equals `value`, order preserved.
    pub fn filter_str_eq(&self, column: &str, value: &str) -> Result<Self> {
        let idx = self.column_index(column)?;
        let rows = self
            .rows
            .iter()
            .filter(|row| row[idx].as_str() == Some(value))
            .cloned()
            .collect();
        Ok(Self {
            headers: self.headers.clone(),
            rows,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table {
            headers: vec!["county".into(), "cases".into()],
            rows: vec![
                vec![Value::Str("Oakland".into()), Value::Num(3.0)],
                vec![Value::Str("Wayne".into()), Value::Num(5.0)],
            ],
        }
    }

    #[test]
    fn column_index_reports_missing_column() {
        let t = sample();
        assert_eq!(t.column_index("cases").unwrap(), 1);
        let err = t.column_index("deaths").unwrap_err();
        assert!(err.to_string().contains("deaths"));
    }

    #[test]
    fn with_column_appends_and_rejects_bad_shapes() -> Result<()> {
        let t = sample().with_column("deaths", vec![Value::Num(1.0), Value::Null])?;
        assert_eq!(t.headers, vec!["county", "cases", "deaths"]);
        assert_eq!(t.rows[1][2], Value::Null);

        assert!(t.clone().with_column("deaths", vec![]).is_err());
        assert!(t.with_column("short", vec![Value::Num(1.0)]).is_err());
        Ok(())
    }

    #[test]
    fn drop_columns_ignores_absent_names() {
        let t = sample().drop_columns(&["cases", "updated"]);
        assert_eq!(t.headers, vec!["county"]);
        assert_eq!(t.rows[0].len(), 1);
    }

    #[test]
    fn select_projects_and_renames() -> Result<()> {
        let t = sample().select(&[("cases", "cases_total"), ("county", "county")])?;
        assert_eq!(t.headers, vec!["cases_total", "county"]);
        assert_eq!(t.rows[0][0], Value::Num(3.0));
        Ok(())
    }

    #[test]
    fn filter_str_eq_keeps_matching_rows() -> Result<()> {
        let t = sample().filter_str_eq("county", "Wayne")?;
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.rows[0][1], Value::Num(5.0));
        Ok(())
    }
}
