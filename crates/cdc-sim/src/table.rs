use std::io;

use cdc_core::errors::{CdcError, ErrorInfo};
use csv::{ReaderBuilder, WriterBuilder};
use indexmap::IndexMap;

/// Column table of performance samples.
///
/// Columns are named `f64` vectors of equal length, kept in insertion order.
/// Missing values are NaN, and column-wise reductions skip them, mirroring
/// how heterogeneous sample rows stack during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: IndexMap<String, Vec<f64>>,
}

impl Table {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(name, values)` pairs. All columns must have the
    /// same length.
    pub fn from_columns<S, I>(columns: I) -> Result<Self, CdcError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<f64>)>,
    {
        let mut table = Self::new();
        for (name, values) in columns {
            table.insert_column(name, values)?;
        }
        Ok(table)
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.columns.values().next().map_or(0, Vec::len)
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// True when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// True when a column with this name exists.
    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// The values of a column, if present.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Inserts or overwrites a column. The length must match the existing
    /// rows unless the table has no columns yet.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), CdcError> {
        let name = name.into();
        if !self.columns.is_empty() && values.len() != self.num_rows() {
            return Err(CdcError::Usage(
                ErrorInfo::new("column-length", "column length must match the table")
                    .with_context("column", name)
                    .with_context("expected", self.num_rows().to_string())
                    .with_context("actual", values.len().to_string()),
            ));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Inserts or overwrites a column with a single broadcast value.
    pub fn set_scalar(&mut self, name: impl Into<String>, value: f64) {
        let rows = self.num_rows();
        self.columns.insert(name.into(), vec![value; rows]);
    }

    /// Appends one row. Columns absent from the row are filled with NaN and
    /// new columns are padded with NaN for all prior rows.
    pub fn push_row<'a, I>(&mut self, row: I)
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let prior = self.num_rows();
        for (name, value) in row {
            let column = self
                .columns
                .entry(name.to_string())
                .or_insert_with(|| vec![f64::NAN; prior]);
            column.push(value);
        }
        let total = prior + 1;
        for column in self.columns.values_mut() {
            if column.len() < total {
                column.resize(total, f64::NAN);
            }
        }
    }

    /// Appends all rows of `other`, taking the union of the column sets.
    /// Values absent on either side become NaN.
    pub fn vstack(&mut self, other: &Table) {
        let prior = self.num_rows();
        for (name, values) in &other.columns {
            let column = self
                .columns
                .entry(name.clone())
                .or_insert_with(|| vec![f64::NAN; prior]);
            column.extend_from_slice(values);
        }
        let total = prior + other.num_rows();
        for column in self.columns.values_mut() {
            if column.len() < total {
                column.resize(total, f64::NAN);
            }
        }
    }

    /// Reduces the table to one `(name, mean)` pair per column, skipping NaN
    /// entries. A column with no finite values reduces to NaN.
    pub fn mean_row(&self) -> Vec<(String, f64)> {
        self.columns
            .iter()
            .map(|(name, values)| {
                let mut sum = 0.0;
                let mut count = 0usize;
                for &value in values {
                    if !value.is_nan() {
                        sum += value;
                        count += 1;
                    }
                }
                let mean = if count > 0 { sum / count as f64 } else { f64::NAN };
                (name.clone(), mean)
            })
            .collect()
    }

    /// Writes the table as CSV: an unnamed index column and the named
    /// columns, one record per row.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), CdcError> {
        let mut csv_writer = WriterBuilder::new().from_writer(writer);
        if self.columns.is_empty() {
            return csv_writer
                .flush()
                .map_err(|err| wrap_csv("table-flush", err.into()));
        }
        let header = std::iter::once("").chain(self.columns.keys().map(String::as_str));
        csv_writer
            .write_record(header)
            .map_err(|err| wrap_csv("table-write-header", err))?;
        for row in 0..self.num_rows() {
            let record: Vec<String> = std::iter::once(row.to_string())
                .chain(self.columns.values().map(|values| values[row].to_string()))
                .collect();
            csv_writer
                .write_record(&record)
                .map_err(|err| wrap_csv("table-write-row", err))?;
        }
        csv_writer
            .flush()
            .map_err(|err| wrap_csv("table-flush", err.into()))?;
        Ok(())
    }

    /// Reads a table from CSV. A leading unnamed index column (as written by
    /// some tabular tools) is skipped; empty fields parse as NaN.
    pub fn read_csv<R: io::Read>(reader: R) -> Result<Self, CdcError> {
        let mut csv_reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|err| wrap_csv("table-read-header", err))?
            .clone();
        let skip_index = headers.get(0) == Some("");
        let first = usize::from(skip_index);
        let names: Vec<String> = headers.iter().skip(first).map(str::to_string).collect();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
        for record in csv_reader.records() {
            let record = record.map_err(|err| wrap_csv("table-read-row", err))?;
            for (column, field) in columns.iter_mut().zip(record.iter().skip(first)) {
                let value = if field.is_empty() {
                    f64::NAN
                } else {
                    field.parse::<f64>().map_err(|err| {
                        CdcError::Cache(
                            ErrorInfo::new("table-parse", "non-numeric field in table")
                                .with_context("field", field)
                                .with_hint(err.to_string()),
                        )
                    })?
                };
                column.push(value);
            }
        }
        let mut table = Self::new();
        for (name, values) in names.into_iter().zip(columns) {
            table.insert_column(name, values)?;
        }
        Ok(table)
    }
}

fn wrap_csv(code: &str, err: csv::Error) -> CdcError {
    CdcError::Cache(ErrorInfo::new(code, "CSV table failure").with_hint(err.to_string()))
}
