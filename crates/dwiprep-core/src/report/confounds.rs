//! Named per-volume confound series, read from tab-separated tables.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{DwiprepError, Result};

/// Equal-length numeric columns, in file order. Missing cells are NaN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfoundTable {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl ConfoundTable {
    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> Result<Self> {
        let mut table = Self::default();
        for (name, values) in columns {
            table.push(name.into(), values)?;
        }
        Ok(table)
    }

    fn push(&mut self, name: String, values: Vec<f64>) -> Result<()> {
        if self.names.contains(&name) {
            return Err(DwiprepError::Archive(format!("duplicate confound column '{name}'")));
        }
        if let Some(first) = self.columns.first() {
            if first.len() != values.len() {
                return Err(DwiprepError::Shape(format!(
                    "confound '{name}' has {} rows, expected {}",
                    values.len(),
                    first.len()
                )));
            }
        }
        self.names.push(name);
        self.columns.push(values);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_tsv_reader(file)
            .map_err(|e| DwiprepError::Archive(format!("{}: {e}", path.display())))
    }

    /// Parse a header row followed by numeric rows. `n/a`, `nan` and empty
    /// cells become NaN.
    pub fn from_tsv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_reader(reader);
        let names: Vec<String> = rdr
            .headers()
            .map_err(|e| DwiprepError::Archive(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
        for (row, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| DwiprepError::Archive(e.to_string()))?;
            for (col, cell) in record.iter().enumerate() {
                let value = parse_cell(cell).ok_or_else(|| {
                    DwiprepError::Archive(format!(
                        "row {}, column '{}': '{cell}' is not a number",
                        row + 1,
                        names[col]
                    ))
                })?;
                columns[col].push(value);
            }
        }

        Self::from_columns(names.into_iter().zip(columns).collect())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of rows (volumes); 0 for a table without columns.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("n/a") || cell.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    cell.parse().ok()
}
