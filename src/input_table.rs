use crate::error::ValidationError;
use anyhow::{anyhow, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A tab-separated table with a header row, all values kept as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl InputTable {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| anyhow!("Can not open input file {}: {e}", path.display()))?;
        Self::from_reader(file, &path.display().to_string())
    }

    pub fn from_reader<R: Read>(reader: R, name: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut rows = vec![];
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|v| v.to_string()).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Result<usize, ValidationError> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| ValidationError::MissingColumn {
                column: column.to_string(),
                file: self.name.to_owned(),
            })
    }

    pub fn column(&self, column: &str) -> Result<Vec<&str>, ValidationError> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Replaces every value of `column` by `f(value)`
    pub fn map_column<F: Fn(&str) -> String>(
        &mut self,
        column: &str,
        f: F,
    ) -> Result<(), ValidationError> {
        let idx = self.column_index(column)?;
        self.rows
            .iter_mut()
            .for_each(|row| row[idx] = f(&row[idx]));
        Ok(())
    }
}
