/*! In-memory CSV manifest.

A [Table] keeps the header and every cell as the verbatim string found on disk,
so that annotation columns survive a split or merge untouched.
Tables with different schemas can be concatenated: the resulting header is the union
of the input headers (first-seen order), and missing cells are left empty.
!*/
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Read};
use std::path::Path;

use itertools::Itertools;
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use tempfile::NamedTempFile;

use crate::error::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Read a table from a CSV file with a header row.
    ///
    /// A zero-byte file gives a table without headers nor rows.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let reader = csv::ReaderBuilder::new().from_path(path)?;
        Self::from_csv(reader)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let reader = csv::ReaderBuilder::new().from_reader(reader);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, Error> {
        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(String::from).collect());
        }
        Ok(Self { headers, rows })
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

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of column `name`, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// Get a single cell.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| r[idx].as_str())
    }

    /// Append a row. It is padded with empty cells (or truncated) to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Overwrite column `name` with `values`, appending the column if it does not exist yet.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<(), Error> {
        if values.len() != self.rows.len() {
            return Err(Error::InvalidArgument(format!(
                "column {name} has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Rewrite every value of column `name` in place.
    /// Returns `false` (and leaves the table untouched) if the column does not exist.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> bool
    where
        F: FnMut(&str) -> String,
    {
        match self.column_index(name) {
            Some(idx) => {
                for row in self.rows.iter_mut() {
                    row[idx] = f(&row[idx]);
                }
                true
            }
            None => false,
        }
    }

    /// Keep only the rows for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.rows.shuffle(rng);
    }

    /// Concatenate tables over the union of their headers.
    pub fn concat<I>(tables: I) -> Table
    where
        I: IntoIterator<Item = Table>,
    {
        let tables: Vec<Table> = tables.into_iter().collect();
        let headers: Vec<String> = tables
            .iter()
            .flat_map(|t| t.headers.iter())
            .unique()
            .cloned()
            .collect();

        let nb_rows = tables.iter().map(Table::len).sum();
        let mut rows: Vec<Vec<String>> = Vec::with_capacity(nb_rows);

        for table in tables {
            let positions: HashMap<&str, usize> = table
                .headers
                .iter()
                .enumerate()
                .map(|(idx, h)| (h.as_str(), idx))
                .collect();
            let mapping: Vec<Option<usize>> = headers
                .iter()
                .map(|h| positions.get(h.as_str()).copied())
                .collect();

            for row in &table.rows {
                rows.push(
                    mapping
                        .iter()
                        .map(|&idx| idx.map(|i| row[i].clone()).unwrap_or_default())
                        .collect(),
                );
            }
        }

        Table { headers, rows }
    }

    /// Write the table as CSV (header row, no index column).
    ///
    /// The content goes to a temporary file in the destination folder which is then renamed
    /// over `path`, so a failure never leaves a truncated file behind.
    pub fn write_atomic(&self, path: &Path) -> Result<(), Error> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            writer.write_record(&self.headers)?;
            for row in &self.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        tmp.persist(path)?;

        debug!("wrote {} rows to {:?}", self.rows.len(), path);
        Ok(())
    }
}

/// Delete a manifest left by a previous run.
///
/// Returns whether a file was removed.
pub fn remove_manifest(path: &Path) -> Result<bool, Error> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!("removed stale manifest {:?}", path);
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
