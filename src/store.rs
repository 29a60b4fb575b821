// src/store.rs
use std::{fs, path::Path};

use crate::csv::{parse_rows, split_header};
use crate::error::{Error, Result};

/// Headers + rows, the shape every table in the pipeline is passed around in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataSet {
    pub headers: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl DataSet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers: Some(headers), rows }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.as_ref()?.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str, path: &Path) -> Result<usize> {
        self.column(name).ok_or_else(|| Error::MissingColumn {
            column: s!(name),
            path: path.to_path_buf(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep only the named columns, in the given order.
    pub fn project(&self, names: &[&str], path: &Path) -> Result<DataSet> {
        let cols = names
            .iter()
            .map(|n| self.require_column(n, path))
            .collect::<Result<Vec<_>>>()?;
        let rows = self
            .rows
            .iter()
            .map(|r| cols.iter().map(|&c| r.get(c).cloned().unwrap_or_default()).collect())
            .collect();
        Ok(DataSet::new(names.iter().map(|n| s!(*n)).collect(), rows))
    }
}

/// Load a table whose first row is the header.
pub fn load_table(path: &Path, sep: char) -> Result<DataSet> {
    let text = fs::read_to_string(path)?;
    let (headers, rows) = split_header(parse_rows(&text, sep));
    Ok(DataSet { headers, rows })
}

/// Pick the separator from the extension (`.tsv` → tab, anything else → comma).
pub fn sep_for(path: &Path) -> char {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => '\t',
        _ => ',',
    }
}
