// src/file.rs

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::config::ExportOptions;
use crate::csv::write_row;
use crate::error::{Error, Result};
use crate::store::DataSet;

/// Write a table according to ExportOptions (path, headers policy, delimiter).
/// Returns the final path written to.
pub fn write_table(export: &ExportOptions, ds: &DataSet) -> Result<PathBuf> {
    let path = export.out_path();
    let headers = if export.include_headers { ds.headers.as_deref() } else { None };
    write_table_to(&path, headers, &ds.rows, export.delim())?;
    Ok(path)
}

/// Create/truncate `path` and stream the rows into it.
pub fn write_table_to(
    path: &Path,
    headers: Option<&[String]>,
    rows: &[Vec<String>],
    sep: char,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory(parent)?;
        }
    }
    let mut out = BufWriter::new(File::create(path)?);
    if let Some(h) = headers {
        write_row(&mut out, h, sep)?;
    }
    for row in rows {
        write_row(&mut out, row, sep)?;
    }
    out.flush()?;
    Ok(())
}

pub fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(Error::InvalidInput(format!(
            "Path exists but is not a directory: {}",
            dir.display()
        )));
    }
    if !dir.exists() { fs::create_dir_all(dir)?; }
    Ok(())
}

/// Files in `dir` with extension `ext` (case-insensitive), sorted by name.
pub fn list_files(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() { continue; }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext));
        if matches { out.push(path); }
    }
    out.sort();
    Ok(out)
}

/// A captured response and the page saved alongside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturePair {
    pub stem: String,
    pub response: PathBuf,
    pub page: PathBuf,
}

/// Pair each response file with `<pages>/<stem>.<page_ext>`. Responses with no
/// page are returned separately so the caller can report them.
pub fn pair_captures(
    responses: &Path,
    pages: &Path,
    response_ext: &str,
    page_ext: &str,
) -> Result<(Vec<CapturePair>, Vec<PathBuf>)> {
    let mut paired = Vec::new();
    let mut orphans = Vec::new();

    for response in list_files(responses, response_ext)? {
        let Some(stem) = response.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let page = pages.join(join!(&stem, ".", page_ext));
        if page.is_file() {
            paired.push(CapturePair { stem, response, page });
        } else {
            orphans.push(response);
        }
    }
    Ok((paired, orphans))
}
