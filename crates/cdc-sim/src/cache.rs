//! On-disk result cache, one CSV file per configuration identifier.
//!
//! A missing file is an expected cache miss; any other read failure surfaces
//! as a distinct error so corrupt or unreadable entries are never silently
//! recomputed over. Writes overwrite whole files; concurrent writers for the
//! same identifier are not protected against torn writes.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use cdc_core::errors::{CdcError, ErrorInfo};
use cdc_core::SystemParameters;

use crate::table::Table;

/// Cache file path for a configuration: `<directory>/<identifier>.csv`.
pub fn cache_path(directory: &Path, parameters: &SystemParameters) -> PathBuf {
    directory.join(format!("{}.csv", parameters.identifier()))
}

/// Loads a cached table. Returns `Ok(None)` when the file does not exist;
/// every other failure is an error.
pub fn load(path: &Path) -> Result<Option<Table>, CdcError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(CdcError::Cache(
                ErrorInfo::new("cache-open", "failed to open cache file")
                    .with_context("path", path.display().to_string())
                    .with_hint(err.to_string()),
            ))
        }
    };
    let table = Table::read_csv(BufReader::new(file)).map_err(|err| {
        CdcError::Cache(
            ErrorInfo::new("cache-read", "failed to parse cache file")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    Ok(Some(table))
}

/// Stores a table, overwriting any previous entry.
pub fn store(path: &Path, table: &Table) -> Result<(), CdcError> {
    let file = File::create(path).map_err(|err| {
        CdcError::Cache(
            ErrorInfo::new("cache-create", "failed to create cache file")
                .with_context("path", path.display().to_string())
                .with_hint(err.to_string()),
        )
    })?;
    table.write_csv(BufWriter::new(file))
}
