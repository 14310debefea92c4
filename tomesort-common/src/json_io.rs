//! JSON record file I/O
//!
//! The upstream corpus is tab-indented with record field order preserved;
//! output files must round-trip that convention so diffs against the
//! original stay readable.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};
use tracing::debug;

use crate::{Error, Result};

/// Load and parse a record file.
pub fn load_json(path: &Path) -> Result<Value> {
    debug!("Loading JSON file: {}", path.display());

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| Error::Json {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write a record file, tab-indented, creating parent directories.
pub fn save_json(path: &Path, value: &Value) -> Result<()> {
    debug!("Saving JSON file: {}", path.display());

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let formatter = PrettyFormatter::with_indent(b"\t");
    let mut serializer = Serializer::with_formatter(&mut writer, formatter);
    serde::Serialize::serialize(value, &mut serializer).map_err(|e| Error::Json {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    Ok(())
}
