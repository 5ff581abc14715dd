// src/grammar/io.rs
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    time::Instant,
};

use super::{GrammarTable, RawGrammar};
use crate::error::TableError;

// -------------------- JSON (de)serialization --------------------

pub fn save_json(path: &Path, table: &GrammarTable) -> std::io::Result<()> {
    let f = File::create(path)?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer(&mut w, &table.to_raw())?;
    w.flush()
}

pub fn to_json_string(table: &GrammarTable) -> Result<String, TableError> {
    Ok(serde_json::to_string_pretty(&table.to_raw())?)
}

/// Reloads a table saved with [`save_json`]; the records go through the same
/// link phase as a binary table.
pub fn load_json_bytes(data: &[u8]) -> Result<GrammarTable, TableError> {
    serde_json::from_slice::<RawGrammar>(data)?.link()
}

// -------------------- Binary table --------------------

pub fn save_egt(path: &Path, table: &GrammarTable) -> std::io::Result<()> {
    let instant = Instant::now();
    let f = File::create(path)?;
    table.to_raw().write_egt(f)?;
    log::debug!(
        "saved grammar table to {} in {} ms",
        path.display(),
        instant.elapsed().as_millis()
    );
    Ok(())
}
