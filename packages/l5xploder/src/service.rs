//! File-level explode and implode with the default controller schema.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::config::validate_l5x_path;
use crate::error::{PloderError, Result};
use crate::explode::Exploder;
use crate::implode::Imploder;
use crate::options::SerializationOptions;
use crate::persistence::ExplodedStore;
use crate::schema::create_l5x_schema;
use crate::xml::{write_document, WriteOptions};

/// Explode an L5X file into `<destination>/RSLogix5000Content`.
///
/// Returns the number of element files written.
pub fn explode_file(
    l5x: &Path,
    destination: &Path,
    options: SerializationOptions,
) -> Result<usize> {
    validate_l5x_path(l5x)?;
    let file = File::open(l5x).map_err(|e| PloderError::io_at(l5x, e))?;

    let store = ExplodedStore::new(destination, options)?;
    tracing::info!(
        input = %l5x.display(),
        output = %store.root_dir().display(),
        "Exploding L5X file"
    );
    Exploder::new(create_l5x_schema()).explode_reader(BufReader::new(file), &store)
}

/// Implode `<destination>/RSLogix5000Content` into an L5X file.
///
/// The storage format is taken from the stored options record.
pub fn implode_file(destination: &Path, l5x: &Path) -> Result<()> {
    validate_l5x_path(l5x)?;
    let store = ExplodedStore::open(destination, SerializationOptions::default())?;
    let document = Imploder::new(create_l5x_schema()).implode(&store)?;

    let file = File::create(l5x).map_err(|e| PloderError::io_at(l5x, e))?;
    let mut writer = BufWriter::new(file);
    write_document(&mut writer, &document, WriteOptions::default())
        .and_then(|()| writer.flush())
        .map_err(|e| PloderError::io_at(l5x, e))?;

    tracing::info!(output = %l5x.display(), "Wrote L5X file");
    Ok(())
}
