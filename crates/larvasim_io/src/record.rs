use crate::error::{IoError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use larvasim_core::deb::record::FinalRecord;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Writes a finalized energetics record as gzipped JSON.
pub fn save_record<P: AsRef<Path>>(record: &FinalRecord, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    serde_json::to_writer(&mut encoder, record)?;
    encoder.finish()?.flush()?;
    tracing::info!(id = %record.id, path = %path.display(), rows = record.rows.len(), "Energetics record saved");
    Ok(())
}

pub fn load_record<P: AsRef<Path>>(path: P) -> Result<FinalRecord> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let decoder = GzDecoder::new(BufReader::new(file));
    serde_json::from_reader(decoder)
        .map_err(|e| IoError::from(e).with_context(format!("reading {}", path.display())))
}
