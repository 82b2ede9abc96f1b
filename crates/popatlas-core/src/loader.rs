// crates/popatlas-core/src/loader.rs

//! # Data Loader
//!
//! Handles the Physical Layer (file I/O, decompression) for locally stored
//! datasets and delegates to the normalizers.

use crate::error::{AtlasError, Result};
use crate::model::GeoFeature;
use crate::normalize::normalize_geography;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::info;

#[cfg(feature = "compact")]
use flate2::read::GzDecoder;

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

/// Opens a file, buffers it, and wraps it in a Gzip decoder for `.gz` paths.
/// Returns a generic Reader so the caller doesn't care about the compression.
pub fn open_stream(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).map_err(|e| {
        AtlasError::NotFound(format!("Dataset not found at {}: {}", path.display(), e))
    })?;

    let reader = BufReader::new(file);

    if !is_gzip(path) {
        return Ok(Box::new(reader));
    }

    #[cfg(feature = "compact")]
    {
        Ok(Box::new(GzDecoder::new(reader)))
    }

    #[cfg(not(feature = "compact"))]
    {
        Err(AtlasError::InvalidConfig(format!(
            "{} is gzip-compressed but the 'compact' feature is disabled",
            path.display()
        )))
    }
}

/// Reads a JSON document from disk.
pub fn read_json(path: impl AsRef<Path>) -> Result<Value> {
    let reader = open_stream(path.as_ref())?;
    Ok(serde_json::from_reader(reader)?)
}

/// [`read_json`] on tokio's blocking pool, so file I/O and gzip decoding do
/// not stall the thread driving the other fetches.
pub async fn read_json_async(path: impl Into<PathBuf>) -> Result<Value> {
    let path = path.into();
    tokio::task::spawn_blocking(move || read_json(path))
        .await
        .map_err(|e| AtlasError::Io(std::io::Error::other(e.to_string())))?
}

/// Loads and normalizes a GeoJSON FeatureCollection from disk.
pub fn load_geography_file(path: impl AsRef<Path>) -> Result<Vec<GeoFeature>> {
    let path = path.as_ref();
    let raw = read_json(path)?;
    let features = normalize_geography(&raw)?;
    info!(path = %path.display(), features = features.len(), "loaded geography");
    Ok(features)
}
