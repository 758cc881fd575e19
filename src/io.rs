//! Byte and file convenience API
//!
//! Each call opens one session, and for the file variants one file handle,
//! and releases both before returning, on success and on failure alike.

use keepsake_core::{Result, TypeRegistry, Value};
use keepsake_stream::{ObjectInput, ObjectOutput, StreamConfig};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Serialize one root value into a new byte vector
pub fn to_bytes(value: &Value) -> Result<Vec<u8>> {
    to_bytes_all(std::slice::from_ref(value))
}

/// Serialize several roots into one session
pub fn to_bytes_all(values: &[Value]) -> Result<Vec<u8>> {
    let mut out = ObjectOutput::new(Vec::new())?;
    for value in values {
        out.write_object(value)?;
    }
    out.into_inner()
}

/// Read the first root value from a byte slice
pub fn from_bytes(bytes: &[u8], registry: &Arc<TypeRegistry>) -> Result<Value> {
    ObjectInput::new(bytes, registry.clone())?.read_object()
}

/// Write one root value to a file, replacing it
pub fn save(path: impl AsRef<Path>, value: &Value) -> Result<()> {
    save_all_with_config(path, std::slice::from_ref(value), &StreamConfig::default())
}

/// Write one root value to a file with explicit limits
pub fn save_with_config(path: impl AsRef<Path>, value: &Value, config: &StreamConfig) -> Result<()> {
    save_all_with_config(path, std::slice::from_ref(value), config)
}

/// Write several roots to a file in one session
pub fn save_all(path: impl AsRef<Path>, values: &[Value]) -> Result<()> {
    save_all_with_config(path, values, &StreamConfig::default())
}

/// Write several roots to a file in one session with explicit limits
pub fn save_all_with_config(
    path: impl AsRef<Path>,
    values: &[Value],
    config: &StreamConfig,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let writer = BufWriter::with_capacity(config.buffer_capacity, file);
    let mut out = ObjectOutput::with_config(writer, config.clone())?;
    for value in values {
        out.write_object(value)?;
    }
    let handles = out.handles();
    let file = out.into_inner()?.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    debug!(path = %path.display(), roots = values.len(), handles, "saved");
    Ok(())
}

/// Read the first root value from a file
pub fn load(path: impl AsRef<Path>, registry: &Arc<TypeRegistry>) -> Result<Value> {
    load_with_config(path, registry, &StreamConfig::default())
}

/// Read the first root value from a file with explicit limits
pub fn load_with_config(
    path: impl AsRef<Path>,
    registry: &Arc<TypeRegistry>,
    config: &StreamConfig,
) -> Result<Value> {
    let mut input = open(path.as_ref(), registry, config)?;
    input.read_object()
}

/// Read every root value from a file, in one session
pub fn load_all(path: impl AsRef<Path>, registry: &Arc<TypeRegistry>) -> Result<Vec<Value>> {
    load_all_with_config(path, registry, &StreamConfig::default())
}

/// Read every root value from a file with explicit limits
pub fn load_all_with_config(
    path: impl AsRef<Path>,
    registry: &Arc<TypeRegistry>,
    config: &StreamConfig,
) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let mut input = open(path, registry, config)?;
    let roots = input.read_to_end()?;
    debug!(path = %path.display(), roots = roots.len(), handles = input.handles(), "loaded");
    Ok(roots)
}

fn open(
    path: &Path,
    registry: &Arc<TypeRegistry>,
    config: &StreamConfig,
) -> Result<ObjectInput<BufReader<File>>> {
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(config.buffer_capacity, file);
    ObjectInput::with_config(reader, registry.clone(), config.clone())
}
