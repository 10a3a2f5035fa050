//! NP-013: JSON artifact I/O — load, save (atomic), temp-path derivation.
//!
//! Every artifact is written as UTF-8 JSON with a 4-space indent and
//! non-ASCII text left unescaped.

use super::error::PrepError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Sibling path used while writing `path` (`foo.json` → `foo.json.tmp`).
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Load a JSON artifact.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, PrepError> {
    let content = std::fs::read_to_string(path).map_err(PrepError::io("read", path))?;
    serde_json::from_str(&content).map_err(|source| PrepError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a JSON artifact. Returns None if the file doesn't exist.
pub fn load_json_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PrepError> {
    if !path.exists() {
        return Ok(None);
    }
    load_json(path).map(Some)
}

/// Render a value the way every artifact is stored.
pub fn to_json_string<T: Serialize>(value: &T) -> Result<String, PrepError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser).map_err(PrepError::Serialize)?;
    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Save an artifact atomically (write to temp, then rename).
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PrepError> {
    let json = to_json_string(value)?;
    write_atomic(path, json.as_bytes())
}

/// Write bytes atomically, creating parent directories as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PrepError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(PrepError::io("create dir", parent))?;
        }
    }

    let tmp_path = temp_path(path);
    std::fs::write(&tmp_path, bytes).map_err(PrepError::io("write", &tmp_path))?;
    std::fs::rename(&tmp_path, path).map_err(PrepError::io("rename into place", path))?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
    Ok(())
}
