//! On-disk registry file.
//!
//! The file is TOML with one table per device section:
//!
//! ```toml
//! [MXII]
//! hardware_id = "USB VID:PID=0403:6001 SER=A600XYZ"
//! ```
//!
//! A `path` key may be present in files written by hand or by older tools.
//! It is parsed so such files still load, but nothing downstream trusts it.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDevice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Section name -> stored device
pub type StoredDevices = BTreeMap<String, StoredDevice>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No usable registry at {path}: {reason}")]
    NotFound { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Encoding error: {0}")]
    EncodeError(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Read every section from `path`.
///
/// A missing, unreadable, malformed or empty file is `StoreError::NotFound`.
pub fn read_devices(path: &Path) -> Result<StoredDevices> {
    let not_found = |reason: String| StoreError::NotFound {
        path: path.to_path_buf(),
        reason,
    };

    let text = fs::read_to_string(path).map_err(|e| not_found(e.to_string()))?;
    let devices: StoredDevices = toml::from_str(&text).map_err(|e| not_found(e.to_string()))?;
    if devices.is_empty() {
        return Err(not_found("file has no device sections".to_string()));
    }
    Ok(devices)
}

/// Replace the contents of `path` with `devices`.
///
/// The data goes to a temporary file next to `path` which is then renamed
/// over it, so readers see either the old file or the new one.
pub fn write_devices(path: &Path, devices: &StoredDevices) -> Result<()> {
    let text = toml::to_string(devices)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::IoError(e.error))?;

    log::debug!("Wrote {} device sections to {}", devices.len(), path.display());
    Ok(())
}
