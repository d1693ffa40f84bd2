//! Output file naming and scoped payload writing

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::ExportError;

/// Paths of one binary + JSON output pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPair {
    pub payload: PathBuf,
    pub metadata: PathBuf,
}

impl OutputPair {
    /// `<dir>/<name>.bin` and `<dir>/<name>.json`
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            payload: dir.join(format!("{name}.bin")),
            metadata: dir.join(format!("{name}.json")),
        }
    }

    /// Create the output directory and remove a descriptor left by an earlier run
    ///
    /// Must run before the payload is opened: a descriptor is only ever
    /// present next to the payload it describes.
    pub fn prepare(&self) -> Result<(), ExportError> {
        if let Some(dir) = self.payload.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))?;
        }
        match fs::remove_file(&self.metadata) {
            Ok(()) => {
                tracing::debug!("Removed stale {:?}", self.metadata);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExportError::io(&self.metadata, e)),
        }
    }

    /// File name of the payload, as referenced from the metadata
    pub fn payload_file_name(&self) -> String {
        self.payload
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Create `path`, hand a buffered writer to `write`, flush, and close
///
/// The file handle never outlives this call. On failure the partially
/// written file is left on disk and must not be consumed.
pub fn write_payload<T>(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<T, ExportError>,
) -> Result<T, ExportError> {
    let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let result = write(&mut writer).and_then(|value| {
        writer.flush().map_err(|e| ExportError::io(path, e))?;
        Ok(value)
    });

    if let Err(e) = &result {
        tracing::warn!(
            "Conversion failed, partial payload left at {:?} is invalid: {}",
            path,
            e
        );
    }
    result
}

/// Human-readable size for log lines
pub fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
