//! Conversion error types

use std::path::{Path, PathBuf};

use thiserror::Error;
use vox_formats::FormatError;

/// Errors that abort a single conversion
#[derive(Debug, Error)]
pub enum ExportError {
    /// Structural problem in a source container or archive member
    #[error("{source_name}: {source}")]
    Format {
        /// File path, or `archive.npz:member.npy` for archive members
        source_name: String,
        #[source]
        source: FormatError,
    },

    /// Open/read/write/permission failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Required member absent from an NPZ archive
    #[error("{}: none of {expected:?} found in archive", archive.display())]
    ArchiveMemberMissing {
        archive: PathBuf,
        expected: Vec<String>,
    },

    /// Archive directory or member could not be read
    #[error("{}: archive error: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Metadata member decoded fine but has unusable contents
    #[error("{source_name}: {message}")]
    InvalidMember {
        source_name: String,
        message: String,
    },

    /// Descriptor could not be serialized
    #[error("failed to encode metadata for {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ExportError {
    /// Attach the source name to a format error
    ///
    /// I/O failures surfacing through the parsers are reported as `Io`.
    pub fn format(source_name: impl Into<String>, err: FormatError) -> Self {
        let source_name = source_name.into();
        match err {
            FormatError::Io(source) => ExportError::Io {
                path: PathBuf::from(source_name),
                source,
            },
            source => ExportError::Format {
                source_name,
                source,
            },
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The structural error kind, when this is a format failure
    pub fn format_error(&self) -> Option<&FormatError> {
        match self {
            ExportError::Format { source, .. } => Some(source),
            _ => None,
        }
    }
}
