//! Container parsing error types

use thiserror::Error;

/// Structural errors raised while reading NPY or PLY containers
///
/// Every variant is fatal to the conversion in progress. Offsets are byte
/// positions from the start of the container (or archive member) being read.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Leading magic bytes/line did not match the container
    #[error("bad magic: expected {expected}, found {found}")]
    BadMagic {
        expected: &'static str,
        found: String,
    },

    /// NPY version outside the allow-list
    #[error("unsupported NPY version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// Header text could not be parsed
    #[error("header parse error at byte {offset}: {message}")]
    HeaderParseError { offset: u64, message: String },

    /// Element type outside the supported set for this operation
    #[error("unsupported dtype {0:?}")]
    UnsupportedDtype(String),

    /// Column-major (`fortran_order: True`) payload
    #[error("unsupported memory order: column-major payloads are not accepted")]
    UnsupportedMemoryOrder,

    /// Shape does not fit the operation (wrong rank, overflow, too large)
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Stream ended before the declared amount of data was read
    #[error("unexpected end of file at byte {offset} while reading {context}")]
    UnexpectedEof { offset: u64, context: String },

    /// PLY header line containing non-ASCII bytes
    #[error("PLY header line {line} is not ASCII")]
    HeaderNotAscii { line: usize },

    /// PLY format line other than ascii/binary_little_endian 1.0
    #[error(
        "unsupported PLY format {0:?} (expected \"ascii 1.0\" or \"binary_little_endian 1.0\")"
    )]
    UnsupportedEncoding(String),

    /// ASCII vertex record that cannot be decoded
    #[error("malformed vertex record {index}: {message}")]
    MalformedRecord { index: u64, message: String },

    /// PLY property type without a fixed-width binary layout
    #[error("unsupported PLY property type {type_name:?} (property {name:?})")]
    UnsupportedPropertyType { type_name: String, name: String },

    /// PLY header without a `format` line
    #[error("PLY header missing format line")]
    MissingFormat,

    /// PLY header without an `element vertex N` line
    #[error("PLY header missing vertex element")]
    MissingVertexElement,

    /// Vertex element lacks one of x, y, z
    #[error("PLY vertex properties must include x, y, z; found {found:?}")]
    MissingCoordinates { found: Vec<String> },

    /// Underlying read or write failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    pub(crate) fn header(offset: u64, message: impl Into<String>) -> Self {
        FormatError::HeaderParseError {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn eof(offset: u64, context: impl Into<String>) -> Self {
        FormatError::UnexpectedEof {
            offset,
            context: context.into(),
        }
    }
}
