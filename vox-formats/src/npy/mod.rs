//! NPY tensor container: header types, header reader, small array decoder

mod array;
mod header;
mod literal;

#[cfg(test)]
mod tests;

pub use array::read_small_array;
pub use header::read_npy_header;

use crate::error::FormatError;

/// Element types accepted in NPY headers (all little-endian)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    F32,
    F64,
    I32,
    I64,
    U32,
    U64,
}

impl Dtype {
    /// Parse an NPY `descr` string such as `<f4`
    pub fn from_descr(descr: &str) -> Result<Self, FormatError> {
        match descr {
            "<f4" => Ok(Dtype::F32),
            "<f8" => Ok(Dtype::F64),
            "<i4" => Ok(Dtype::I32),
            "<i8" => Ok(Dtype::I64),
            "<u4" => Ok(Dtype::U32),
            "<u8" => Ok(Dtype::U64),
            other => Err(FormatError::UnsupportedDtype(other.to_string())),
        }
    }

    /// The NPY `descr` string for this type
    pub const fn descr(self) -> &'static str {
        match self {
            Dtype::F32 => "<f4",
            Dtype::F64 => "<f8",
            Dtype::I32 => "<i4",
            Dtype::I64 => "<i8",
            Dtype::U32 => "<u4",
            Dtype::U64 => "<u8",
        }
    }

    /// Element size in bytes
    pub const fn size(self) -> usize {
        match self {
            Dtype::F32 | Dtype::I32 | Dtype::U32 => 4,
            Dtype::F64 | Dtype::I64 | Dtype::U64 => 8,
        }
    }

    /// Decode packed little-endian elements, appending them as `f64`
    ///
    /// Trailing bytes that do not form a whole element are ignored.
    pub fn decode_into(self, bytes: &[u8], out: &mut Vec<f64>) {
        let chunks = bytes.chunks_exact(self.size());
        out.reserve(chunks.len());
        for c in chunks {
            let v = match self {
                Dtype::F32 => f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64,
                Dtype::I32 => i32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64,
                Dtype::U32 => u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64,
                Dtype::F64 => f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]),
                Dtype::I64 => {
                    i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f64
                }
                Dtype::U64 => {
                    u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f64
                }
            };
            out.push(v);
        }
    }
}

/// Parsed NPY header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpyHeader {
    /// (major, minor) format version
    pub version: (u8, u8),
    /// Element type
    pub dtype: Dtype,
    /// Array dimensions, outermost first; empty for scalars
    pub shape: Vec<u64>,
    /// `fortran_order` flag from the header literal
    pub column_major: bool,
    /// Byte offset of the first payload byte (magic + version + prefix + text)
    pub payload_offset: u64,
}

impl NpyHeader {
    /// Product of all dimensions (1 for a scalar), or `None` on overflow
    pub fn element_count(&self) -> Option<u64> {
        self.shape.iter().try_fold(1u64, |acc, &d| acc.checked_mul(d))
    }

    /// Payload size in bytes, or `None` on overflow
    pub fn payload_len(&self) -> Option<u64> {
        self.element_count()?.checked_mul(self.dtype.size() as u64)
    }

    /// Reject column-major payloads
    pub fn ensure_row_major(&self) -> Result<(), FormatError> {
        if self.column_major {
            return Err(FormatError::UnsupportedMemoryOrder);
        }
        Ok(())
    }
}
