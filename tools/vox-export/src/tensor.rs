//! Streaming copy of a 3D float32 tensor payload
//!
//! The payload is never held in memory as a whole: each chunk is written
//! verbatim and decoded only to fold it into the running range.

use std::io::{Read, Write};

use vox_formats::{Dtype, FormatError, NpyHeader, read_fully};

use crate::stats::RunningRange;

/// Outcome of a tensor stream copy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TensorStats {
    /// Declared (nx, ny, nz)
    pub shape: [u64; 3],
    /// Bytes copied (`nx * ny * nz * 4`)
    pub bytes_written: u64,
    /// (min, max) over all non-NaN values; `None` for an empty grid
    pub value_range: Option<[f32; 2]>,
}

/// Check that a header describes a row-major rank-3 `<f4` tensor
///
/// Returns the shape and the exact payload byte count.
pub fn validate_f32_grid(header: &NpyHeader) -> Result<([u64; 3], u64), FormatError> {
    let shape: [u64; 3] = header.shape.as_slice().try_into().map_err(|_| {
        FormatError::ShapeMismatch(format!(
            "expected a 3D array, got shape {:?}",
            header.shape
        ))
    })?;
    if header.dtype != Dtype::F32 {
        return Err(FormatError::UnsupportedDtype(format!(
            "{} (only <f4 is supported for occupancy grids; re-export as float32 little-endian)",
            header.dtype.descr()
        )));
    }
    header.ensure_row_major()?;

    let expected = header.payload_len().ok_or_else(|| {
        FormatError::ShapeMismatch(format!("shape {shape:?} overflows the payload size"))
    })?;
    Ok((shape, expected))
}

/// Copy a tensor payload from `reader` to `writer` in bounded chunks
///
/// `reader` must be positioned at the payload (right after the header).
/// Chunk sizes are rounded down to a multiple of 4 bytes, minimum 4, so that
/// every chunk holds whole elements. If the stream ends early the error is
/// `UnexpectedEof` and whatever was already written must be discarded.
pub fn stream_tensor<R, W>(
    reader: &mut R,
    header: &NpyHeader,
    writer: &mut W,
    chunk_bytes: usize,
) -> Result<TensorStats, FormatError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let (shape, expected) = validate_f32_grid(header)?;
    let chunk_bytes = (chunk_bytes - chunk_bytes % 4).max(4);

    // Never allocate past the declared payload
    let buf_len = usize::try_from(expected).map_or(chunk_bytes, |len| chunk_bytes.min(len));
    let mut buf = vec![0u8; buf_len];
    let mut range = RunningRange::new();
    let mut copied = 0u64;

    while copied < expected {
        let want = (expected - copied).min(buf_len as u64) as usize;
        let got = read_fully(reader, &mut buf[..want])?;
        if got > 0 {
            writer.write_all(&buf[..got])?;
            range.push_le_bytes(&buf[..got]);
            copied += got as u64;
        }
        if got < want {
            return Err(FormatError::UnexpectedEof {
                offset: header.payload_offset + copied,
                context: format!(
                    "tensor payload: {copied} of {expected} bytes for shape {shape:?}"
                ),
            });
        }
    }

    Ok(TensorStats {
        shape,
        bytes_written: copied,
        value_range: range.range(),
    })
}
