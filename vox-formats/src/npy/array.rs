//! Small array decoder for metadata members (bounds, voxel size, grid shape)

use std::io::Read;

use super::NpyHeader;
use crate::SMALL_ARRAY_MAX_ELEMENTS;
use crate::error::FormatError;
use crate::read::read_exact_at;

/// Decode a short, fully buffered array into `f64` values
///
/// `reader` must be positioned at the payload (i.e. right after
/// [`read_npy_header`](super::read_npy_header)). Exactly
/// `element_count * element_size` bytes are consumed. Never use this for the
/// large occupancy tensor; arrays over [`SMALL_ARRAY_MAX_ELEMENTS`] are
/// rejected.
pub fn read_small_array<R: Read + ?Sized>(
    reader: &mut R,
    header: &NpyHeader,
) -> Result<Vec<f64>, FormatError> {
    header.ensure_row_major()?;

    let count = header
        .element_count()
        .ok_or_else(|| FormatError::ShapeMismatch(format!("{:?} overflows", header.shape)))?;
    if count > SMALL_ARRAY_MAX_ELEMENTS {
        return Err(FormatError::ShapeMismatch(format!(
            "{:?} has {count} elements, small arrays hold at most {SMALL_ARRAY_MAX_ELEMENTS}",
            header.shape
        )));
    }

    let mut payload = vec![0u8; count as usize * header.dtype.size()];
    read_exact_at(
        reader,
        &mut payload,
        header.payload_offset,
        &format!("{} payload of shape {:?}", header.dtype.descr(), header.shape),
    )?;

    let mut values = Vec::with_capacity(count as usize);
    header.dtype.decode_into(&payload, &mut values);
    Ok(values)
}
