//! NPY header reader

use std::io::Read;

use super::literal::parse_header_dict;
use super::{Dtype, NpyHeader};
use crate::error::FormatError;
use crate::read::read_exact_at;
use crate::{NPY_MAGIC, NPY_PREAMBLE_LEN};

/// Read an NPY header from a stream positioned at the start of the container
///
/// On success the stream is positioned exactly at the first payload byte and
/// `payload_offset` holds that position.
///
/// Layout:
/// - 6 bytes magic `\x93NUMPY`
/// - 1 byte major, 1 byte minor version: 1.0, 2.0 or 3.0
/// - header length: u16 LE for v1, u32 LE for v2/v3
/// - header text (Latin-1 for v1/v2, UTF-8 for v3), a dict literal with
///   exactly the keys `descr`, `fortran_order` and `shape`
pub fn read_npy_header<R: Read + ?Sized>(reader: &mut R) -> Result<NpyHeader, FormatError> {
    let mut magic = [0u8; 6];
    read_exact_at(reader, &mut magic, 0, "NPY magic")?;
    if &magic != NPY_MAGIC {
        return Err(FormatError::BadMagic {
            expected: "\\x93NUMPY",
            found: magic.escape_ascii().to_string(),
        });
    }

    let mut version = [0u8; 2];
    read_exact_at(reader, &mut version, 6, "NPY version")?;
    let (major, minor) = (version[0], version[1]);

    let prefix_width: u64 = match (major, minor) {
        (1, 0) => 2,
        (2, 0) | (3, 0) => 4,
        _ => return Err(FormatError::UnsupportedVersion { major, minor }),
    };

    let header_len = if prefix_width == 2 {
        let mut buf = [0u8; 2];
        read_exact_at(reader, &mut buf, NPY_PREAMBLE_LEN, "NPY header length")?;
        u16::from_le_bytes(buf) as u64
    } else {
        let mut buf = [0u8; 4];
        read_exact_at(reader, &mut buf, NPY_PREAMBLE_LEN, "NPY header length")?;
        // Dict text where the upper prefix bytes belong: a u16 prefix
        if buf[2] == b'{' {
            return Err(FormatError::header(
                NPY_PREAMBLE_LEN,
                format!(
                    "version {major}.{minor} requires a 4-byte header length, \
                     found a 2-byte prefix followed by header text"
                ),
            ));
        }
        u32::from_le_bytes(buf) as u64
    };

    let text_offset = NPY_PREAMBLE_LEN + prefix_width;
    let payload_offset = text_offset
        .checked_add(header_len)
        .ok_or_else(|| FormatError::header(NPY_PREAMBLE_LEN, "header length overflows"))?;

    // Bounded by the stream, not by the declared length
    let mut raw = Vec::new();
    Read::take(&mut *reader, header_len).read_to_end(&mut raw)?;
    if (raw.len() as u64) < header_len {
        return Err(FormatError::eof(
            text_offset + raw.len() as u64,
            format!("NPY header text ({header_len} bytes declared)"),
        ));
    }

    let text = if major == 3 {
        String::from_utf8(raw).map_err(|e| {
            FormatError::header(
                text_offset + e.utf8_error().valid_up_to() as u64,
                "header text is not valid UTF-8",
            )
        })?
    } else {
        raw.iter().map(|&b| b as char).collect()
    };

    let dict = parse_header_dict(&text, text_offset)?;
    let dtype = Dtype::from_descr(&dict.descr)?;

    Ok(NpyHeader {
        version: (major, minor),
        dtype,
        shape: dict.shape,
        column_major: dict.fortran_order,
        payload_offset,
    })
}
