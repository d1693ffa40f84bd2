//! PLY header reader

use std::io::BufRead;

use super::{CoordinateIndices, PlyEncoding, PlyHeader, PlyProperty};
use crate::error::FormatError;
use crate::{PLY_END_HEADER, PLY_MAGIC, PLY_VERSION};

/// Read a PLY header from a stream positioned at the start of the file
///
/// Lines are consumed up to and including `end_header`; `header_len` records
/// the exact number of bytes consumed, so the payload starts there. Only the
/// vertex element is interpreted: `property` lines belonging to any other
/// element (faces, edges, ...) are skipped.
pub fn read_ply_header<R: BufRead + ?Sized>(reader: &mut R) -> Result<PlyHeader, FormatError> {
    let mut raw = Vec::new();
    let mut header_len = 0u64;
    let mut line_no = 0usize;

    let mut encoding = None;
    let mut vertex_count = None;
    let mut in_vertex = false;
    let mut properties: Vec<PlyProperty> = Vec::new();

    loop {
        raw.clear();
        let n = reader.read_until(b'\n', &mut raw)?;
        if n == 0 {
            return Err(FormatError::eof(header_len, "PLY header"));
        }
        let line_start = header_len;
        header_len += n as u64;
        line_no += 1;

        if !raw.is_ascii() {
            return Err(FormatError::HeaderNotAscii { line: line_no });
        }
        let line = std::str::from_utf8(&raw)
            .map_err(|_| FormatError::HeaderNotAscii { line: line_no })?
            .trim();

        if line_no == 1 {
            if line != PLY_MAGIC {
                return Err(FormatError::BadMagic {
                    expected: "ply",
                    found: line.escape_debug().to_string(),
                });
            }
            continue;
        }
        if line == PLY_END_HEADER {
            break;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            ["format", rest @ ..] => {
                let parsed = match rest {
                    [token, version] if *version == PLY_VERSION => PlyEncoding::from_token(token),
                    _ => None,
                };
                encoding = Some(
                    parsed.ok_or_else(|| FormatError::UnsupportedEncoding(rest.join(" ")))?,
                );
            }
            ["element", "vertex", count] => {
                if vertex_count.is_some() {
                    return Err(FormatError::header(line_start, "duplicate vertex element"));
                }
                let count = count.parse::<u64>().map_err(|_| {
                    FormatError::header(line_start, format!("invalid vertex count {count:?}"))
                })?;
                vertex_count = Some(count);
                in_vertex = true;
            }
            ["element", ..] => in_vertex = false,
            ["property", "list", .., name] if in_vertex => properties.push(PlyProperty {
                type_name: "list".to_string(),
                name: name.to_string(),
            }),
            ["property", type_name, name] if in_vertex => properties.push(PlyProperty {
                type_name: type_name.to_string(),
                name: name.to_string(),
            }),
            // comment, obj_info, and properties of other elements
            _ => {}
        }
    }

    let encoding = encoding.ok_or(FormatError::MissingFormat)?;
    let vertex_count = vertex_count.ok_or(FormatError::MissingVertexElement)?;

    let index_of = |axis: &str| properties.iter().position(|p| p.name == axis);
    let coordinates = match (index_of("x"), index_of("y"), index_of("z")) {
        (Some(x), Some(y), Some(z)) => CoordinateIndices { x, y, z },
        _ => {
            return Err(FormatError::MissingCoordinates {
                found: properties.iter().map(|p| p.name.clone()).collect(),
            });
        }
    };

    Ok(PlyHeader {
        vertex_count,
        encoding,
        header_len,
        properties,
        coordinates,
    })
}
