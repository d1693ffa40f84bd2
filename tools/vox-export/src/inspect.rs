//! Header inspection without conversion

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use vox_formats::{
    FormatError, NPY_MAGIC, NpyHeader, PLY_MAGIC, PlyHeader, read_fully, read_npy_header,
    read_ply_header,
};

use crate::archive::{NpzArchive, ZIP_MAGIC};
use crate::error::ExportError;

/// Parsed header facts of one input file
#[derive(Debug, Clone, PartialEq)]
pub enum InspectReport {
    Npy(NpyHeader),
    /// Every `.npy` member with its header; other members are listed by name
    Npz {
        members: Vec<(String, Option<NpyHeader>)>,
        occupancy_member: Option<&'static str>,
    },
    Ply(PlyHeader),
}

/// Detect the container by its leading bytes and parse its header(s)
pub fn inspect(path: &Path) -> Result<InspectReport, ExportError> {
    let mut magic = [0u8; 6];
    let n = {
        let mut file = File::open(path).map_err(|e| ExportError::io(path, e))?;
        read_fully(&mut file, &mut magic).map_err(|e| ExportError::io(path, e))?
    };
    let magic = &magic[..n];
    let source_name = path.display().to_string();

    if magic.starts_with(ZIP_MAGIC) {
        return inspect_npz(path);
    }

    let file = File::open(path).map_err(|e| ExportError::io(path, e))?;
    let mut reader = BufReader::new(file);
    if magic.starts_with(NPY_MAGIC) {
        let header =
            read_npy_header(&mut reader).map_err(|e| ExportError::format(&source_name, e))?;
        Ok(InspectReport::Npy(header))
    } else if magic.starts_with(PLY_MAGIC.as_bytes()) {
        let header =
            read_ply_header(&mut reader).map_err(|e| ExportError::format(&source_name, e))?;
        Ok(InspectReport::Ply(header))
    } else {
        Err(ExportError::format(
            source_name,
            FormatError::BadMagic {
                expected: "NPY, NPZ or PLY signature",
                found: format!("{magic:02x?}"),
            },
        ))
    }
}

fn inspect_npz(path: &Path) -> Result<InspectReport, ExportError> {
    let mut archive = NpzArchive::open(path)?;
    let occupancy_member = archive.occupancy_member().ok();

    let mut members = Vec::new();
    for name in archive.member_names() {
        if !name.ends_with(".npy") {
            members.push((name, None));
            continue;
        }
        let source_name = archive.source_name(&name);
        let header = archive.with_member(&name, |reader| {
            read_npy_header(reader).map_err(|e| ExportError::format(&source_name, e))
        })?;
        members.push((name, Some(header)));
    }

    Ok(InspectReport::Npz {
        members,
        occupancy_member,
    })
}

fn fmt_npy(f: &mut fmt::Formatter<'_>, indent: &str, h: &NpyHeader) -> fmt::Result {
    writeln!(f, "{indent}version: {}.{}", h.version.0, h.version.1)?;
    writeln!(f, "{indent}dtype: {}", h.dtype.descr())?;
    writeln!(f, "{indent}shape: {:?}", h.shape)?;
    writeln!(
        f,
        "{indent}order: {}",
        if h.column_major { "column-major" } else { "row-major" }
    )?;
    writeln!(f, "{indent}payload offset: {}", h.payload_offset)
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectReport::Npy(header) => {
                writeln!(f, "NPY array")?;
                fmt_npy(f, "  ", header)
            }
            InspectReport::Npz {
                members,
                occupancy_member,
            } => {
                writeln!(f, "NPZ archive ({} members)", members.len())?;
                match occupancy_member {
                    Some(m) => writeln!(f, "  occupancy member: {m}")?,
                    None => writeln!(f, "  occupancy member: none")?,
                }
                for (name, header) in members {
                    writeln!(f, "  {name}")?;
                    if let Some(header) = header {
                        fmt_npy(f, "    ", header)?;
                    }
                }
                Ok(())
            }
            InspectReport::Ply(header) => {
                writeln!(f, "PLY point cloud")?;
                writeln!(f, "  format: {}", header.format_line())?;
                writeln!(f, "  vertices: {}", header.vertex_count)?;
                writeln!(f, "  header bytes: {}", header.header_len)?;
                for (i, p) in header.properties.iter().enumerate() {
                    writeln!(f, "  property {i}: {} {}", p.type_name, p.name)?;
                }
                let c = header.coordinates;
                writeln!(f, "  xyz at properties {}, {}, {}", c.x, c.y, c.z)
            }
        }
    }
}
