//! PLY point container: header types, header reader, binary record layout

mod header;
mod types;


pub use header::read_ply_header;
pub use types::{FieldSlot, RecordLayout, ScalarType};

use crate::PLY_VERSION;
use crate::error::FormatError;

/// Payload encoding declared by the `format` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlyEncoding {
    Ascii,
    BinaryLittleEndian,
}

impl PlyEncoding {
    pub(crate) fn from_token(token: &str) -> Option<Self> {
        match token {
            "ascii" => Some(PlyEncoding::Ascii),
            "binary_little_endian" => Some(PlyEncoding::BinaryLittleEndian),
            _ => None,
        }
    }

    /// Token as written in the header
    pub const fn token(self) -> &'static str {
        match self {
            PlyEncoding::Ascii => "ascii",
            PlyEncoding::BinaryLittleEndian => "binary_little_endian",
        }
    }
}

/// One `property TYPE NAME` entry of the vertex element
///
/// List properties are kept with `type_name == "list"` so that binary
/// decoding can refuse them instead of silently misaligning records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyProperty {
    pub type_name: String,
    pub name: String,
}

/// Schema positions of the coordinate properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateIndices {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

/// Parsed PLY header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyHeader {
    /// Declared number of vertex records
    pub vertex_count: u64,
    /// Payload encoding
    pub encoding: PlyEncoding,
    /// Exact byte count of every header line including `end_header`
    pub header_len: u64,
    /// Vertex properties in declaration order
    pub properties: Vec<PlyProperty>,
    /// Where x, y and z sit in `properties`
    pub coordinates: CoordinateIndices,
}

impl PlyHeader {
    /// The format line payload, e.g. `binary_little_endian 1.0`
    pub fn format_line(&self) -> String {
        format!("{} {}", self.encoding.token(), PLY_VERSION)
    }

    /// Fixed-width binary record layout for the vertex element
    ///
    /// Every property must have a known scalar type, including ones that are
    /// never read: an undecodable width would shift all following records.
    pub fn record_layout(&self) -> Result<RecordLayout, FormatError> {
        let mut offsets = Vec::with_capacity(self.properties.len());
        let mut stride = 0usize;
        for prop in &self.properties {
            let scalar = ScalarType::from_ply_name(&prop.type_name).ok_or_else(|| {
                FormatError::UnsupportedPropertyType {
                    type_name: prop.type_name.clone(),
                    name: prop.name.clone(),
                }
            })?;
            offsets.push(FieldSlot {
                offset: stride,
                scalar,
            });
            stride += scalar.size();
        }

        let CoordinateIndices { x, y, z } = self.coordinates;
        match (offsets.get(x), offsets.get(y), offsets.get(z)) {
            (Some(&x), Some(&y), Some(&z)) => Ok(RecordLayout { stride, x, y, z }),
            _ => Err(FormatError::MissingCoordinates {
                found: self.properties.iter().map(|p| p.name.clone()).collect(),
            }),
        }
    }
}
