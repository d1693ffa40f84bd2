//! vox-formats: NPY tensor and PLY point cloud container parsers
//!
//! This crate reads the structural parts of two self-describing binary
//! containers directly from their byte layout, without an array library:
//!
//! - **NPY** (`\x93NUMPY` tensor files, also the members of NPZ archives):
//!   magic, version, length-prefixed header literal, row-major payload.
//! - **PLY** (point clouds): line-oriented ASCII header followed by either
//!   ASCII records or fixed-width little-endian binary records.
//!
//! Everything here works on `std::io::Read`/`BufRead` streams so that callers
//! can parse members of an archive as easily as files on disk. Payload
//! streaming (the part that touches large data) lives in `vox-export`; this
//! crate provides the header readers, the small array decoder used for
//! metadata members, and the binary record layout for PLY vertices.
//!
//! # Usage
//!
//! ```ignore
//! use std::io::BufReader;
//! use vox_formats::{read_npy_header, read_small_array};
//!
//! let mut reader = BufReader::new(std::fs::File::open("voxel_size.npy")?);
//! let header = read_npy_header(&mut reader)?;
//! let values = read_small_array(&mut reader, &header)?;
//! println!("{:?} {:?} -> {:?}", header.dtype, header.shape, values);
//! ```
//!
//! # Format Reference
//!
//! - NPY format: <https://numpy.org/doc/stable/reference/generated/numpy.lib.format.html>
//! - PLY format: <http://paulbourke.net/dataformats/ply/>

mod error;
mod npy;
mod ply;
mod read;

pub use error::FormatError;
pub use npy::{Dtype, NpyHeader, read_npy_header, read_small_array};
pub use ply::{
    CoordinateIndices, FieldSlot, PlyEncoding, PlyHeader, PlyProperty, RecordLayout, ScalarType,
    read_ply_header,
};
pub use read::read_fully;

// =============================================================================
// NPY Constants
// =============================================================================

/// NPY magic bytes
pub const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Bytes before the header-length prefix (magic + major + minor)
pub const NPY_PREAMBLE_LEN: u64 = 8;

/// Largest element count accepted by [`read_small_array`]
pub const SMALL_ARRAY_MAX_ELEMENTS: u64 = 4096;

// =============================================================================
// PLY Constants
// =============================================================================

/// First line of every PLY file
pub const PLY_MAGIC: &str = "ply";

/// Line that terminates a PLY header
pub const PLY_END_HEADER: &str = "end_header";

/// The only PLY format version we accept
pub const PLY_VERSION: &str = "1.0";
