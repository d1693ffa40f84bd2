//! vox-export library
//!
//! Streams occupancy grids (NPY / NPZ) and point clouds (PLY) into raw
//! little-endian binary payloads with JSON descriptors, for loading by
//! browser viewers. Used by the `vox-export` binary; the converters are
//! usable on their own.

pub mod archive;
pub mod error;
pub mod inspect;
pub mod manifest;
pub mod metadata;
pub mod occupancy;
pub mod options;
pub mod output;
pub mod pointcloud;
pub mod points;
pub mod stats;
pub mod tensor;

use std::path::PathBuf;

pub use error::ExportError;
pub use metadata::PointBounds;
pub use occupancy::convert_occupancy;
pub use options::ConvertOptions;
pub use pointcloud::convert_point_cloud;

/// Files produced by one conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub payload_path: PathBuf,
    pub metadata_path: PathBuf,
    /// Voxels or points written
    pub record_count: u64,
    pub summary: ConversionSummary,
}

/// Kind-specific facts about a finished conversion
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionSummary {
    Occupancy {
        /// Shape from the tensor header
        declared_shape: [u64; 3],
        /// Shape written to the descriptor (archive member or tensor shape)
        grid_shape: [u64; 3],
        value_range: Option<[f32; 2]>,
    },
    PointCloud {
        vertex_count: u64,
        bounds: PointBounds,
    },
}
