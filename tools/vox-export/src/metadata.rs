//! JSON descriptors written next to each binary payload
//!
//! Builders here are pure: they only assemble recovered header facts and
//! running ranges. [`write_metadata`] is the single I/O step.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::ExportError;
use crate::points::POINT_STRIDE;
use crate::stats::AxisBounds;

/// Physical extent of the occupancy grid, `[min, max]` per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridBounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
    pub z: [f64; 2],
}

/// Descriptor for a converted occupancy grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancyMetadata {
    pub occupancy_file: String,
    pub grid_shape: [u64; 3],
    pub bounds: GridBounds,
    pub voxel_size: f64,
    /// `null` when the grid holds no values
    pub occupancy_range: Option<[f32; 2]>,
}

/// Per-axis bounds of emitted points; `null` for an empty cloud
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointBounds {
    pub x: Option<[f32; 2]>,
    pub y: Option<[f32; 2]>,
    pub z: Option<[f32; 2]>,
}

impl From<&AxisBounds> for PointBounds {
    fn from(b: &AxisBounds) -> Self {
        Self {
            x: b.x.range(),
            y: b.y.range(),
            z: b.z.range(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub components: u32,
    pub offset: u32,
}

/// Coordinate frame of the emitted points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Convention {
    pub up_axis: String,
    pub xy_swap: bool,
    /// The swap is already baked into the payload
    pub data_is_swapped: bool,
}

/// Where the points came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointSource {
    pub ply: String,
    pub ply_format: String,
    pub vertex_count: u64,
}

/// Descriptor for a converted point cloud
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointCloudMetadata {
    pub points_file: String,
    pub count: u64,
    pub stride_bytes: u32,
    pub attributes: Vec<Attribute>,
    pub bounds: PointBounds,
    pub convention: Convention,
    pub source: PointSource,
}

/// Assemble the occupancy descriptor
pub fn occupancy_metadata(
    occupancy_file: &str,
    grid_shape: [u64; 3],
    bounds: GridBounds,
    voxel_size: f64,
    occupancy_range: Option<[f32; 2]>,
) -> OccupancyMetadata {
    OccupancyMetadata {
        occupancy_file: occupancy_file.to_string(),
        grid_shape,
        bounds,
        voxel_size,
        occupancy_range,
    }
}

/// Assemble the point cloud descriptor
pub fn point_cloud_metadata(
    points_file: &str,
    count: u64,
    bounds: &AxisBounds,
    xy_swap: bool,
    source: PointSource,
) -> PointCloudMetadata {
    PointCloudMetadata {
        points_file: points_file.to_string(),
        count,
        stride_bytes: POINT_STRIDE as u32,
        attributes: vec![Attribute {
            name: "position".to_string(),
            kind: "float32".to_string(),
            components: 3,
            offset: 0,
        }],
        bounds: bounds.into(),
        convention: Convention {
            up_axis: "Z".to_string(),
            xy_swap,
            data_is_swapped: true,
        },
        source,
    }
}

/// Write a descriptor as pretty-printed JSON with a trailing newline
pub fn write_metadata<T: Serialize>(path: &Path, metadata: &T) -> Result<(), ExportError> {
    let mut json = serde_json::to_string_pretty(metadata).map_err(|source| {
        ExportError::Metadata {
            path: path.to_path_buf(),
            source,
        }
    })?;
    json.push('\n');
    fs::write(path, json).map_err(|e| ExportError::io(path, e))
}
