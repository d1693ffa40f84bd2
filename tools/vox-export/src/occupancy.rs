//! Occupancy grid converter (NPY / NPZ -> .bin + .json)

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use vox_formats::{read_fully, read_npy_header};

use crate::archive::{
    GRID_SHAPE_MEMBER, NpzArchive, VOXEL_SIZE_MEMBER, X_BOUNDS_MEMBER, Y_BOUNDS_MEMBER,
    Z_BOUNDS_MEMBER, ZIP_MAGIC,
};
use crate::error::ExportError;
use crate::metadata::{GridBounds, occupancy_metadata, write_metadata};
use crate::options::ConvertOptions;
use crate::output::{OutputPair, megabytes, write_payload};
use crate::tensor::{TensorStats, stream_tensor};
use crate::{ConversionResult, ConversionSummary};

pub const DEFAULT_X_BOUNDS: [f64; 2] = [-40.0, 40.0];
pub const DEFAULT_Y_BOUNDS: [f64; 2] = [-40.0, 40.0];
pub const DEFAULT_Z_BOUNDS: [f64; 2] = [-1.0, 5.4];
pub const DEFAULT_VOXEL_SIZE: f64 = 0.2;

/// Grid facts read from the optional NPZ members, before defaults apply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridMembers {
    pub x_bounds: Option<Vec<f64>>,
    pub y_bounds: Option<Vec<f64>>,
    pub z_bounds: Option<Vec<f64>>,
    pub voxel_size: Option<Vec<f64>>,
    pub grid_shape: Option<Vec<f64>>,
}

/// Grid facts with every default applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridDescriptor {
    pub bounds: GridBounds,
    pub voxel_size: f64,
    /// `None` means "use the tensor's own shape"
    pub grid_shape: Option<[u64; 3]>,
}

impl GridMembers {
    /// Read every optional member present in the archive
    pub fn read<R: Read + std::io::Seek>(archive: &mut NpzArchive<R>) -> Result<Self, ExportError> {
        Ok(Self {
            x_bounds: archive.read_small_member(X_BOUNDS_MEMBER)?,
            y_bounds: archive.read_small_member(Y_BOUNDS_MEMBER)?,
            z_bounds: archive.read_small_member(Z_BOUNDS_MEMBER)?,
            voxel_size: archive.read_small_member(VOXEL_SIZE_MEMBER)?,
            grid_shape: archive.read_small_member(GRID_SHAPE_MEMBER)?,
        })
    }

    /// Apply defaults; `source` prefixes error messages
    ///
    /// Bounds need at least two values, voxel size one, grid shape three;
    /// extra values are ignored.
    pub fn resolve(&self, source: &str) -> Result<GridDescriptor, ExportError> {
        let invalid = |member: &str, message: String| ExportError::InvalidMember {
            source_name: format!("{source}:{member}"),
            message,
        };

        let pair = |values: &Option<Vec<f64>>, member: &str, default: [f64; 2]| match values {
            None => {
                tracing::warn!("{}: {} absent, using default {:?}", source, member, default);
                Ok(default)
            }
            Some(v) if v.len() >= 2 => Ok([v[0], v[1]]),
            Some(v) => Err(invalid(
                member,
                format!("expected at least 2 values, found {}", v.len()),
            )),
        };

        let bounds = GridBounds {
            x: pair(&self.x_bounds, X_BOUNDS_MEMBER, DEFAULT_X_BOUNDS)?,
            y: pair(&self.y_bounds, Y_BOUNDS_MEMBER, DEFAULT_Y_BOUNDS)?,
            z: pair(&self.z_bounds, Z_BOUNDS_MEMBER, DEFAULT_Z_BOUNDS)?,
        };

        let voxel_size = match self.voxel_size.as_deref() {
            None => {
                tracing::warn!(
                    "{}: {} absent, using default {}",
                    source,
                    VOXEL_SIZE_MEMBER,
                    DEFAULT_VOXEL_SIZE
                );
                DEFAULT_VOXEL_SIZE
            }
            Some([first, ..]) => *first,
            Some([]) => {
                return Err(invalid(VOXEL_SIZE_MEMBER, "expected a value, found none".into()));
            }
        };

        let grid_shape = match self.grid_shape.as_deref() {
            None => None,
            Some(v) if v.len() >= 3 => {
                let mut dims = [0u64; 3];
                for (dim, &value) in dims.iter_mut().zip(v) {
                    if !(value.is_finite() && value >= 0.0 && value.fract() == 0.0) {
                        return Err(invalid(
                            GRID_SHAPE_MEMBER,
                            format!("{value} is not a non-negative integer"),
                        ));
                    }
                    *dim = value as u64;
                }
                Some(dims)
            }
            Some(v) => {
                return Err(invalid(
                    GRID_SHAPE_MEMBER,
                    format!("expected at least 3 values, found {}", v.len()),
                ));
            }
        };

        Ok(GridDescriptor {
            bounds,
            voxel_size,
            grid_shape,
        })
    }
}

/// Convert an occupancy grid to `<outdir>/<name>.bin` + `<outdir>/<name>.json`
///
/// `input` may be an NPZ archive (detected by its zip signature) holding
/// `occupancy.npy` or `arr_0.npy` plus optional metadata members, or a bare
/// NPY file, in which case every grid default applies. The tensor must be a
/// row-major 3D `<f4` array.
pub fn convert_occupancy(
    input: &Path,
    outdir: &Path,
    name: &str,
    options: &ConvertOptions,
) -> Result<ConversionResult, ExportError> {
    let outputs = OutputPair::new(outdir, name);
    outputs.prepare()?;

    let (stats, grid) = if is_zip(input)? {
        let mut archive = NpzArchive::open(input)?;
        let member = archive.occupancy_member()?;
        tracing::debug!("{:?}: occupancy member {}", input, member);

        let grid = GridMembers::read(&mut archive)?.resolve(&input.display().to_string())?;
        let source_name = archive.source_name(member);
        let stats = archive.with_member(member, |reader| {
            copy_tensor(reader, &source_name, &outputs.payload, options)
        })?;
        (stats, grid)
    } else {
        let file = File::open(input).map_err(|e| ExportError::io(input, e))?;
        let mut reader = BufReader::new(file);
        let grid = GridMembers::default().resolve(&input.display().to_string())?;
        let stats = copy_tensor(
            &mut reader,
            &input.display().to_string(),
            &outputs.payload,
            options,
        )?;
        (stats, grid)
    };

    let grid_shape = grid.grid_shape.unwrap_or(stats.shape);
    let metadata = occupancy_metadata(
        &outputs.payload_file_name(),
        grid_shape,
        grid.bounds,
        grid.voxel_size,
        stats.value_range,
    );
    write_metadata(&outputs.metadata, &metadata)?;

    tracing::info!("Wrote {:?}", outputs.metadata);
    tracing::info!(
        "Wrote {:?} ({:.2} MB, shape {:?})",
        outputs.payload,
        megabytes(stats.bytes_written),
        stats.shape
    );

    Ok(ConversionResult {
        payload_path: outputs.payload,
        metadata_path: outputs.metadata,
        record_count: stats.shape.iter().product(),
        summary: ConversionSummary::Occupancy {
            declared_shape: stats.shape,
            grid_shape,
            value_range: stats.value_range,
        },
    })
}

/// Header read + streaming copy of one tensor into `payload`
fn copy_tensor(
    reader: &mut dyn Read,
    source_name: &str,
    payload: &Path,
    options: &ConvertOptions,
) -> Result<TensorStats, ExportError> {
    let header = read_npy_header(reader).map_err(|e| ExportError::format(source_name, e))?;
    tracing::debug!(
        "{}: dtype {} shape {:?} payload at byte {}",
        source_name,
        header.dtype.descr(),
        header.shape,
        header.payload_offset
    );

    // Reject before touching the output file
    crate::tensor::validate_f32_grid(&header).map_err(|e| ExportError::format(source_name, e))?;

    write_payload(payload, |writer| {
        stream_tensor(reader, &header, writer, options.tensor_chunk_bytes)
            .map_err(|e| ExportError::format(source_name, e))
    })
}

/// Sniff the zip local-file signature
fn is_zip(path: &Path) -> Result<bool, ExportError> {
    let mut file = File::open(path).map_err(|e| ExportError::io(path, e))?;
    let mut magic = [0u8; 4];
    let n = read_fully(&mut file, &mut magic).map_err(|e| ExportError::io(path, e))?;
    Ok(n == magic.len() && &magic == ZIP_MAGIC)
}
