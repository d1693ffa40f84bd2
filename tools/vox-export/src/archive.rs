//! NPZ archive access: named NPY members inside a zip container

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use vox_formats::{read_npy_header, read_small_array};
use zip::ZipArchive;

use crate::error::ExportError;

/// Member names tried, in order, for the occupancy tensor
pub const OCCUPANCY_MEMBERS: [&str; 2] = ["occupancy.npy", "arr_0.npy"];

pub const X_BOUNDS_MEMBER: &str = "x_bounds.npy";
pub const Y_BOUNDS_MEMBER: &str = "y_bounds.npy";
pub const Z_BOUNDS_MEMBER: &str = "z_bounds.npy";
pub const VOXEL_SIZE_MEMBER: &str = "voxel_size.npy";
pub const GRID_SHAPE_MEMBER: &str = "grid_shape.npy";

/// Zip local file header signature
pub const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// An open NPZ archive
pub struct NpzArchive<R: Read + Seek> {
    path: PathBuf,
    zip: ZipArchive<R>,
}

impl NpzArchive<BufReader<File>> {
    /// Open an archive on disk
    pub fn open(path: &Path) -> Result<Self, ExportError> {
        let file = File::open(path).map_err(|e| ExportError::io(path, e))?;
        Self::new(path, BufReader::new(file))
    }
}

impl<R: Read + Seek> NpzArchive<R> {
    /// Wrap an already opened stream; `path` is used for error messages
    pub fn new(path: &Path, reader: R) -> Result<Self, ExportError> {
        let zip = ZipArchive::new(reader).map_err(|source| ExportError::Archive {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            zip,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a member with this exact name exists
    pub fn contains(&self, member: &str) -> bool {
        self.zip.file_names().any(|name| name == member)
    }

    /// Member names in archive order
    pub fn member_names(&self) -> Vec<String> {
        self.zip.file_names().map(str::to_string).collect()
    }

    /// First present occupancy member name
    pub fn occupancy_member(&self) -> Result<&'static str, ExportError> {
        OCCUPANCY_MEMBERS
            .iter()
            .copied()
            .find(|m| self.contains(m))
            .ok_or_else(|| ExportError::ArchiveMemberMissing {
                archive: self.path.clone(),
                expected: OCCUPANCY_MEMBERS.iter().map(|m| m.to_string()).collect(),
            })
    }

    /// Name used in errors for a member, e.g. `scene.npz:occupancy.npy`
    pub fn source_name(&self, member: &str) -> String {
        format!("{}:{}", self.path.display(), member)
    }

    /// Run `f` with a buffered reader over one member's bytes
    ///
    /// The member stream is dropped before this returns, on success and on
    /// error alike.
    pub fn with_member<T>(
        &mut self,
        member: &str,
        f: impl FnOnce(&mut dyn Read) -> Result<T, ExportError>,
    ) -> Result<T, ExportError> {
        let file = self
            .zip
            .by_name(member)
            .map_err(|source| ExportError::Archive {
                path: self.path.clone(),
                source,
            })?;
        let mut reader = BufReader::new(file);
        f(&mut reader)
    }

    /// Decode a small metadata member, or `None` if it is absent
    pub fn read_small_member(&mut self, member: &str) -> Result<Option<Vec<f64>>, ExportError> {
        if !self.contains(member) {
            return Ok(None);
        }
        let source_name = self.source_name(member);
        let values = self.with_member(member, |reader| {
            let header =
                read_npy_header(reader).map_err(|e| ExportError::format(&source_name, e))?;
            read_small_array(reader, &header).map_err(|e| ExportError::format(&source_name, e))
        })?;
        tracing::debug!("{}: {:?}", source_name, values);
        Ok(Some(values))
    }
}
