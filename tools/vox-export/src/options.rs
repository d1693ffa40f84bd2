//! Conversion settings

use serde::Deserialize;

/// Default chunk size for streaming tensor payloads (1 MiB)
pub const DEFAULT_TENSOR_CHUNK_BYTES: usize = 1 << 20;

/// Default number of PLY records decoded per batch
pub const DEFAULT_PLY_BATCH_RECORDS: usize = 65536;

/// Largest accepted `tensor_chunk_bytes` (1 GiB)
pub const MAX_TENSOR_CHUNK_BYTES: usize = 1 << 30;

/// Largest accepted `ply_batch_records`
pub const MAX_PLY_BATCH_RECORDS: usize = 1 << 24;

/// Knobs shared by both converters
///
/// Deserializes from the `[settings]` table of a build manifest; missing keys
/// fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertOptions {
    /// Bytes read per chunk when copying a tensor payload
    pub tensor_chunk_bytes: usize,
    /// Vertex records decoded per batch for binary PLY payloads
    pub ply_batch_records: usize,
    /// Swap x and y of every emitted point (occupancy viewer convention)
    pub xy_swap: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            tensor_chunk_bytes: DEFAULT_TENSOR_CHUNK_BYTES,
            ply_batch_records: DEFAULT_PLY_BATCH_RECORDS,
            xy_swap: true,
        }
    }
}
