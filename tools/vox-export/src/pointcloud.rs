//! Point cloud converter (PLY -> .bin + .json)

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use vox_formats::read_ply_header;

use crate::error::ExportError;
use crate::metadata::{PointSource, point_cloud_metadata, write_metadata};
use crate::options::ConvertOptions;
use crate::output::{OutputPair, megabytes, write_payload};
use crate::points::stream_points;
use crate::{ConversionResult, ConversionSummary};

/// Convert a PLY point cloud to `<outdir>/<name>.bin` + `<outdir>/<name>.json`
///
/// Vertex x/y/z are emitted as packed little-endian f32 in file order;
/// every other property is dropped. `options.xy_swap` swaps the emitted x
/// and y before bounds are computed.
pub fn convert_point_cloud(
    input: &Path,
    outdir: &Path,
    name: &str,
    options: &ConvertOptions,
) -> Result<ConversionResult, ExportError> {
    let source_name = input.display().to_string();
    let file = File::open(input).map_err(|e| ExportError::io(input, e))?;
    let mut reader = BufReader::new(file);

    // The header is consumed line by line, so the reader is left at the payload
    let header = read_ply_header(&mut reader).map_err(|e| ExportError::format(&source_name, e))?;
    tracing::debug!(
        "{}: {} vertices, format {}, {} vertex properties, payload at byte {}",
        source_name,
        header.vertex_count,
        header.format_line(),
        header.properties.len(),
        header.header_len
    );

    let outputs = OutputPair::new(outdir, name);
    outputs.prepare()?;

    let stats = write_payload(&outputs.payload, |writer| {
        stream_points(
            &mut reader,
            &header,
            writer,
            options.ply_batch_records,
            options.xy_swap,
        )
        .map_err(|e| ExportError::format(&source_name, e))
    })?;

    let metadata = point_cloud_metadata(
        &outputs.payload_file_name(),
        stats.count,
        &stats.bounds,
        options.xy_swap,
        PointSource {
            ply: source_name,
            ply_format: header.format_line(),
            vertex_count: header.vertex_count,
        },
    );
    write_metadata(&outputs.metadata, &metadata)?;

    tracing::info!("Wrote {:?}", outputs.metadata);
    tracing::info!(
        "Wrote {:?} ({} points, {:.2} MB)",
        outputs.payload,
        stats.count,
        megabytes(stats.count * crate::points::POINT_STRIDE as u64)
    );

    Ok(ConversionResult {
        payload_path: outputs.payload,
        metadata_path: outputs.metadata,
        record_count: stats.count,
        summary: ConversionSummary::PointCloud {
            vertex_count: header.vertex_count,
            bounds: (&stats.bounds).into(),
        },
    })
}
