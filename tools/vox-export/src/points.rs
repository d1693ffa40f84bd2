//! Streaming conversion of PLY vertex payloads to packed float32 xyz

use std::io::{BufRead, Write};

use vox_formats::{FormatError, PlyEncoding, PlyHeader, read_fully};

use crate::stats::AxisBounds;

/// Bytes per emitted point: three little-endian f32
pub const POINT_STRIDE: usize = 12;

/// Outcome of a point payload conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointStats {
    /// Points written (always the declared vertex count on success)
    pub count: u64,
    /// Per-axis ranges over the emitted (post-swap) coordinates
    pub bounds: AxisBounds,
}

/// Buffers packed points and tracks bounds until flushed
struct PointSink {
    out: Vec<u8>,
    bounds: AxisBounds,
    count: u64,
    xy_swap: bool,
}

impl PointSink {
    fn new(batch_bytes: usize, xy_swap: bool) -> Self {
        Self {
            out: Vec::with_capacity(batch_bytes),
            bounds: AxisBounds::default(),
            count: 0,
            xy_swap,
        }
    }

    #[inline]
    fn push(&mut self, [x, y, z]: [f32; 3]) {
        let point = if self.xy_swap { [y, x, z] } else { [x, y, z] };
        self.bounds.push(point);
        for v in point {
            self.out.extend_from_slice(&v.to_le_bytes());
        }
        self.count += 1;
    }

    fn flush<W: Write + ?Sized>(&mut self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.out)?;
        self.out.clear();
        Ok(())
    }

    fn finish(self) -> PointStats {
        PointStats {
            count: self.count,
            bounds: self.bounds,
        }
    }
}

/// Convert the vertex payload of a PLY file
///
/// `reader` must be positioned at `header.header_len`. Exactly
/// `header.vertex_count` records of [`POINT_STRIDE`] bytes are written. With
/// `xy_swap` the emitted x holds the source y and vice versa; z is never
/// swapped.
pub fn stream_points<R, W>(
    reader: &mut R,
    header: &PlyHeader,
    writer: &mut W,
    batch_records: usize,
    xy_swap: bool,
) -> Result<PointStats, FormatError>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    // Never buffer more records than the file declares
    let batch_records = usize::try_from(header.vertex_count)
        .map_or(batch_records, |count| batch_records.min(count))
        .max(1);
    let batch_bytes = batch_records.checked_mul(POINT_STRIDE).ok_or_else(|| {
        FormatError::ShapeMismatch(format!(
            "batch of {batch_records} points overflows the output buffer size"
        ))
    })?;
    match header.encoding {
        PlyEncoding::Ascii => stream_ascii(reader, header, writer, batch_bytes, xy_swap),
        PlyEncoding::BinaryLittleEndian => {
            stream_binary(reader, header, writer, batch_records, batch_bytes, xy_swap)
        }
    }
}

fn stream_ascii<R, W>(
    reader: &mut R,
    header: &PlyHeader,
    writer: &mut W,
    batch_bytes: usize,
    xy_swap: bool,
) -> Result<PointStats, FormatError>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    let count = header.vertex_count;
    let declared = header.properties.len();
    let idx = header.coordinates;

    let mut sink = PointSink::new(batch_bytes, xy_swap);
    let mut offset = header.header_len;
    let mut line = Vec::new();

    for index in 0..count {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            return Err(FormatError::UnexpectedEof {
                offset,
                context: format!("ASCII vertex {index} of {count}"),
            });
        }
        offset += n as u64;

        let malformed = |message: String| FormatError::MalformedRecord { index, message };
        let text = std::str::from_utf8(&line)
            .map_err(|_| malformed("record is not valid text".to_string()))?;
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() < declared {
            return Err(malformed(format!(
                "expected {declared} values, found {}",
                tokens.len()
            )));
        }

        let parse = |i: usize| {
            tokens[i].parse::<f32>().map_err(|_| {
                malformed(format!(
                    "{:?} is not a number (property {})",
                    tokens[i], header.properties[i].name
                ))
            })
        };
        sink.push([parse(idx.x)?, parse(idx.y)?, parse(idx.z)?]);

        if sink.out.len() >= batch_bytes {
            sink.flush(writer)?;
        }
    }

    sink.flush(writer)?;
    Ok(sink.finish())
}

fn stream_binary<R, W>(
    reader: &mut R,
    header: &PlyHeader,
    writer: &mut W,
    batch_records: usize,
    batch_bytes: usize,
    xy_swap: bool,
) -> Result<PointStats, FormatError>
where
    R: BufRead + ?Sized,
    W: Write + ?Sized,
{
    let layout = header.record_layout()?;
    let mut sink = PointSink::new(batch_bytes, xy_swap);
    let mut buf = Vec::new();
    let mut remaining = header.vertex_count;
    let mut offset = header.header_len;

    while remaining > 0 {
        let n = remaining.min(batch_records as u64) as usize;
        let want = n.checked_mul(layout.stride).ok_or_else(|| {
            FormatError::ShapeMismatch(format!("{n} records of {} bytes", layout.stride))
        })?;
        buf.resize(want, 0);

        let got = read_fully(reader, &mut buf)?;
        if got != want {
            return Err(FormatError::UnexpectedEof {
                offset: offset + got as u64,
                context: format!(
                    "binary vertex payload: expected {want} bytes, got {got} \
                     ({} of {} vertices decoded)",
                    sink.count, header.vertex_count
                ),
            });
        }
        offset += want as u64;

        for record in buf.chunks_exact(layout.stride) {
            let [x, y, z] = layout.read_xyz(record);
            sink.push([x as f32, y as f32, z as f32]);
        }
        sink.flush(writer)?;
        remaining -= n as u64;
    }

    Ok(sink.finish())
}
