//! Low-level stream helpers shared by the NPY and PLY readers

use std::io::{ErrorKind, Read};

use crate::error::FormatError;

/// Read until `buf` is full or the stream ends
///
/// Returns the number of bytes placed in `buf`. A return value smaller than
/// `buf.len()` means the stream hit end-of-file; callers decide whether that
/// is an error. Interrupted reads are retried.
pub fn read_fully<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Fill `buf` completely, reporting a short read as `UnexpectedEof`
///
/// `offset` is the container position of `buf[0]`; the reported offset is
/// where the stream actually ended.
pub(crate) fn read_exact_at<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    offset: u64,
    context: &str,
) -> Result<(), FormatError> {
    let got = read_fully(reader, buf)?;
    if got < buf.len() {
        return Err(FormatError::eof(offset + got as u64, context));
    }
    Ok(())
}
