//! Tests for the NPY header reader and small array decoder

use super::*;
use crate::NPY_MAGIC;
use std::io::{Cursor, Read};

/// Build an NPY container the way numpy lays it out (64-byte aligned header)
fn npy_bytes(major: u8, descr: &str, fortran: bool, shape: &str, payload: &[u8]) -> Vec<u8> {
    let dict = format!(
        "{{'descr': '{descr}', 'fortran_order': {}, 'shape': {shape}, }}",
        if fortran { "True" } else { "False" }
    );
    let prefix_width = if major == 1 { 2 } else { 4 };
    let unpadded = 8 + prefix_width + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let header_text = format!("{dict}{}\n", " ".repeat(padding));

    let mut out = Vec::new();
    out.extend_from_slice(NPY_MAGIC);
    out.push(major);
    out.push(0);
    if major == 1 {
        out.extend_from_slice(&(header_text.len() as u16).to_le_bytes());
    } else {
        out.extend_from_slice(&(header_text.len() as u32).to_le_bytes());
    }
    out.extend_from_slice(header_text.as_bytes());
    out.extend_from_slice(payload);
    out
}

fn f32_payload(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[test]
fn test_header_round_trip_3x2x1() {
    let values = [0.0f32, 0.25, 0.5, 0.75, 1.0, -1.0];
    let payload = f32_payload(&values);
    let data = npy_bytes(1, "<f4", false, "(3, 2, 1)", &payload);
    let mut cursor = Cursor::new(&data[..]);

    let header = read_npy_header(&mut cursor).unwrap();
    assert_eq!(header.version, (1, 0));
    assert_eq!(header.dtype, Dtype::F32);
    assert_eq!(header.shape, vec![3, 2, 1]);
    assert!(!header.column_major);
    assert_eq!(header.payload_offset as usize, data.len() - payload.len());
    assert_eq!(header.payload_offset % 64, 0);

    // Stream must sit exactly on the first payload byte
    assert_eq!(cursor.position(), header.payload_offset);
    let mut rest = Vec::new();
    cursor.read_to_end(&mut rest).unwrap();
    let decoded: Vec<f32> = rest
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(decoded, values);
}

#[test]
fn test_version_2_and_3_use_u32_length_prefix() {
    for major in [2u8, 3] {
        let data = npy_bytes(major, "<f8", false, "(2,)", &[0u8; 16]);
        let mut cursor = Cursor::new(&data[..]);
        let header = read_npy_header(&mut cursor).unwrap();
        assert_eq!(header.version, (major, 0));
        assert_eq!(header.dtype, Dtype::F64);
        assert_eq!(cursor.position(), header.payload_offset);
        assert_eq!(header.payload_offset as usize, data.len() - 16);
    }
}

#[test]
fn test_version_2_with_u16_length_prefix_rejected() {
    let mut data = npy_bytes(1, "<f4", false, "(1,)", &[0u8; 4]);
    data[6] = 2;
    let err = read_npy_header(&mut Cursor::new(&data[..])).unwrap_err();
    match err {
        FormatError::HeaderParseError { offset, message } => {
            assert_eq!(offset, 8);
            assert!(message.contains("2-byte prefix"), "{message}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_bad_magic() {
    let mut data = npy_bytes(1, "<f4", false, "(1,)", &[0u8; 4]);
    data[4] = b'Q'; // \x93NUMQY
    let err = read_npy_header(&mut Cursor::new(&data[..])).unwrap_err();
    assert!(matches!(err, FormatError::BadMagic { .. }));
}

#[test]
fn test_unsupported_version() {
    let mut data = npy_bytes(1, "<f4", false, "(1,)", &[0u8; 4]);
    data[6] = 4;
    let err = read_npy_header(&mut Cursor::new(&data[..])).unwrap_err();
    assert!(matches!(
        err,
        FormatError::UnsupportedVersion { major: 4, minor: 0 }
    ));

    let mut data = npy_bytes(1, "<f4", false, "(1,)", &[0u8; 4]);
    data[7] = 1;
    let err = read_npy_header(&mut Cursor::new(&data[..])).unwrap_err();
    assert!(matches!(
        err,
        FormatError::UnsupportedVersion { major: 1, minor: 1 }
    ));
}

#[test]
fn test_unsupported_dtypes() {
    for descr in ["<f2", ">f4", "|u1", "<c8"] {
        let data = npy_bytes(1, descr, false, "(1,)", &[0u8; 8]);
        let err = read_npy_header(&mut Cursor::new(&data[..])).unwrap_err();
        match err {
            FormatError::UnsupportedDtype(d) => assert_eq!(d, descr),
            other => panic!("unexpected error for {descr}: {other:?}"),
        }
    }
}

#[test]
fn test_truncated_header_text() {
    let data = npy_bytes(1, "<f4", false, "(1,)", &[]);
    let cut = &data[..40];
    let err = read_npy_header(&mut Cursor::new(cut)).unwrap_err();
    match err {
        FormatError::UnexpectedEof { offset, .. } => assert_eq!(offset, 40),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_truncated_preamble() {
    let err = read_npy_header(&mut Cursor::new(&b"\x93NUM"[..])).unwrap_err();
    assert!(matches!(err, FormatError::UnexpectedEof { offset: 4, .. }));
}

#[test]
fn test_malformed_header_text() {
    let mut data = npy_bytes(1, "<f4", false, "(1,)", &[0u8; 4]);
    // Replace the opening brace of the dict literal
    data[10] = b'[';
    let err = read_npy_header(&mut Cursor::new(&data[..])).unwrap_err();
    assert!(matches!(
        err,
        FormatError::HeaderParseError { offset: 10, .. }
    ));
}

#[test]
fn test_small_array_all_dtypes() {
    let cases: Vec<(&str, Vec<u8>, Vec<f64>)> = vec![
        ("<f4", f32_payload(&[-40.0, 40.0]), vec![-40.0, 40.0]),
        (
            "<f8",
            [-1.0f64, 5.4].iter().flat_map(|v| v.to_le_bytes()).collect(),
            vec![-1.0, 5.4],
        ),
        (
            "<i4",
            [-3i32, 7].iter().flat_map(|v| v.to_le_bytes()).collect(),
            vec![-3.0, 7.0],
        ),
        (
            "<i8",
            [-9i64, 11].iter().flat_map(|v| v.to_le_bytes()).collect(),
            vec![-9.0, 11.0],
        ),
        (
            "<u4",
            [400u32, 32].iter().flat_map(|v| v.to_le_bytes()).collect(),
            vec![400.0, 32.0],
        ),
        (
            "<u8",
            [400u64, 32].iter().flat_map(|v| v.to_le_bytes()).collect(),
            vec![400.0, 32.0],
        ),
    ];

    for (descr, payload, expected) in cases {
        let data = npy_bytes(1, descr, false, "(2,)", &payload);
        let mut cursor = Cursor::new(&data[..]);
        let header = read_npy_header(&mut cursor).unwrap();
        let values = read_small_array(&mut cursor, &header).unwrap();
        assert_eq!(values, expected, "dtype {descr}");
    }
}

#[test]
fn test_small_array_scalar() {
    let data = npy_bytes(1, "<f8", false, "()", &0.2f64.to_le_bytes());
    let mut cursor = Cursor::new(&data[..]);
    let header = read_npy_header(&mut cursor).unwrap();
    assert_eq!(header.element_count(), Some(1));
    assert_eq!(read_small_array(&mut cursor, &header).unwrap(), vec![0.2]);
}

#[test]
fn test_small_array_zero_elements() {
    let data = npy_bytes(1, "<f4", false, "(0,)", &[]);
    let mut cursor = Cursor::new(&data[..]);
    let header = read_npy_header(&mut cursor).unwrap();
    assert!(read_small_array(&mut cursor, &header).unwrap().is_empty());
}

#[test]
fn test_small_array_rejects_column_major() {
    let data = npy_bytes(1, "<f4", true, "(2, 2)", &[0u8; 16]);
    let mut cursor = Cursor::new(&data[..]);
    let header = read_npy_header(&mut cursor).unwrap();
    assert!(header.column_major);
    let err = read_small_array(&mut cursor, &header).unwrap_err();
    assert!(matches!(err, FormatError::UnsupportedMemoryOrder));
}

#[test]
fn test_small_array_rejects_large_arrays() {
    let data = npy_bytes(1, "<f4", false, "(400, 400, 32)", &[]);
    let mut cursor = Cursor::new(&data[..]);
    let header = read_npy_header(&mut cursor).unwrap();
    let err = read_small_array(&mut cursor, &header).unwrap_err();
    assert!(matches!(err, FormatError::ShapeMismatch(_)));
}

#[test]
fn test_small_array_truncated_payload() {
    let data = npy_bytes(1, "<f8", false, "(2,)", &[0u8; 12]);
    let mut cursor = Cursor::new(&data[..]);
    let header = read_npy_header(&mut cursor).unwrap();
    let err = read_small_array(&mut cursor, &header).unwrap_err();
    match err {
        FormatError::UnexpectedEof { offset, .. } => {
            assert_eq!(offset, header.payload_offset + 12)
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_element_count_overflow() {
    let header = NpyHeader {
        version: (1, 0),
        dtype: Dtype::F32,
        shape: vec![u64::MAX, 2],
        column_major: false,
        payload_offset: 128,
    };
    assert_eq!(header.element_count(), None);
    assert_eq!(header.payload_len(), None);
}

#[test]
fn test_dtype_descr_round_trip() {
    for dtype in [
        Dtype::F32,
        Dtype::F64,
        Dtype::I32,
        Dtype::I64,
        Dtype::U32,
        Dtype::U64,
    ] {
        assert_eq!(Dtype::from_descr(dtype.descr()).unwrap(), dtype);
    }
}
