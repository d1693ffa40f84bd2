//! Programmatic input generation for integration tests.
//!
//! Builds NPY arrays, NPZ archives (stored or deflated, like `np.savez` and
//! `np.savez_compressed`) and PLY point clouds in memory.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Version 1.0 NPY file with a 64-byte aligned header
pub fn npy(descr: &str, shape: &str, payload: &[u8]) -> Vec<u8> {
    let dict = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}");
    let unpadded = 10 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let text = format!("{dict}{}\n", " ".repeat(padding));

    let mut out = b"\x93NUMPY\x01\x00".to_vec();
    out.extend_from_slice(&(text.len() as u16).to_le_bytes());
    out.extend_from_slice(text.as_bytes());
    out.extend_from_slice(payload);
    out
}

pub fn npy_f32(shape: &str, values: &[f32]) -> Vec<u8> {
    npy("<f4", shape, &f32_bytes(values))
}

pub fn npy_f64(shape: &str, values: &[f64]) -> Vec<u8> {
    let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    npy("<f8", shape, &payload)
}

pub fn npy_i64(shape: &str, values: &[i64]) -> Vec<u8> {
    let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    npy("<i8", shape, &payload)
}

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Zip archive of named members
pub fn npz(members: &[(&str, Vec<u8>)], compressed: bool) -> Vec<u8> {
    let method = if compressed {
        CompressionMethod::Deflated
    } else {
        CompressionMethod::Stored
    };
    let options = SimpleFileOptions::default().compression_method(method);

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in members {
        writer.start_file(*name, options).expect("start member");
        writer.write_all(data).expect("write member");
    }
    writer.finish().expect("finish archive").into_inner()
}

/// 3x2x2 occupancy grid with values 0.0, 0.1, ... 1.1
pub fn occupancy_values() -> Vec<f32> {
    (0..12).map(|i| i as f32 / 10.0).collect()
}

/// NPZ with an occupancy tensor and every metadata member
pub fn full_occupancy_npz() -> Vec<u8> {
    npz(
        &[
            ("occupancy.npy", npy_f32("(3, 2, 2)", &occupancy_values())),
            ("x_bounds.npy", npy_f64("(2,)", &[-12.0, 12.0])),
            ("y_bounds.npy", npy_f64("(2,)", &[-8.0, 8.0])),
            ("z_bounds.npy", npy_f32("(2,)", &[-1.0, 3.0])),
            ("voxel_size.npy", npy_f64("()", &[0.4])),
            ("grid_shape.npy", npy_i64("(3,)", &[3, 2, 2])),
        ],
        false,
    )
}

/// Binary little-endian PLY with float xyz followed by uchar rgb
pub fn binary_xyz_rgb_ply(points: &[[f32; 3]]) -> Vec<u8> {
    let mut out = format!(
        "ply\nformat binary_little_endian 1.0\ncomment generated\nelement vertex {}\n\
property float x\nproperty float y\nproperty float z\n\
property uchar red\nproperty uchar green\nproperty uchar blue\n\
element face 0\nproperty list uchar int vertex_indices\nend_header\n",
        points.len()
    )
    .into_bytes();
    for p in points {
        out.extend_from_slice(&f32_bytes(p));
        out.extend_from_slice(&[255, 128, 0]);
    }
    out
}

/// ASCII PLY with double xyz and an intensity column
pub fn ascii_ply(points: &[[f64; 3]]) -> Vec<u8> {
    let mut out = format!(
        "ply\r\nformat ascii 1.0\r\nelement vertex {}\r\nproperty double x\r\n\
property double y\r\nproperty double z\r\nproperty float intensity\r\nend_header\r\n",
        points.len()
    );
    for [x, y, z] in points {
        out.push_str(&format!("{x} {y} {z} 0.5\r\n"));
    }
    out.into_bytes()
}
