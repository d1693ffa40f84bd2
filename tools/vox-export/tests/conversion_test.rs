//! Integration tests for the converters.
//!
//! Tests the complete flow:
//! 1. Generate NPZ / NPY / PLY inputs programmatically
//! 2. Convert through the vox-export library
//! 3. Validate payload bytes and JSON descriptors

mod fixture_generator;

use std::path::Path;

use serde_json::{Value, json};
use tempfile::tempdir;
use vox_export::{
    ConversionSummary, ConvertOptions, ExportError, convert_occupancy, convert_point_cloud,
};
use vox_formats::FormatError;

fn read_json(path: &Path) -> Value {
    let text = std::fs::read_to_string(path).expect("Failed to read metadata");
    serde_json::from_str(&text).expect("Metadata is not valid JSON")
}

fn decode_points(data: &[u8]) -> Vec<[f32; 3]> {
    data.chunks_exact(12)
        .map(|r| {
            let f = |o: usize| f32::from_le_bytes(r[o..o + 4].try_into().unwrap());
            [f(0), f(4), f(8)]
        })
        .collect()
}

#[test]
fn test_npz_with_all_members() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("occ.npz");
    std::fs::write(&input, fixture_generator::full_occupancy_npz()).unwrap();

    let options = ConvertOptions::default();
    let result = convert_occupancy(&input, dir.path(), "occ_frame000121", &options)
        .expect("conversion failed");

    // Payload is the tensor data, byte for byte
    let payload = std::fs::read(&result.payload_path).unwrap();
    assert_eq!(
        payload,
        fixture_generator::f32_bytes(&fixture_generator::occupancy_values())
    );
    assert_eq!(result.record_count, 12);

    let meta = read_json(&result.metadata_path);
    assert_eq!(
        meta,
        json!({
            "occupancy_file": "occ_frame000121.bin",
            "grid_shape": [3, 2, 2],
            "bounds": {"x": [-12.0, 12.0], "y": [-8.0, 8.0], "z": [-1.0, 3.0]},
            "voxel_size": 0.4,
            "occupancy_range": [0.0, 1.1],
        })
    );
}

#[test]
fn test_npz_defaults_and_arr_0_fallback() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("occ.npz");
    let values = [0.5f32; 8];
    std::fs::write(
        &input,
        fixture_generator::npz(
            &[("arr_0.npy", fixture_generator::npy_f32("(2, 2, 2)", &values))],
            false,
        ),
    )
    .unwrap();

    let result = convert_occupancy(&input, dir.path(), "occ", &ConvertOptions::default()).unwrap();
    let meta = read_json(&result.metadata_path);
    assert_eq!(meta["grid_shape"], json!([2, 2, 2]));
    assert_eq!(meta["bounds"]["x"], json!([-40.0, 40.0]));
    assert_eq!(meta["bounds"]["y"], json!([-40.0, 40.0]));
    assert_eq!(meta["bounds"]["z"], json!([-1.0, 5.4]));
    assert_eq!(meta["voxel_size"], json!(0.2));
    assert_eq!(meta["occupancy_range"], json!([0.5, 0.5]));
}

#[test]
fn test_compressed_npz() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("occ.npz");
    let values: Vec<f32> = (0..64).map(|i| (i % 7) as f32).collect();
    std::fs::write(
        &input,
        fixture_generator::npz(
            &[("occupancy.npy", fixture_generator::npy_f32("(4, 4, 4)", &values))],
            true,
        ),
    )
    .unwrap();

    let options = ConvertOptions {
        tensor_chunk_bytes: 12,
        ..Default::default()
    };
    let result = convert_occupancy(&input, dir.path(), "occ", &options).unwrap();
    assert_eq!(
        std::fs::read(&result.payload_path).unwrap(),
        fixture_generator::f32_bytes(&values)
    );
    match result.summary {
        ConversionSummary::Occupancy { value_range, .. } => {
            assert_eq!(value_range, Some([0.0, 6.0]))
        }
        other => panic!("unexpected summary {other:?}"),
    }
}

#[test]
fn test_plain_npy_input() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("grid.npy");
    std::fs::write(
        &input,
        fixture_generator::npy_f32("(1, 2, 2)", &[1.0, f32::NAN, -3.0, 2.0]),
    )
    .unwrap();

    let outdir = dir.path().join("web/data");
    let result = convert_occupancy(&input, &outdir, "grid", &ConvertOptions::default()).unwrap();
    assert!(outdir.join("grid.bin").exists());
    // NaN is copied but does not affect the range
    let meta = read_json(&result.metadata_path);
    assert_eq!(meta["occupancy_range"], json!([-3.0, 2.0]));
}

#[test]
fn test_missing_occupancy_member() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("occ.npz");
    std::fs::write(
        &input,
        fixture_generator::npz(
            &[("voxel_size.npy", fixture_generator::npy_f64("()", &[0.2]))],
            false,
        ),
    )
    .unwrap();

    let err = convert_occupancy(&input, dir.path(), "occ", &ConvertOptions::default()).unwrap_err();
    match err {
        ExportError::ArchiveMemberMissing { expected, .. } => {
            assert_eq!(expected, vec!["occupancy.npy", "arr_0.npy"]);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!dir.path().join("occ.json").exists());
}

#[test]
fn test_wrong_dtype_tensor_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("occ.npz");
    std::fs::write(
        &input,
        fixture_generator::npz(
            &[(
                "occupancy.npy",
                fixture_generator::npy_f64("(2, 1, 1)", &[0.0, 1.0]),
            )],
            false,
        ),
    )
    .unwrap();

    let err = convert_occupancy(&input, dir.path(), "occ", &ConvertOptions::default()).unwrap_err();
    assert!(matches!(
        err.format_error(),
        Some(FormatError::UnsupportedDtype(_))
    ));
    assert!(err.to_string().contains("occupancy.npy"));
    assert!(!dir.path().join("occ.json").exists());
}

#[test]
fn test_truncated_tensor_leaves_no_metadata() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("grid.npy");
    let mut data = fixture_generator::npy_f32("(2, 2, 2)", &[1.0; 8]);
    data.truncate(data.len() - 6);
    std::fs::write(&input, &data).unwrap();

    let err =
        convert_occupancy(&input, dir.path(), "grid", &ConvertOptions::default()).unwrap_err();
    match err.format_error() {
        Some(FormatError::UnexpectedEof { offset, .. }) => {
            assert_eq!(*offset, data.len() as u64);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!dir.path().join("grid.json").exists());
}

#[test]
fn test_short_bounds_member_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("occ.npz");
    std::fs::write(
        &input,
        fixture_generator::npz(
            &[
                ("occupancy.npy", fixture_generator::npy_f32("(1, 1, 1)", &[1.0])),
                ("x_bounds.npy", fixture_generator::npy_f64("(1,)", &[5.0])),
            ],
            false,
        ),
    )
    .unwrap();

    let err = convert_occupancy(&input, dir.path(), "occ", &ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, ExportError::InvalidMember { .. }));
}

#[test]
fn test_binary_ply_with_swap() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("vigt.ply");
    let points = [[1.0f32, 2.0, 3.0], [-4.0, 0.5, 9.0], [7.0, -6.0, -1.0]];
    std::fs::write(&input, fixture_generator::binary_xyz_rgb_ply(&points)).unwrap();

    let options = ConvertOptions {
        ply_batch_records: 2,
        ..Default::default()
    };
    let result = convert_point_cloud(&input, dir.path(), "vigt_frame000121", &options).unwrap();

    let payload = std::fs::read(&result.payload_path).unwrap();
    assert_eq!(payload.len(), points.len() * 12);
    let expected: Vec<[f32; 3]> = points.iter().map(|[x, y, z]| [*y, *x, *z]).collect();
    assert_eq!(decode_points(&payload), expected);

    let meta = read_json(&result.metadata_path);
    assert_eq!(meta["points_file"], json!("vigt_frame000121.bin"));
    assert_eq!(meta["count"], json!(3));
    assert_eq!(meta["stride_bytes"], json!(12));
    assert_eq!(
        meta["attributes"],
        json!([{"name": "position", "type": "float32", "components": 3, "offset": 0}])
    );
    assert_eq!(meta["bounds"]["x"], json!([-6.0, 2.0]));
    assert_eq!(meta["bounds"]["y"], json!([-4.0, 7.0]));
    assert_eq!(meta["bounds"]["z"], json!([-1.0, 9.0]));
    assert_eq!(
        meta["convention"],
        json!({"up_axis": "Z", "xy_swap": true, "data_is_swapped": true})
    );
    assert_eq!(meta["source"]["ply_format"], json!("binary_little_endian 1.0"));
    assert_eq!(meta["source"]["vertex_count"], json!(3));
    assert_eq!(meta["source"]["ply"], json!(input.display().to_string()));
}

#[test]
fn test_ascii_ply_without_swap() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("scan.ply");
    std::fs::write(
        &input,
        fixture_generator::ascii_ply(&[[1.25, -2.5, 0.0], [3.0, 4.0, 5.5]]),
    )
    .unwrap();

    let options = ConvertOptions {
        xy_swap: false,
        ..Default::default()
    };
    let result = convert_point_cloud(&input, dir.path(), "scan", &options).unwrap();
    let payload = std::fs::read(&result.payload_path).unwrap();
    assert_eq!(
        decode_points(&payload),
        vec![[1.25, -2.5, 0.0], [3.0, 4.0, 5.5]]
    );

    let meta = read_json(&result.metadata_path);
    assert_eq!(meta["convention"]["xy_swap"], json!(false));
    assert_eq!(meta["source"]["ply_format"], json!("ascii 1.0"));
}

#[test]
fn test_empty_point_cloud() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("empty.ply");
    std::fs::write(&input, fixture_generator::binary_xyz_rgb_ply(&[])).unwrap();

    let result =
        convert_point_cloud(&input, dir.path(), "empty", &ConvertOptions::default()).unwrap();
    assert_eq!(result.record_count, 0);
    assert!(std::fs::read(&result.payload_path).unwrap().is_empty());
    let meta = read_json(&result.metadata_path);
    assert_eq!(meta["bounds"], json!({"x": null, "y": null, "z": null}));
}

#[test]
fn test_truncated_binary_ply() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("cut.ply");
    let mut data = fixture_generator::binary_xyz_rgb_ply(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    data.truncate(data.len() - 4);
    std::fs::write(&input, &data).unwrap();

    let err =
        convert_point_cloud(&input, dir.path(), "cut", &ConvertOptions::default()).unwrap_err();
    assert!(matches!(
        err.format_error(),
        Some(FormatError::UnexpectedEof { .. })
    ));
    // Partial payload may exist, the descriptor must not
    assert!(!dir.path().join("cut.json").exists());
}

#[test]
fn test_failed_rerun_removes_previous_point_descriptor() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("cloud.ply");
    let data = fixture_generator::binary_xyz_rgb_ply(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    std::fs::write(&input, &data).unwrap();

    let options = ConvertOptions::default();
    let result = convert_point_cloud(&input, dir.path(), "cloud", &options).unwrap();
    assert!(result.metadata_path.exists());

    // Same output name, source now cut short
    std::fs::write(&input, &data[..data.len() - 4]).unwrap();
    let err = convert_point_cloud(&input, dir.path(), "cloud", &options).unwrap_err();
    assert!(matches!(
        err.format_error(),
        Some(FormatError::UnexpectedEof { .. })
    ));
    assert!(!result.metadata_path.exists());
}

#[test]
fn test_failed_rerun_removes_previous_occupancy_descriptor() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("grid.npy");
    let data = fixture_generator::npy_f32("(2, 2, 2)", &[1.0; 8]);
    std::fs::write(&input, &data).unwrap();

    let options = ConvertOptions::default();
    let result = convert_occupancy(&input, dir.path(), "grid", &options).unwrap();
    assert!(result.metadata_path.exists());

    std::fs::write(&input, &data[..data.len() - 6]).unwrap();
    let err = convert_occupancy(&input, dir.path(), "grid", &options).unwrap_err();
    assert!(matches!(
        err.format_error(),
        Some(FormatError::UnexpectedEof { .. })
    ));
    assert!(!result.metadata_path.exists());
    assert!(!dir.path().join("grid.json").exists());
}
