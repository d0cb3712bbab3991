#![allow(dead_code)]

use std::path::Path;

use ndarray::Array4;
use neuroformats::{FsMgh, FsMghData, FsMghHeader, MRI_FLOAT, MRI_INT, write_mgh};

pub fn write_surface_mgh(path: &Path, values: &[f64], dtype: i32) {
    let n = values.len();
    let mut data = FsMghData {
        mri_uchar: None,
        mri_float: None,
        mri_int: None,
        mri_short: None,
    };
    match dtype {
        MRI_INT => {
            let ints = values.iter().map(|&v| v as i32).collect();
            data.mri_int = Some(Array4::from_shape_vec((n, 1, 1, 1), ints).unwrap());
        }
        MRI_FLOAT => {
            let floats = values.iter().map(|&v| v as f32).collect();
            data.mri_float = Some(Array4::from_shape_vec((n, 1, 1, 1), floats).unwrap());
        }
        other => panic!("unsupported fixture dtype {other}"),
    }
    let header = FsMghHeader {
        dim1len: n as i32,
        dim2len: 1,
        dim3len: 1,
        dim4len: 1,
        dtype,
        ..FsMghHeader::default()
    };
    write_mgh(path, &FsMgh { header, data }).unwrap();
}

// Overwrites one of the seven leading big-endian header fields.
pub fn patch_header_field(path: &Path, index: usize, value: i32) {
    let mut bytes = std::fs::read(path).unwrap();
    bytes[index * 4..index * 4 + 4].copy_from_slice(&value.to_be_bytes());
    std::fs::write(path, bytes).unwrap();
}
