use std::path::Path;

use ndarray::{Array4, ShapeBuilder};
use neuroformats::{FsMgh, FsMghHeader};
use tracing::debug;

use crate::error::{BrainMappError, Result};
use crate::qc::check_file_exists;

const MGH_VERSION: i32 = 1;
pub const DATA_OFFSET: u64 = 284;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MghDtype {
    Uchar,
    Int,
    Float,
    Short,
}

impl MghDtype {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(MghDtype::Uchar),
            1 => Some(MghDtype::Int),
            3 => Some(MghDtype::Float),
            4 => Some(MghDtype::Short),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            MghDtype::Uchar => 0,
            MghDtype::Int => 1,
            MghDtype::Float => 3,
            MghDtype::Short => 4,
        }
    }

    pub fn width(self) -> usize {
        match self {
            MghDtype::Uchar => 1,
            MghDtype::Short => 2,
            MghDtype::Int | MghDtype::Float => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MghHeader {
    pub dims: [usize; 4],
    pub dtype: MghDtype,
}

impl MghHeader {
    pub fn from_fields(version: i32, dims: [i32; 4], dtype: i32, path: &Path) -> Result<Self> {
        if version != MGH_VERSION {
            return Err(BrainMappError::format(
                path,
                format!("unsupported MGH version {version}"),
            ));
        }

        let mut checked = [0usize; 4];
        for (axis, (&raw, dim)) in dims.iter().zip(checked.iter_mut()).enumerate() {
            if raw < 1 {
                return Err(BrainMappError::format(
                    path,
                    format!("invalid dimension {raw} on axis {axis}"),
                ));
            }
            *dim = raw as usize;
        }

        let dtype = MghDtype::from_code(dtype)
            .ok_or_else(|| BrainMappError::format(path, format!("unsupported data type {dtype}")))?;
        let header = MghHeader {
            dims: checked,
            dtype,
        };
        if header.data_len().is_none() {
            return Err(BrainMappError::format(path, "volume dimensions overflow"));
        }
        Ok(header)
    }

    pub fn n_values(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    pub fn data_len(&self) -> Option<u64> {
        self.n_values()?
            .checked_mul(self.dtype.width())
            .and_then(|len| u64::try_from(len).ok())
    }
}

#[derive(Debug, Clone)]
pub struct MghVolume {
    pub header: MghHeader,
    pub data: Array4<f64>,
}

impl MghVolume {
    pub fn flatten(&self) -> Vec<f64> {
        self.data.iter().copied().collect()
    }
}

pub fn read_mgh(path: &Path) -> Result<MghVolume> {
    check_file_exists(path)?;
    let raw = FsMghHeader::from_file(path)
        .map_err(|e| BrainMappError::format(path, format!("cannot read MGH header: {e}")))?;
    let header = MghHeader::from_fields(
        raw.mgh_format_version,
        [raw.dim1len, raw.dim2len, raw.dim3len, raw.dim4len],
        raw.dtype,
        path,
    )?;
    if !is_compressed(path) {
        check_payload_size(path, &header)?;
    }

    let mgh = neuroformats::read_mgh(path)
        .map_err(|e| BrainMappError::format(path, format!("cannot read volume: {e}")))?;
    let values = voxel_values(&mgh, header.dtype).ok_or_else(|| {
        BrainMappError::format(path, format!("no {:?} voxel data in volume", header.dtype))
    })?;

    let [w, h, d, f] = header.dims;
    let data = Array4::from_shape_vec((w, h, d, f).f(), values)
        .map_err(|e| BrainMappError::format(path, e.to_string()))?;
    debug!(
        "Read {} ({:?}, dims {:?})",
        path.display(),
        header.dtype,
        header.dims
    );
    Ok(MghVolume { header, data })
}

fn is_compressed(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mgz"))
}

fn check_payload_size(path: &Path, header: &MghHeader) -> Result<()> {
    let expected = header
        .data_len()
        .ok_or_else(|| BrainMappError::format(path, "volume dimensions overflow"))?;
    let found = std::fs::metadata(path)?.len().saturating_sub(DATA_OFFSET);
    if found < expected {
        return Err(BrainMappError::format(
            path,
            format!("truncated payload: expected {expected} data bytes, found {found}"),
        ));
    }
    Ok(())
}

// neuroformats keeps voxels in file order, which is column-major.
fn voxel_values(mgh: &FsMgh, dtype: MghDtype) -> Option<Vec<f64>> {
    let data = &mgh.data;
    match dtype {
        MghDtype::Uchar => data
            .mri_uchar
            .as_ref()
            .map(|a| a.iter().map(|&v| f64::from(v)).collect()),
        MghDtype::Int => data
            .mri_int
            .as_ref()
            .map(|a| a.iter().map(|&v| f64::from(v)).collect()),
        MghDtype::Float => data
            .mri_float
            .as_ref()
            .map(|a| a.iter().map(|&v| f64::from(v)).collect()),
        MghDtype::Short => data
            .mri_short
            .as_ref()
            .map(|a| a.iter().map(|&v| f64::from(v)).collect()),
    }
}
