use std::fmt;
use std::str::FromStr;

use crate::error::BrainMappError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hemisphere {
    Left,
    Right,
}

impl Hemisphere {
    pub const ALL: [Hemisphere; 2] = [Hemisphere::Left, Hemisphere::Right];

    pub fn name(self) -> &'static str {
        match self {
            Hemisphere::Left => "left",
            Hemisphere::Right => "right",
        }
    }

    pub fn prefix(self) -> char {
        match self {
            Hemisphere::Left => 'l',
            Hemisphere::Right => 'r',
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Hemi<T> {
    pub left: T,
    pub right: T,
}

impl<T> Hemi<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    pub fn get(&self, hemi: Hemisphere) -> &T {
        match hemi {
            Hemisphere::Left => &self.left,
            Hemisphere::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, hemi: Hemisphere) -> &mut T {
        match hemi {
            Hemisphere::Left => &mut self.left,
            Hemisphere::Right => &mut self.right,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Hemisphere, &T) -> U) -> Hemi<U> {
        Hemi {
            left: f(Hemisphere::Left, &self.left),
            right: f(Hemisphere::Right, &self.right),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Hemisphere, &T)> {
        [(Hemisphere::Left, &self.left), (Hemisphere::Right, &self.right)].into_iter()
    }
}

// Lower resolutions are prefixes of the fsaverage mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    Fsaverage,
    #[default]
    Fsaverage6,
    Fsaverage5,
}

impl Resolution {
    pub fn n_nodes(self) -> usize {
        match self {
            Resolution::Fsaverage => 163_842,
            Resolution::Fsaverage6 => 40_962,
            Resolution::Fsaverage5 => 10_242,
        }
    }

    pub fn mesh_name(self) -> &'static str {
        match self {
            Resolution::Fsaverage => "fsaverage",
            Resolution::Fsaverage6 => "fsaverage6",
            Resolution::Fsaverage5 => "fsaverage5",
        }
    }
}

impl FromStr for Resolution {
    type Err = BrainMappError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fsaverage" | "high" => Ok(Resolution::Fsaverage),
            "fsaverage6" | "medium" => Ok(Resolution::Fsaverage6),
            "fsaverage5" | "low" => Ok(Resolution::Fsaverage5),
            other => Err(BrainMappError::InvalidArgument(format!(
                "unknown mesh resolution '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshSurface {
    #[default]
    Pial,
    Inflated,
    Flat,
    Sphere,
}

impl MeshSurface {
    pub fn name(self) -> &'static str {
        match self {
            MeshSurface::Pial => "pial",
            MeshSurface::Inflated => "infl",
            MeshSurface::Flat => "flat",
            MeshSurface::Sphere => "sphere",
        }
    }
}

impl FromStr for MeshSurface {
    type Err = BrainMappError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pial" => Ok(MeshSurface::Pial),
            "infl" | "inflated" => Ok(MeshSurface::Inflated),
            "flat" => Ok(MeshSurface::Flat),
            "sphere" => Ok(MeshSurface::Sphere),
            other => Err(BrainMappError::InvalidArgument(format!(
                "unknown surface type '{other}'"
            ))),
        }
    }
}

// Labels and betas are index-aligned per hemisphere. Label 0 marks a non-significant vertex, whose beta is NaN.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceMap {
    pub cluster_labels: Hemi<Vec<u32>>,
    pub betas: Hemi<Vec<f64>>,
    pub all_observed_betas: Hemi<Vec<f64>>,
}

impl SurfaceMap {
    pub fn n_vertices(&self, hemi: Hemisphere) -> usize {
        self.cluster_labels.get(hemi).len()
    }

    pub fn truncated(&self, resolution: Resolution) -> SurfaceMap {
        let n = resolution.n_nodes();
        SurfaceMap {
            cluster_labels: self.cluster_labels.map(|_, v| prefix(v, n)),
            betas: self.betas.map(|_, v| prefix(v, n)),
            all_observed_betas: self.all_observed_betas.map(|_, v| prefix(v, n)),
        }
    }
}

pub(crate) fn prefix<T: Clone>(values: &[T], n: usize) -> Vec<T> {
    values[..values.len().min(n)].to_vec()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub hemi: Hemisphere,
    pub cluster_id: u32,
    pub size: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl ClusterSummary {
    pub fn label(&self) -> String {
        format!("Cluster {}", self.cluster_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverlapCategory {
    OnlyA = 1,
    OnlyB = 2,
    Both = 3,
}

impl OverlapCategory {
    pub const ALL: [OverlapCategory; 3] = [
        OverlapCategory::OnlyA,
        OverlapCategory::OnlyB,
        OverlapCategory::Both,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(OverlapCategory::OnlyA),
            2 => Some(OverlapCategory::OnlyB),
            3 => Some(OverlapCategory::Both),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryCount {
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlapResult {
    pub overlap_map: Hemi<Vec<u8>>,
    pub counts: Vec<(OverlapCategory, CategoryCount)>,
}

impl OverlapResult {
    pub fn category(&self, category: OverlapCategory) -> CategoryCount {
        self.counts
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, count)| *count)
            .unwrap_or(CategoryCount {
                count: 0,
                percent: 0.0,
            })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, c)| c.count).sum()
    }
}
