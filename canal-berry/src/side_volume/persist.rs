//! 侧视体积的持久化.
//!
//! 每种构造方式各有一个目录 (见 [`SideVolumeKind::dirname`]). 读取时会把磁盘上的
//! 采样线与下颌管样条和当前几何逐项比较, 任何不一致都会使读取失败, 迫使调用方重新计算.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use log::info;
use ndarray::{s, Array3, Array4, Axis, Zip};
use ndarray_npy::{read_npy, write_npy};
use serde::{Deserialize, Serialize};

use super::resample::Resampled;
use super::{SideVolume, SideVolumeKind};
use crate::arch::{ArchLines, SideCoords};
use crate::consts::files::{CANALS, COORDS, GT_SIDE_VOLUME, PLANES, SIDE_COORDS, SIDE_VOLUME};
use crate::error::{ArchError, ArchResult};
use crate::plane::Plane;
use crate::spline::{Spline, SplineRecord};

/// `canals.json` 的内容.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct CanalRecords {
    l_canal: SplineRecord,
    r_canal: SplineRecord,
}

impl CanalRecords {
    fn new([l, r]: [&Spline; 2]) -> Self {
        Self {
            l_canal: l.to_record(),
            r_canal: r.to_record(),
        }
    }
}

/// `(n, max_len, 2)`, 较短的线以 NaN 补齐.
fn side_coords_array(side: &SideCoords) -> Array3<f64> {
    let width = side.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = Array3::from_elem((side.len(), width, 2), f64::NAN);
    for (i, line) in side.iter().enumerate() {
        for (j, &(x, y)) in line.iter().enumerate() {
            out[(i, j, 0)] = x;
            out[(i, j, 1)] = y;
        }
    }
    out
}

/// `(4, n, 2)`: 低侧偏移, 牙弓坐标, 高侧偏移, `(斜率, 0)`.
fn coords_array(lines: &ArchLines) -> Array3<f64> {
    let n = lines.len();
    let mut out = Array3::zeros((4, n, 2));
    for (k, curve) in [&lines.low, &lines.coords, &lines.high].into_iter().enumerate() {
        for (i, &(x, y)) in curve.iter().enumerate() {
            out[(k, i, 0)] = x;
            out[(k, i, 1)] = y;
        }
    }
    for (i, &s) in lines.slopes.iter().enumerate() {
        out[(3, i, 0)] = s;
    }
    out
}

/// 逐元素相等, 两个 NaN 视为相等.
fn same_coords(a: &Array3<f64>, b: &Array3<f64>) -> bool {
    a.shape() == b.shape()
        && Zip::from(a)
            .and(b)
            .all(|&x, &y| x == y || (x.is_nan() && y.is_nan()))
}

/// 需要存在的文件.
fn required_files(kind: SideVolumeKind) -> &'static [&'static str] {
    match kind {
        SideVolumeKind::Straight => &[SIDE_VOLUME, GT_SIDE_VOLUME, SIDE_COORDS, COORDS],
        SideVolumeKind::Tilted => &[
            SIDE_VOLUME,
            GT_SIDE_VOLUME,
            SIDE_COORDS,
            COORDS,
            PLANES,
            CANALS,
        ],
    }
}

impl SideVolume {
    /// 持久化目录 `base/<dirname>`.
    #[inline]
    pub fn save_dir(kind: SideVolumeKind, base: &Path) -> PathBuf {
        base.join(kind.dirname())
    }

    /// 磁盘上是否有完整的持久化数据?
    pub fn has_saved(kind: SideVolumeKind, base: &Path) -> bool {
        let dir = Self::save_dir(kind, base);
        required_files(kind).iter().all(|f| dir.join(f).is_file())
    }

    /// 保存未缩放数据与其几何. 倾斜模式额外保存平面与下颌管样条.
    pub fn save(
        &self,
        base: &Path,
        side: &SideCoords,
        lines: &ArchLines,
        canals: [&Spline; 2],
    ) -> ArchResult<()> {
        self.check()?;
        let dir = Self::save_dir(self.kind, base);
        fs::create_dir_all(&dir)?;

        write_npy(dir.join(SIDE_VOLUME), &self.original)?;
        write_npy(dir.join(GT_SIDE_VOLUME), &self.original_gt)?;
        write_npy(dir.join(SIDE_COORDS), &side_coords_array(side))?;
        write_npy(dir.join(COORDS), &coords_array(lines))?;

        if self.kind.is_tilted() {
            let (n, depth, width) = self.original.dim();
            let mut planes = Array4::<f64>::zeros((n, 3, depth, width));
            for (i, plane) in self.planes.iter().enumerate() {
                if let Some(plane) = plane {
                    let w = plane.dim().1;
                    planes.slice_mut(s![i, .., .., ..w]).assign(&plane.tensor());
                }
            }
            write_npy(dir.join(PLANES), &planes)?;

            let writer = BufWriter::new(File::create(dir.join(CANALS))?);
            serde_json::to_writer(writer, &CanalRecords::new(canals))?;
        }
        info!("saved {:?} side volume to {}", self.kind, dir.display());
        Ok(())
    }

    /// 读取持久化数据, 并以 `scale` 重新完成后处理.
    ///
    /// 缺少文件时返回 [`ArchError::MissingArtifact`];
    /// 采样线或下颌管样条与当前几何不一致时返回 [`ArchError::GeometryMismatch`].
    pub fn load(
        kind: SideVolumeKind,
        base: &Path,
        side: &SideCoords,
        canals: [&Spline; 2],
        scale: f64,
    ) -> ArchResult<Self> {
        let dir = Self::save_dir(kind, base);
        if let Some(missing) = required_files(kind)
            .iter()
            .map(|f| dir.join(f))
            .find(|p| !p.is_file())
        {
            return Err(ArchError::MissingArtifact(missing));
        }

        let stored: Array3<f64> = read_npy(dir.join(SIDE_COORDS))?;
        if !same_coords(&stored, &side_coords_array(side)) {
            return Err(ArchError::GeometryMismatch("side coordinates"));
        }
        let coords: Array3<f64> = read_npy(dir.join(COORDS))?;
        if coords.dim() != (4, side.len(), 2) {
            return Err(ArchError::GeometryMismatch("base coordinates"));
        }

        let planes = if kind.is_tilted() {
            let reader = BufReader::new(File::open(dir.join(CANALS))?);
            let records: CanalRecords = serde_json::from_reader(reader)?;
            if records != CanalRecords::new(canals) {
                return Err(ArchError::GeometryMismatch("canal splines"));
            }
            load_planes(&dir.join(PLANES), side)?
        } else {
            Vec::new()
        };

        let data: Array3<f32> = read_npy(dir.join(SIDE_VOLUME))?;
        let gt: Array3<f32> = read_npy(dir.join(GT_SIDE_VOLUME))?;
        ArchError::check_shape(data.shape(), gt.shape())?;
        if data.dim().0 != side.len() {
            return Err(ArchError::GeometryMismatch("side volume"));
        }
        info!("loaded {kind:?} side volume from {}", dir.display());
        Ok(Self::from_resampled(kind, scale, Resampled { data, gt, planes }))
    }
}

/// 全零的平面视为 `None`. 每个平面的宽度截断为对应采样线的长度.
fn load_planes(path: &Path, side: &SideCoords) -> ArchResult<Vec<Option<Plane>>> {
    let planes: Array4<f64> = read_npy(path)?;
    if planes.dim().0 != side.len() || planes.dim().1 != 3 {
        return Err(ArchError::GeometryMismatch("planes"));
    }
    planes
        .axis_iter(Axis(0))
        .zip(side)
        .map(|(tensor, line)| {
            if tensor.iter().all(|&v| v == 0.0) {
                return Ok(None);
            }
            let w = line.len().min(tensor.dim().2);
            let plane = Plane::from_tensor(tensor.to_owned())?.truncated(w);
            Ok(Some(plane))
        })
        .collect()
}
