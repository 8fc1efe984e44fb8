//! 由已有标注体积反推会话状态, 以及稀疏标注导出.

use log::{debug, info};
use ndarray::{Array1, Array2};
use ndarray_npy::write_npy;

use super::ArchSession;
use crate::arch::arch_lines;
use crate::consts::files::EXPORT_GT_SPARSE;
use crate::consts::label::{is_contour, is_labeled, CONTOUR, UNLABELED};
use crate::error::{ArchError, ArchResult};
use crate::fitting::PolyCurve;
use crate::morph;
use crate::spline::Spline;
use crate::volume::VolumeSource;
use crate::{Areas2d, Idx3d, Point2d};

/// 下颌管在水平面上的投影必须恰好分成这么多个连通域.
const CANAL_COUNT: usize = 2;

/// 拟合 `ys` 关于 `xs` 的多项式.
fn fit(xs: Vec<f64>, ys: Vec<f64>, degree: usize) -> Option<PolyCurve> {
    let (xs, ys) = (Array1::from(xs), Array1::from(ys));
    PolyCurve::fit(xs.view(), ys.view(), degree)
}

/// 把下颌管投影的两个连通域排成 `[左, 右]`: 左半边 (`w < W / 2`) 像素较多者为左.
/// 个数相同时保持行主序.
fn order_canals(mut areas: Areas2d, width: usize) -> Areas2d {
    let left = |a: &[(usize, usize)]| a.iter().filter(|&&(_, w)| w < width / 2).count();
    if left(&areas[1]) > left(&areas[0]) {
        areas.swap(0, 1);
    }
    areas
}

/// 在工作曲线的第 `i` 个点处放置控制点 `(i, z(x))`.
///
/// 只取 `trunc(start) < x < trunc(end)` 且 `0 <= z <= depth` 的点.
fn canal_spline(
    curve: &PolyCurve,
    (start, end): (f64, f64),
    arch: &[Point2d],
    depth: usize,
    num_cp: usize,
) -> Spline {
    let (lo, hi) = (start.trunc(), end.trunc());
    let coords: Vec<Point2d> = arch
        .iter()
        .enumerate()
        .filter(|&(_, &(x, _))| lo < x && x < hi)
        .map(|(i, &(x, _))| (i as f64, curve.eval(x)))
        .filter(|&(_, z)| (0.0..=depth as f64).contains(&z))
        .collect();
    Spline::from_coords(&coords, num_cp)
}

impl<S: VolumeSource> ArchSession<S> {
    /// 由扫描的标注体积重建牙弓样条和左右下颌管样条.
    ///
    /// 1. 用所有已标注体素拟合 `y(x)`, 定义域扩展为整个宽度 `[0, W]`, 写入当前切片的检测缓存.
    /// 2. 在该曲线上采样, 去掉 `y` 落在 `(0, H)` 以外的中间点, 生成牙弓样条并更新采样线.
    /// 3. 沿 `z` 投影标注, 两个连通域分别对应左右下颌管, 各自拟合 `z(x)`
    ///    后在工作曲线上放置控制点. 左管定义域从 0 开始, 右管延伸到 `W`.
    ///
    /// 没有标注时返回 [`ArchError::DetectionAbsent`];
    /// 投影的连通域不是两个时返回 [`ArchError::GeometryMismatch`], 此时下颌管样条保持不变.
    pub fn extract_data_from_gt(&mut self) -> ArchResult<()> {
        let (depth, height, width) = self.scan.shape();
        let voxels: Vec<Idx3d> = self
            .scan
            .gt_volume()
            .indexed_iter()
            .filter(|(_, &v)| is_labeled(v))
            .map(|(pos, _)| pos)
            .collect();
        let absent = ArchError::DetectionAbsent {
            slice: self.selected_slice,
        };
        if voxels.is_empty() {
            return Err(absent);
        }
        debug!("{} labeled voxels in the scan", voxels.len());

        let xs = voxels.iter().map(|&(_, _, w)| w as f64).collect();
        let ys = voxels.iter().map(|&(_, h, _)| h as f64).collect();
        let fitted = fit(xs, ys, self.cfg.detection.degree).ok_or(absent)?;
        let curve = PolyCurve::new(fitted.poly().clone(), 0.0, width as f64);
        self.detections.set(self.selected_slice, Some(curve.clone()));

        let coords = arch_lines(&curve, self.cfg.lh_offset, self.cfg.slope_bound).coords;
        let last = coords.len().saturating_sub(1);
        let valid: Vec<Point2d> = coords
            .iter()
            .enumerate()
            .filter(|&(i, &(_, y))| i == 0 || i == last || (0.0 < y && y < height as f64))
            .map(|(_, &p)| p)
            .collect();
        self.spline = Spline::from_coords(&valid, self.cfg.num_cp);
        self.rebuild_arch()?;

        let mut projection = Array2::<u8>::zeros((height, width));
        for &(_, h, w) in voxels.iter() {
            projection[(h, w)] = 1;
        }
        let areas = morph::areas8(projection.view());
        if areas.len() != CANAL_COUNT {
            debug!("expected {CANAL_COUNT} canal components, got {}", areas.len());
            return Err(ArchError::GeometryMismatch("canal components"));
        }

        let mut owner = Array2::<u8>::zeros((height, width));
        for (id, area) in order_canals(areas, width).iter().enumerate() {
            for &pos in area {
                owner[pos] = id as u8 + 1;
            }
        }
        let mut canals = [Spline::new_open(), Spline::new_open()];
        for (id, canal) in canals.iter_mut().enumerate() {
            let (xs, zs): (Vec<f64>, Vec<f64>) = voxels
                .iter()
                .filter(|&&(_, h, w)| owner[(h, w)] == id as u8 + 1)
                .map(|&(z, _, w)| (w as f64, z as f64))
                .unzip();
            let Some(curve) = fit(xs, zs, self.cfg.canal_degree) else {
                continue;
            };
            let domain = if id == 0 {
                (0.0, curve.end())
            } else {
                (curve.start(), width as f64)
            };
            *canal = canal_spline(&curve, domain, self.arch.coords(), depth, self.cfg.num_cp);
        }
        let [l_canal, r_canal] = canals;
        self.l_canal = l_canal;
        self.r_canal = r_canal;
        info!(
            "state extracted from annotations: {} / {} canal control points",
            self.l_canal.control_points().len(),
            self.r_canal.control_points().len()
        );
        Ok(())
    }

    /// 导出只保留轮廓的稀疏标注到 `gt_sparse.npy`, 内部体素记为未标注.
    ///
    /// 文件已存在且 `forced == false` 时跳过并返回 `false`.
    pub fn export_sparse_volume(&self, forced: bool) -> ArchResult<bool> {
        let path = self.dir.join(EXPORT_GT_SPARSE);
        if path.exists() && !forced {
            info!("skip existing {}", path.display());
            return Ok(false);
        }
        let sparse = self
            .scan
            .gt_volume()
            .mapv(|v| if is_contour(v) { CONTOUR } else { UNLABELED });
        write_npy(&path, &sparse)?;
        Ok(true)
    }
}
