//! 侧视体积的两种重采样方式及其后处理.

use log::debug;
use ndarray::{s, Array2, Array3, ArrayView2, Axis, Zip};

use crate::arch::SideCoords;
use crate::error::ArchResult;
use crate::plane::Plane;
use crate::progress::{tick, Progress};
use crate::spline::Spline;
use crate::volume::VolumeSource;

/// 重采样的原始输出 (未缩放, 未规范化).
pub(super) struct Resampled {
    pub data: Array3<f32>,
    pub gt: Array3<f32>,
    pub planes: Vec<Option<Plane>>,
}

/// 沿每条侧视采样线竖直直切.
pub(super) fn straight<S>(
    scan: &S,
    side: &SideCoords,
    progress: &mut dyn Progress,
) -> ArchResult<Resampled>
where
    S: VolumeSource + ?Sized,
{
    let (data, gt) = scan.line_slice(side, progress)?;
    Ok(Resampled {
        data,
        gt,
        planes: Vec::new(),
    })
}

/// 依次沿左, 右下颌管曲线生成倾斜平面并采样.
///
/// 下颌管样条位于全景图坐标系中: `x` 为牙弓位置, `y` 为深度.
/// 对于曲线定义域 `[start, end)` 内的每个位置 `x`, 平面绕深度 `p(x)` 旋转
/// `-atan(p'(x))`. 不被任何曲线覆盖的位置保持零行, 其平面为 `None`.
/// 任何一次取消都会丢弃全部结果.
pub(super) fn tilted<S>(
    scan: &S,
    side: &SideCoords,
    canals: [&Spline; 2],
    canal_degree: usize,
    progress: &mut dyn Progress,
) -> ArchResult<Resampled>
where
    S: VolumeSource + ?Sized,
{
    let n = side.len();
    let depth = scan.len_z();
    let width = side.iter().map(Vec::len).max().unwrap_or(0);
    let mut data = Array3::zeros((n, depth, width));
    let mut gt = Array3::zeros((n, depth, width));
    let mut planes = vec![None; n];

    for canal in canals {
        let Some(curve) = canal.polynomial_approximation(canal_degree) else {
            debug!("skip empty canal spline");
            continue;
        };
        let derivative = curve.poly().derivative();
        let lo = (curve.start().trunc().max(0.0) as usize).min(n);
        let hi = (curve.end().trunc().max(0.0) as usize).min(n);
        for pos in lo..hi {
            tick(progress, pos, n)?;
            let x = pos as f64;
            let mut plane = Plane::from_line(&side[pos], depth);
            plane.tilt(-derivative.eval(x).atan().to_degrees(), curve.eval(x));
            let w = plane.dim().1;
            data.slice_mut(s![pos, .., ..w])
                .assign(&scan.plane_slice(&plane, false));
            gt.slice_mut(s![pos, .., ..w])
                .assign(&scan.plane_slice(&plane, true));
            planes[pos] = Some(plane);
        }
    }
    Ok(Resampled { data, gt, planes })
}

/// 面积加权时, 每个输出下标对应的 `(输入下标, 权重)`. 权重之和为 1.
fn area_weights(src: usize, dst: usize) -> Vec<Vec<(usize, f64)>> {
    let ratio = src as f64 / dst as f64;
    (0..dst)
        .map(|i| {
            let lo = i as f64 * ratio;
            let hi = (i + 1) as f64 * ratio;
            let last = (hi.ceil() as usize).min(src);
            (lo.floor() as usize..last)
                .filter_map(|k| {
                    let overlap = hi.min(k as f64 + 1.0) - lo.max(k as f64);
                    (overlap > 0.0).then_some((k, overlap / ratio))
                })
                .collect()
        })
        .collect()
}

/// 面积加权缩放到 `(height, width)`: 每个输出像素取其覆盖的输入像素按面积加权的平均值.
fn resize_area(img: ArrayView2<f32>, height: usize, width: usize) -> Array2<f32> {
    let (src_h, src_w) = img.dim();
    if src_h == 0 || src_w == 0 {
        return Array2::zeros((height, width));
    }
    let wy = area_weights(src_h, height);
    let wx = area_weights(src_w, width);
    Array2::from_shape_fn((height, width), |(h, w)| {
        let v: f64 = wy[h]
            .iter()
            .map(|&(y, ky)| {
                let row: f64 = wx[w].iter().map(|&(x, kx)| kx * img[(y, x)] as f64).sum();
                ky * row
            })
            .sum();
        v as f32
    })
}

/// 对每个位置的切片做面积加权缩放.
pub(super) fn rescale(volume: &Array3<f32>, scale: f64) -> Array3<f32> {
    let (n, h, w) = volume.dim();
    let height = (h as f64 * scale) as usize;
    let width = (w as f64 * scale) as usize;
    let mut out = Array3::zeros((n, height, width));
    Zip::from(out.outer_iter_mut())
        .and(volume.outer_iter())
        .for_each(|mut dst, src| dst.assign(&resize_area(src, height, width)));
    out
}

/// 线性规范化到 `[0, 1]`.
///
/// 常数数组在其值非零时变为全 1, 否则保持全 0.
pub(super) fn normalize(volume: &mut Array3<f32>) {
    let Some((min, max)) = volume
        .iter()
        .fold(None, |acc: Option<(f32, f32)>, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    else {
        return;
    };
    if max > min {
        let range = max - min;
        volume.mapv_inplace(|v| (v - min) / range);
    } else {
        let c = if min != 0.0 { 1.0 } else { 0.0 };
        volume.fill(c);
    }
}

/// 按位置取出 `(强度, 标注)` 切片.
#[inline]
pub(super) fn slice_at(volume: &Array3<f32>, pos: usize) -> Option<ArrayView2<f32>> {
    (pos < volume.dim().0).then(|| volume.index_axis(Axis(0), pos))
}
