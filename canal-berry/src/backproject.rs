//! 标注反投影.
//!
//! 把侧视体积空间中的标注 (`[牙弓位置, 深度, 宽度]`) 写回原始体积网格. 采样坐标通常是
//! 小数, 因此每个标注体素会被写入其坐标 floor/ceil 组合得到的 8 个体素, 以弥补正向采样
//! 可能跳过的整数体素.
//!
//! 未标注体素从不写入. 不同采样线在同一体素上冲突时, 后写入者覆盖先写入者.

use itertools::iproduct;
use log::debug;
use ndarray::{s, Array3, ArrayView3, Axis};

use crate::arch::SideCoords;
use crate::consts::label::{is_contour, is_inside, is_labeled, CONTOUR, INSIDE, UNLABELED};
use crate::error::{ArchError, ArchResult};
use crate::plane::Plane;
use crate::progress::{tick, Progress};
use crate::Idx3d;

/// 在同一列内, 先写内部再写轮廓, 使轮廓覆盖内部.
const WRITE_ORDER: [(u8, fn(u8) -> bool); 2] = [(INSIDE, is_inside), (CONTOUR, is_contour)];

/// 把 `val` 写入 `(x, y, z)` 周围的 8 个体素. 坐标先被截断到网格范围内.
fn assign8(gt: &mut Array3<u8>, val: u8, x: f64, y: f64, z: f64) {
    let (depth, height, width) = gt.dim();
    let bound = |v: f64, len: usize| num::clamp(v, 0.0, (len - 1) as f64);
    let (x, y, z) = (bound(x, width), bound(y, height), bound(z, depth));
    let around = |v: f64| [v.floor() as usize, v.ceil() as usize];
    for (zz, yy, xx) in iproduct!(around(z), around(y), around(x)) {
        gt[(zz, yy, xx)] = val;
    }
}

/// 检查标注的位置个数.
fn check_positions(labels: &ArrayView3<u8>, n: usize) -> ArchResult<()> {
    if labels.dim().0 == n {
        Ok(())
    } else {
        let (_, d, w) = labels.dim();
        Err(ArchError::InvalidShape {
            expected: vec![n, d, w],
            found: labels.shape().to_vec(),
        })
    }
}

/// 直切模式: 第 `i` 个位置宽度 `j` 处的整列标注写回 `side[i][j]` 对应的体素列.
///
/// 坐标截断后落在网格外 (即 `x <= -1` 或 `x >= W`, `y` 同理) 的点被忽略.
/// 返回形状为 `shape` 的新标注体积.
pub fn back_project_straight(
    labels: ArrayView3<u8>,
    side: &SideCoords,
    shape: Idx3d,
    progress: &mut dyn Progress,
) -> ArchResult<Array3<u8>> {
    check_positions(&labels, side.len())?;
    let (_, height, width) = shape;
    let mut gt = Array3::from_elem(shape, UNLABELED);
    if gt.is_empty() {
        return Ok(gt);
    }
    let inside = |v: f64, len: usize| v > -1.0 && v < len as f64;
    for (z_id, line) in side.iter().enumerate() {
        tick(progress, z_id, side.len())?;
        for (w_id, &(x, y)) in line.iter().enumerate().take(labels.dim().2) {
            if !(inside(x, width) && inside(y, height)) {
                continue;
            }
            let column = labels.slice(s![z_id, .., w_id]);
            for (val, is_val) in WRITE_ORDER {
                for (h_id, _) in column.iter().enumerate().filter(|(_, &v)| is_val(v)) {
                    assign8(&mut gt, val, x, y, h_id as f64);
                }
            }
        }
    }
    Ok(gt)
}

/// 倾斜模式: 沿每个平面的 `(X, Y, Z)` 坐标张量写回. `None` 平面和全未标注的位置被跳过.
pub fn back_project_tilted(
    labels: ArrayView3<u8>,
    planes: &[Option<Plane>],
    shape: Idx3d,
    progress: &mut dyn Progress,
) -> ArchResult<Array3<u8>> {
    check_positions(&labels, planes.len())?;
    let mut gt = Array3::from_elem(shape, UNLABELED);
    if gt.is_empty() {
        return Ok(gt);
    }
    for (i, (img, plane)) in labels.axis_iter(Axis(0)).zip(planes).enumerate() {
        tick(progress, i, planes.len())?;
        let Some(plane) = plane else {
            continue;
        };
        if !img.iter().copied().any(is_labeled) {
            debug!("position {i} has no labels");
            continue;
        }
        let (xs, ys, zs) = (plane.x(), plane.y(), plane.z());
        let (depth, width) = plane.dim();
        for (val, is_val) in WRITE_ORDER {
            for ((d, w), _) in img.indexed_iter().filter(|(_, &v)| is_val(v)) {
                if d < depth && w < width {
                    assign8(&mut gt, val, xs[(d, w)], ys[(d, w)], zs[(d, w)]);
                }
            }
        }
    }
    Ok(gt)
}
