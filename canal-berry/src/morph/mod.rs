//! 2D 形态学操作.
//!
//! 二值图像以 `Array2<u8>` 表示, 前景为 1, 背景为 0.

use ndarray::{Array2, ArrayView2};

use crate::Idx2d;

mod areas;
mod thinning;

pub use areas::{areas8, drop_small_areas};
pub use thinning::thin;

/// 结构元素, 以相对中心的 `(dh, dw)` 偏移表示.
pub type Kernel = Vec<(isize, isize)>;

/// 直径为 `d` 的椭圆 (圆盘) 结构元素.
pub fn ellipse_kernel(d: usize) -> Kernel {
    assert!(d >= 1, "结构元素直径至少为 1");
    let r = (d as isize - 1) / 2;
    let limit = (r as f64 + 0.5).powi(2);
    let mut kernel = Kernel::with_capacity(d * d);
    for dh in -r..=r {
        for dw in -r..=r {
            if ((dh * dh + dw * dw) as f64) <= limit {
                kernel.push((dh, dw));
            }
        }
    }
    kernel
}

/// `(h, w) + (dh, dw)`, 越界时返回 `None`.
#[inline]
fn offset((h, w): Idx2d, (dh, dw): (isize, isize), (height, width): Idx2d) -> Option<Idx2d> {
    let nh = h.checked_add_signed(dh)?;
    let nw = w.checked_add_signed(dw)?;
    (nh < height && nw < width).then_some((nh, nw))
}

/// 灰度膨胀. 越界邻居不参与计算.
pub fn grey_dilate(img: ArrayView2<f32>, kernel: &Kernel) -> Array2<f32> {
    let dim = img.dim();
    Array2::from_shape_fn(dim, |pos| {
        kernel
            .iter()
            .filter_map(|&k| offset(pos, k, dim))
            .map(|p| img[p])
            .fold(f32::MIN, f32::max)
    })
}

/// 灰度腐蚀. 越界邻居不参与计算.
pub fn grey_erode(img: ArrayView2<f32>, kernel: &Kernel) -> Array2<f32> {
    let dim = img.dim();
    Array2::from_shape_fn(dim, |pos| {
        kernel
            .iter()
            .filter_map(|&k| offset(pos, k, dim))
            .map(|p| img[p])
            .fold(f32::MAX, f32::min)
    })
}

/// 灰度闭运算.
#[inline]
pub fn grey_close(img: ArrayView2<f32>, kernel: &Kernel) -> Array2<f32> {
    grey_erode(grey_dilate(img, kernel).view(), kernel)
}

/// 二值化: 严格大于 `thresh` 的像素为前景.
pub fn threshold(img: ArrayView2<f32>, thresh: f32) -> Array2<u8> {
    img.mapv(|v| u8::from(v > thresh))
}

/// 二值膨胀.
///
/// 只从前景像素向外扩散, 对稀疏前景更快.
pub fn binary_dilate(mask: ArrayView2<u8>, kernel: &Kernel) -> Array2<u8> {
    let dim = mask.dim();
    let mut out = Array2::zeros(dim);
    for (pos, _) in mask.indexed_iter().filter(|(_, &v)| v != 0) {
        for p in kernel.iter().filter_map(|&k| offset(pos, k, dim)) {
            out[p] = 1;
        }
    }
    out
}

/// 二值腐蚀. 越界邻居视为前景.
pub fn binary_erode(mask: ArrayView2<u8>, kernel: &Kernel) -> Array2<u8> {
    let dim = mask.dim();
    let mut out = Array2::zeros(dim);
    for (pos, _) in mask.indexed_iter().filter(|(_, &v)| v != 0) {
        let keep = kernel
            .iter()
            .filter_map(|&k| offset(pos, k, dim))
            .all(|p| mask[p] != 0);
        if keep {
            out[pos] = 1;
        }
    }
    out
}

/// 二值闭运算.
#[inline]
pub fn binary_close(mask: ArrayView2<u8>, kernel: &Kernel) -> Array2<u8> {
    binary_erode(binary_dilate(mask, kernel).view(), kernel)
}
