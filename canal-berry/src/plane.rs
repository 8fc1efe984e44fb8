//! 采样平面.
//!
//! 平面是一个 `3 x depth x width` 张量, 对输出图像的每个像素记录其在源体积中的
//! `(X, Y, Z)` 坐标. 直切平面由一条侧视采样线竖直拉伸得到; 倾斜平面在此基础上
//! 绕 `z_pivot` 处的水平轴旋转, 使其垂直于下颌管曲线.

use ndarray::{s, Array3, ArrayView2, ArrayView3, Axis};

use crate::error::{ArchError, ArchResult};
use crate::Point2d;

/// 采样平面.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// `[X, Y, Z]`, 每个分量形状为 `(depth, width)`.
    data: Array3<f64>,
}

impl Plane {
    /// 竖直直切平面: `X`, `Y` 沿 `line` 变化, `Z` 取遍 `[0, depth)`.
    pub fn from_line(line: &[Point2d], depth: usize) -> Self {
        let data = Array3::from_shape_fn((3, depth, line.len()), |(c, z, w)| match c {
            0 => line[w].0,
            1 => line[w].1,
            _ => z as f64,
        });
        Self { data }
    }

    /// 由 `(3, depth, width)` 张量构造.
    pub fn from_tensor(data: Array3<f64>) -> ArchResult<Self> {
        let (c, depth, width) = data.dim();
        ArchError::check_shape(&[3, depth, width], &[c, depth, width])?;
        Ok(Self { data })
    }

    /// 原始张量.
    #[inline]
    pub fn tensor(&self) -> ArrayView3<f64> {
        self.data.view()
    }

    /// `(depth, width)`.
    #[inline]
    pub fn dim(&self) -> (usize, usize) {
        let (_, d, w) = self.data.dim();
        (d, w)
    }

    /// `X` 分量.
    #[inline]
    pub fn x(&self) -> ArrayView2<f64> {
        self.data.index_axis(Axis(0), 0)
    }

    /// `Y` 分量.
    #[inline]
    pub fn y(&self) -> ArrayView2<f64> {
        self.data.index_axis(Axis(0), 1)
    }

    /// `Z` 分量.
    #[inline]
    pub fn z(&self) -> ArrayView2<f64> {
        self.data.index_axis(Axis(0), 2)
    }

    /// 牙弓切向单位向量, 即采样线方向 `(dx, dy)` 旋转得到的 `(dy, -dx)`.
    /// 平面宽度不足 2 或采样线退化时返回 `None`.
    fn tangent(&self) -> Option<Point2d> {
        let (_, width) = self.dim();
        if width < 2 {
            return None;
        }
        let (xs, ys) = (self.x(), self.y());
        let dx = xs[(0, width - 1)] - xs[(0, 0)];
        let dy = ys[(0, width - 1)] - ys[(0, 0)];
        let len = (dx * dx + dy * dy).sqrt();
        (len > 0.0).then(|| (dy / len, -dx / len))
    }

    /// 绕 `z_pivot` 处平行于采样线的轴旋转 `angle_degrees`.
    ///
    /// 深度偏移 `z - z_pivot` 变为深度方向的 `(z - z_pivot) * cos` 与牙弓切向的
    /// `(z - z_pivot) * sin`. 采样线退化时只改变深度分量.
    pub fn tilt(&mut self, angle_degrees: f64, z_pivot: f64) {
        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        let (tx, ty) = self.tangent().unwrap_or((0.0, 0.0));
        let (depth, width) = self.dim();
        for d in 0..depth {
            for w in 0..width {
                let dz = self.data[(2, d, w)] - z_pivot;
                self.data[(0, d, w)] += dz * sin * tx;
                self.data[(1, d, w)] += dz * sin * ty;
                self.data[(2, d, w)] = z_pivot + dz * cos;
            }
        }
    }

    /// 截断宽度到 `width`.
    pub(crate) fn truncated(self, width: usize) -> Self {
        let data = self.data.slice(s![.., .., ..width]).to_owned();
        Self { data }
    }
}
