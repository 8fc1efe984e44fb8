//! 多项式曲线.

// ref: https://blog.csdn.net/u012494154/article/details/112519550

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1};

/// 奇异值截断阈值.
const SVD_EPS: f64 = 1e-12;

/// 多项式 `p(x) = sum(c_k * t^k)`, 其中 `t = (x - shift) / scale`.
///
/// 高次 (如 12 次) 拟合时, 直接以像素坐标构造范德蒙德矩阵会严重病态,
/// 因此系数定义在归一化自变量 `t` 上.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    /// 升幂系数.
    coef: Array1<f64>,
    shift: f64,
    scale: f64,
}

impl Polynomial {
    /// 以升幂系数直接构造 `p(x) = sum(coef[k] * x^k)`.
    pub fn from_coefficients(coef: Vec<f64>) -> Self {
        assert!(!coef.is_empty(), "多项式至少需要一个系数");
        Self {
            coef: Array1::from(coef),
            shift: 0.0,
            scale: 1.0,
        }
    }

    /// 基于最小二乘法拟合 `degree` 次多项式.
    ///
    /// 点集为空或最小二乘求解失败时返回 `None`.
    pub fn fit(x: ArrayView1<f64>, y: ArrayView1<f64>, degree: usize) -> Option<Self> {
        assert_eq!(x.len(), y.len(), "x 值和 y 值必须一一对应");
        if x.is_empty() {
            return None;
        }
        let (lo, hi) = min_max(x);
        let shift = (lo + hi) / 2.0;
        let scale = if hi > lo { (hi - lo) / 2.0 } else { 1.0 };

        let t = x.mapv(|v| (v - shift) / scale);
        let v_mat = vandermonde(t.view(), degree);
        let (m, n) = v_mat.dim();

        // ndarray 行主序 -> nalgebra.
        let a = DMatrix::from_row_slice(m, n, v_mat.as_slice()?);
        let b = DVector::from_iterator(m, y.iter().copied());
        let theta = a.svd(true, true).solve(&b, SVD_EPS).ok()?;
        if theta.iter().any(|c| !c.is_finite()) {
            return None;
        }

        Some(Self {
            coef: theta.iter().copied().collect(),
            shift,
            scale,
        })
    }

    /// 求值. 使用秦九韶算法.
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        let t = (x - self.shift) / self.scale;
        self.coef.iter().rev().fold(0.0, |acc, &cur| acc * t + cur)
    }

    /// 一阶导函数.
    pub fn derivative(&self) -> Self {
        let coef = if self.coef.len() <= 1 {
            Array1::zeros(1)
        } else {
            self.coef
                .iter()
                .enumerate()
                .skip(1)
                .map(|(k, &c)| k as f64 * c / self.scale)
                .collect()
        };
        Self {
            coef,
            shift: self.shift,
            scale: self.scale,
        }
    }

    /// 以宽度为 `delta` 的中心差分近似一阶导数.
    #[inline]
    pub fn central_slope(&self, x: f64, delta: f64) -> f64 {
        (self.eval(x + delta / 2.0) - self.eval(x - delta / 2.0)) / delta
    }

    /// 多项式次数.
    #[inline]
    pub fn degree(&self) -> usize {
        self.coef.len() - 1
    }
}

/// shape: (m, n); m = t.len(), n = degree + 1
fn vandermonde(t: ArrayView1<f64>, degree: usize) -> Array2<f64> {
    Array2::from_shape_fn((t.len(), degree + 1), |(m, n)| t[m].powi(n as i32))
}

fn min_max(arr: ArrayView1<f64>) -> (f64, f64) {
    // !arr.is_empty()
    arr.iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}
