//! 曲线拟合.
//!
//! 给定一系列点 `(x, y)` 或一张牙弓二值切片, 该模块可以拟合出一条多项式曲线.

use ndarray::ArrayView1;

mod detect;
mod polynomial;

pub use detect::arch_detection;
pub use polynomial::Polynomial;

/// 带有效定义域 `[start, end]` 的多项式曲线.
///
/// 拟合失败以 `Option::None` 表示, 而不是把哨兵值编码进系数中.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyCurve {
    poly: Polynomial,
    start: f64,
    end: f64,
}

impl PolyCurve {
    /// 初始化.
    pub fn new(poly: Polynomial, start: f64, end: f64) -> Self {
        assert!(start <= end, "定义域左端点不能大于右端点");
        Self { poly, start, end }
    }

    /// 拟合 `degree` 次多项式, 定义域为 `x` 的最小值和最大值.
    /// 点集为空时返回 `None`.
    pub fn fit(x: ArrayView1<f64>, y: ArrayView1<f64>, degree: usize) -> Option<Self> {
        let poly = Polynomial::fit(x, y, degree)?;
        let (start, end) = x
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Some(Self::new(poly, start, end))
    }

    /// 多项式.
    #[inline]
    pub fn poly(&self) -> &Polynomial {
        &self.poly
    }

    /// 定义域左端点.
    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    /// 定义域右端点.
    #[inline]
    pub fn end(&self) -> f64 {
        self.end
    }

    /// 求值.
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        self.poly.eval(x)
    }
}
