//! 牙弓曲线.
//!
//! 从多项式曲线出发, 沿弧长等距采样得到牙弓坐标, 并沿法线方向生成两条偏移曲线.
//! 坐标均为切片平面上的 `(x, y)`, 其中 `x` 对应宽度方向, `y` 对应高度方向.

use crate::consts::{ARC_STEP, DERIVATIVE_DELTA};
use crate::fitting::PolyCurve;
use crate::Point2d;

mod side;

pub use side::{generate_side_coords, Line, SideCoords};

/// 法线斜率 `alfa` 对应的 `(cos, sin)`, 两者均非负.
#[inline]
pub(crate) fn perpendicular_cos_sin(alfa: f64) -> (f64, f64) {
    let a2 = alfa * alfa;
    ((1.0 / (a2 + 1.0)).sqrt(), (a2 / (a2 + 1.0)).sqrt())
}

/// 把斜率限制在 `[-bound, bound]` 内. 垂直切线 (无穷斜率) 会被替换为 `±bound`.
#[inline]
pub(crate) fn bound_slope(alfa: f64, bound: f64) -> f64 {
    if alfa.is_nan() {
        bound
    } else {
        alfa.clamp(-bound, bound)
    }
}

/// 牙弓坐标及其两侧偏移.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchLines {
    /// 低侧偏移 (`y` 较大的一侧).
    pub low: Vec<Point2d>,

    /// 牙弓坐标.
    pub coords: Vec<Point2d>,

    /// 高侧偏移 (`y` 较小的一侧).
    pub high: Vec<Point2d>,

    /// 每个点处的法线斜率.
    pub slopes: Vec<f64>,
}

impl ArchLines {
    /// 点数.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// 是否没有任何点.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// 生成侧视采样线, 见 [`generate_side_coords`].
    #[inline]
    pub fn side_coords(&self, extent: Option<usize>) -> SideCoords {
        generate_side_coords(&self.high, &self.low, &self.slopes, extent)
    }
}

/// 沿多项式曲线等弧长采样, 并生成距离为 `offset` 的两条偏移曲线.
///
/// 采样从 `start + 1` 开始, 每步 `x` 增加 `1 / sqrt(f'(x)^2 + 1)`,
/// 使相邻点的弧长约为 1. 法线斜率 `-1 / f'(x)` 被限制在 `±slope_bound` 内,
/// 其符号决定两条偏移曲线的公式, 保证偏移曲线不相交.
pub fn arch_lines(curve: &PolyCurve, offset: f64, slope_bound: f64) -> ArchLines {
    let p = curve.poly();
    let mut coords = Vec::new();
    let mut x = curve.start() + 1.0;
    while x < curve.end() {
        coords.push((x, p.eval(x)));
        let alfa = p.central_slope(x, DERIVATIVE_DELTA);
        x += ARC_STEP * (1.0 / (alfa * alfa + 1.0)).sqrt();
    }

    let mut low = Vec::with_capacity(coords.len());
    let mut high = Vec::with_capacity(coords.len());
    let mut slopes = Vec::with_capacity(coords.len());
    for &(x, y) in coords.iter() {
        let alfa = bound_slope(-1.0 / p.central_slope(x, DERIVATIVE_DELTA), slope_bound);
        let (cos, sin) = perpendicular_cos_sin(alfa);
        if alfa > 0.0 {
            low.push((x + offset * cos, y + offset * sin));
            high.push((x - offset * cos, y - offset * sin));
        } else {
            low.push((x - offset * cos, y + offset * sin));
            high.push((x + offset * cos, y - offset * sin));
        }
        slopes.push(alfa);
    }

    ArchLines {
        low,
        coords,
        high,
        slopes,
    }
}

/// 可偏移的牙弓曲线, 用于全景图提取.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arch {
    coords: Vec<Point2d>,
}

impl Arch {
    /// 初始化.
    #[inline]
    pub fn new(coords: Vec<Point2d>) -> Self {
        Self { coords }
    }

    /// 坐标.
    #[inline]
    pub fn coords(&self) -> &[Point2d] {
        &self.coords
    }

    /// 重置坐标.
    #[inline]
    pub fn set_arch(&mut self, coords: &[Point2d]) {
        self.coords = coords.to_vec();
    }

    /// 沿法线方向平移 `amount`. 正值朝向 `y` 增大的一侧 (与低侧偏移同向).
    pub fn offset(&mut self, amount: f64) {
        if amount == 0.0 || self.coords.len() < 2 {
            return;
        }
        let n = self.coords.len();
        let moved: Vec<Point2d> = (0..n)
            .map(|i| {
                let a = self.coords[i.saturating_sub(1)];
                let b = self.coords[(i + 1).min(n - 1)];
                let (tx, ty) = (b.0 - a.0, b.1 - a.1);
                let len = (tx * tx + ty * ty).sqrt();
                let (x, y) = self.coords[i];
                if len == 0.0 {
                    (x, y)
                } else {
                    (x - amount * ty / len, y + amount * tx / len)
                }
            })
            .collect();
        self.coords = moved;
    }

    /// 返回平移 `amount` 后的副本.
    #[inline]
    pub fn get_offsetted(&self, amount: f64) -> Self {
        let mut ans = self.clone();
        ans.offset(amount);
        ans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::{PolyCurve, Polynomial};

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn dist(a: Point2d, b: Point2d) -> f64 {
        ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
    }

    fn parabola() -> PolyCurve {
        // y = 200 - 0.01 * (x - 100)^2
        let p = Polynomial::from_coefficients(vec![100.0, 2.0, -0.01]);
        PolyCurve::new(p, 0.0, 200.0)
    }

    /// 三条曲线等长, 且每个点到高侧偏移的距离等于 `offset`.
    #[test]
    fn test_arch_lines_offset_distance() {
        for offset in [1.0, 17.5, 50.0] {
            let lines = arch_lines(&parabola(), offset, 1e6);
            assert!(!lines.is_empty());
            assert_eq!(lines.low.len(), lines.len());
            assert_eq!(lines.high.len(), lines.len());
            assert_eq!(lines.slopes.len(), lines.len());
            for (c, h, l) in itertools::izip!(&lines.coords, &lines.high, &lines.low) {
                assert!(float_eq(dist(*c, *h), offset));
                assert!(float_eq(dist(*c, *l), offset));
                assert!(h.1 <= c.1 && c.1 <= l.1);
            }
        }
    }

    /// 相邻点弧长约为 1.
    #[test]
    fn test_arch_lines_equidistant() {
        let lines = arch_lines(&parabola(), 10.0, 1e6);
        assert!(float_eq(lines.coords[0].0, 1.0));
        for w in lines.coords.windows(2) {
            assert!((dist(w[0], w[1]) - 1.0).abs() < 0.05);
        }
    }

    /// 顶点处切线水平, 法线斜率应被有界化而不是无穷.
    #[test]
    fn test_vertical_normal_is_bounded() {
        let p = Polynomial::from_coefficients(vec![5.0]);
        let lines = arch_lines(&PolyCurve::new(p, 0.0, 10.0), 3.0, 1e6);
        for (&s, c, h) in itertools::izip!(&lines.slopes, &lines.coords, &lines.high) {
            assert!(s.is_finite());
            assert!(float_eq(s.abs(), 1e6));
            assert!(float_eq(h.1, c.1 - 3.0));
        }
    }

    #[test]
    fn test_side_coords_match_arch() {
        let lines = arch_lines(&parabola(), 20.0, 1e6);
        let sides = lines.side_coords(Some(40));
        assert_eq!(sides.len(), lines.len());
        for (line, h, l) in itertools::izip!(&sides, &lines.high, &lines.low) {
            assert_eq!(line.len(), 40);
            assert!(float_eq(dist(line[0], *h), 0.0));
            assert!(float_eq(dist(line[39], *l), 1.0));
        }
    }

    #[test]
    fn test_arch_offset() {
        let arch = Arch::new((0..10).map(|x| (x as f64, 5.0)).collect());
        let moved = arch.get_offsetted(2.0);
        assert!(moved.coords().iter().all(|p| float_eq(p.1, 7.0)));
        let back = moved.get_offsetted(-2.0);
        assert_eq!(back.coords().len(), 10);
        assert!(back.coords().iter().all(|p| float_eq(p.1, 5.0)));
        assert_eq!(arch.get_offsetted(0.0), arch);
    }
}
