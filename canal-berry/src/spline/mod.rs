//! 可编辑样条曲线.
//!
//! 样条由一组有序控制点定义, 曲线本身由 Catmull-Rom 插值得到.
//! 开曲线的控制点按 `x` 升序排列, 闭曲线的下标按控制点个数取模.

use itertools::Itertools;
use ndarray::Array1;
use once_cell::unsync::OnceCell;
use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use crate::fitting::PolyCurve;
use crate::Point2d;

mod catmull_rom;

use catmull_rom::catmull_rom_curve;

/// 开曲线至少需要的控制点个数.
pub const MIN_OPEN_POINTS: usize = 4;

/// 闭曲线至少需要的控制点个数.
pub const MIN_CLOSED_POINTS: usize = 3;

/// 样条的持久化记录.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplineRecord {
    /// 有序控制点.
    pub control_points: Vec<Point2d>,

    /// 是否为闭曲线.
    pub closed: bool,
}

/// Catmull-Rom 样条.
///
/// 稠密曲线在首次访问时计算并缓存, 任何修改都会使缓存失效.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "SplineRecord", into = "SplineRecord")]
pub struct Spline {
    cp: Vec<Point2d>,
    closed: bool,
    curve: OnceCell<Vec<Point2d>>,
}

impl PartialEq for Spline {
    fn eq(&self, other: &Self) -> bool {
        self.closed == other.closed && self.cp == other.cp
    }
}

impl From<SplineRecord> for Spline {
    fn from(rec: SplineRecord) -> Self {
        Self {
            cp: rec.control_points,
            closed: rec.closed,
            curve: OnceCell::new(),
        }
    }
}

impl From<Spline> for SplineRecord {
    fn from(s: Spline) -> Self {
        Self {
            control_points: s.cp,
            closed: s.closed,
        }
    }
}

impl Spline {
    /// 空的开曲线.
    #[inline]
    pub fn new_open() -> Self {
        Self::default()
    }

    /// 空的闭曲线.
    #[inline]
    pub fn new_closed() -> Self {
        Self {
            closed: true,
            ..Self::default()
        }
    }

    /// 从稠密坐标中等距挑选 `num_cp` 个控制点构造开曲线. 首尾点总会被选中.
    pub fn from_coords(coords: &[Point2d], num_cp: usize) -> Self {
        assert!(num_cp >= 2, "至少需要两个控制点");
        let n = coords.len();
        let cp = if n <= num_cp {
            coords.to_vec()
        } else {
            (0..num_cp)
                .map(|i| (i * (n - 1) + (num_cp - 1) / 2) / (num_cp - 1))
                .dedup()
                .map(|i| coords[i])
                .collect()
        };
        Self {
            cp,
            ..Self::default()
        }
    }

    /// 持久化记录.
    #[inline]
    pub fn to_record(&self) -> SplineRecord {
        SplineRecord {
            control_points: self.cp.clone(),
            closed: self.closed,
        }
    }

    /// 控制点.
    #[inline]
    pub fn control_points(&self) -> &[Point2d] {
        &self.cp
    }

    /// 是否为闭曲线.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// 当前曲线类型的最少控制点个数.
    #[inline]
    pub fn min_points(&self) -> usize {
        if self.closed {
            MIN_CLOSED_POINTS
        } else {
            MIN_OPEN_POINTS
        }
    }

    /// 控制点不足以定义曲线.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cp.len() < self.min_points()
    }

    #[inline]
    fn invalidate(&mut self) {
        self.curve.take();
    }

    /// 插入新控制点, 返回其下标.
    ///
    /// 开曲线按 `x` 升序插入 (`x` 相同时插在已有点之后); 闭曲线插在投影距离最近的线段中.
    pub fn add_control_point(&mut self, x: f64, y: f64) -> usize {
        let p = (x, y);
        let n = self.cp.len();
        let idx = if !self.closed {
            self.cp.partition_point(|q| q.0 <= x)
        } else if n < 2 {
            n
        } else {
            (0..n)
                .filter_map(|i| {
                    let d = segment_distance(p, self.cp[i], self.cp[(i + 1) % n]);
                    NotNan::new(d).ok().map(|d| (i, d))
                })
                .min_by_key(|&(_, d)| d)
                .map_or(n, |(i, _)| i + 1)
        };
        self.cp.insert(idx, p);
        self.invalidate();
        idx
    }

    /// 删除控制点. 若删除后点数低于最小值或下标越界, 则什么也不做并返回 `false`.
    pub fn remove_control_point(&mut self, index: usize) -> bool {
        if self.cp.len() <= self.min_points() || index >= self.cp.len() {
            return false;
        }
        self.cp.remove(index);
        self.invalidate();
        true
    }

    /// 移动控制点, 返回其新的下标.
    ///
    /// 闭曲线下标按点数取模. 开曲线移动后会重新排序以保持 `x` 升序,
    /// 因此返回值可能与 `index` 不同. 样条没有控制点或开曲线下标越界时什么也不做,
    /// 返回 `None`.
    pub fn update_control_point(&mut self, index: usize, x: f64, y: f64) -> Option<usize> {
        let n = self.cp.len();
        let mut idx = match (self.closed, n) {
            (_, 0) => return None,
            (true, _) => index % n,
            (false, _) if index < n => index,
            (false, _) => return None,
        };
        self.cp[idx] = (x, y);
        if !self.closed {
            while idx > 0 && self.cp[idx - 1].0 > x {
                self.cp.swap(idx - 1, idx);
                idx -= 1;
            }
            while idx + 1 < n && self.cp[idx + 1].0 < x {
                self.cp.swap(idx, idx + 1);
                idx += 1;
            }
        }
        self.invalidate();
        Some(idx)
    }

    /// 稠密曲线. 结果被缓存, 直至下一次修改.
    pub fn get_curve(&self) -> &[Point2d] {
        self.curve.get_or_init(|| catmull_rom_curve(&self.cp, self.closed))
    }

    /// 以 `degree` 次多项式近似稠密曲线, 定义域为曲线的 `x` 范围.
    /// 样条为空时返回 `None`.
    pub fn polynomial_approximation(&self, degree: usize) -> Option<PolyCurve> {
        self.polynomial_approximation_within(degree, f64::NEG_INFINITY, f64::INFINITY)
    }

    /// 以 `degree` 次多项式近似稠密曲线落在 `[lo, hi]` 内的部分.
    pub fn polynomial_approximation_within(
        &self,
        degree: usize,
        lo: f64,
        hi: f64,
    ) -> Option<PolyCurve> {
        if self.is_empty() {
            return None;
        }
        let (xs, ys): (Vec<f64>, Vec<f64>) = self
            .get_curve()
            .iter()
            .filter(|p| (lo..=hi).contains(&p.0))
            .copied()
            .unzip();
        let (xs, ys) = (Array1::from(xs), Array1::from(ys));
        PolyCurve::fit(xs.view(), ys.view(), degree)
    }
}

/// 点 `p` 到线段 `ab` 的距离.
fn segment_distance(p: Point2d, a: Point2d, b: Point2d) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (qx, qy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - qx).powi(2) + (p.1 - qy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Spline {
        let coords: Vec<Point2d> = (0..=100)
            .map(|x| (x as f64, (x as f64 / 10.0).sin() * 5.0))
            .collect();
        Spline::from_coords(&coords, 10)
    }

    #[test]
    fn test_from_coords_keeps_ends() {
        let s = sample();
        assert_eq!(s.control_points().len(), 10);
        assert_eq!(s.control_points()[0].0, 0.0);
        assert_eq!(s.control_points()[9].0, 100.0);
        assert!(!s.is_empty());
    }

    /// 序列化后再反序列化应得到完全相同的控制点和曲线类型.
    #[test]
    fn test_record_round_trip() {
        let mut s = sample();
        s.update_control_point(3, 31.123456789012345, -2.718281828459045);
        let json = serde_json::to_string(&s).unwrap();
        let back: Spline = serde_json::from_str(&json).unwrap();
        assert_eq!(back.control_points(), s.control_points());
        assert_eq!(back.is_closed(), s.is_closed());

        let closed = Spline::from(SplineRecord {
            control_points: vec![(0.1, 0.2), (3.0, 0.7), (1.5, 4.0)],
            closed: true,
        });
        let back: Spline = serde_json::from_str(&serde_json::to_string(&closed).unwrap()).unwrap();
        assert_eq!(back, closed);
        assert!(back.is_closed());
    }

    #[test]
    fn test_record_json_layout() {
        let s = Spline::from(SplineRecord {
            control_points: vec![(1.0, 2.0)],
            closed: false,
        });
        let v: serde_json::Value = serde_json::to_value(&s).unwrap();
        assert_eq!(v["closed"], serde_json::Value::Bool(false));
        assert_eq!(v["control_points"][0][1], serde_json::json!(2.0));
    }

    /// 控制点不足时删除是空操作.
    #[test]
    fn test_remove_below_minimum_is_noop() {
        let mut s = Spline::from(SplineRecord {
            control_points: vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (3.0, 1.0)],
            closed: false,
        });
        let before = s.control_points().to_vec();
        assert!(!s.remove_control_point(1));
        assert_eq!(s.control_points(), before.as_slice());

        s.add_control_point(1.5, 0.5);
        assert!(s.remove_control_point(0));
        assert_eq!(s.control_points().len(), 4);
        assert!(!s.remove_control_point(10));
    }

    #[test]
    fn test_add_control_point_position() {
        let mut s = Spline::from(SplineRecord {
            control_points: vec![(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)],
            closed: false,
        });
        assert_eq!(s.add_control_point(15.0, 1.0), 2);
        assert_eq!(s.add_control_point(-5.0, 0.0), 0);
        let n = s.control_points().len();
        assert_eq!(s.add_control_point(40.0, 0.0), n);
    }

    /// 远离最近线段的新点仍按 `x` 升序插入.
    #[test]
    fn test_add_keeps_x_order() {
        let mut s = Spline::from(SplineRecord {
            control_points: vec![(0.0, 0.0), (10.0, 30.0), (20.0, 0.0), (30.0, 0.0)],
            closed: false,
        });
        assert_eq!(s.add_control_point(12.0, 40.0), 2);
        assert_eq!(s.add_control_point(10.0, -5.0), 2);
        let xs: Vec<f64> = s.control_points().iter().map(|p| p.0).collect();
        assert_eq!(xs, vec![0.0, 10.0, 10.0, 12.0, 20.0, 30.0]);
        assert_eq!(s.control_points()[2], (10.0, -5.0));

        let mut c = Spline::from(SplineRecord {
            control_points: vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            closed: true,
        });
        assert_eq!(c.add_control_point(-1.0, 5.0), 4);
        assert_eq!(c.add_control_point(11.0, 5.0), 2);
    }

    /// 空样条或越界下标的移动是空操作.
    #[test]
    fn test_update_out_of_range_is_noop() {
        let mut empty = Spline::new_open();
        assert_eq!(empty.update_control_point(0, 1.0, 2.0), None);
        assert!(empty.control_points().is_empty());
        assert_eq!(Spline::new_closed().update_control_point(3, 1.0, 2.0), None);

        let mut s = Spline::from(SplineRecord {
            control_points: vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (3.0, 1.0)],
            closed: false,
        });
        let before = s.control_points().to_vec();
        assert_eq!(s.update_control_point(7, 9.0, 9.0), None);
        assert_eq!(s.control_points(), before.as_slice());
    }

    /// 越过邻居的移动需要重新排序.
    #[test]
    fn test_update_reorders() {
        let mut s = Spline::from(SplineRecord {
            control_points: vec![(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)],
            closed: false,
        });
        assert_eq!(s.update_control_point(1, 25.0, 3.0), Some(2));
        assert_eq!(s.control_points()[2], (25.0, 3.0));
        assert_eq!(s.update_control_point(2, 24.0, 3.0), Some(2));

        let mut c = Spline::from(SplineRecord {
            control_points: vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)],
            closed: true,
        });
        assert_eq!(c.update_control_point(4, 11.0, 1.0), Some(1));
        assert_eq!(c.control_points()[1], (11.0, 1.0));
    }

    /// 修改会使缓存的稠密曲线失效.
    #[test]
    fn test_mutation_invalidates_curve() {
        let mut s = sample();
        let before = s.get_curve().to_vec();
        s.update_control_point(5, 55.0, 40.0);
        let after = s.get_curve();
        assert_ne!(before, after);
        assert!(after.iter().any(|p| p.0 == 55.0 && p.1 == 40.0));
    }

    #[test]
    fn test_polynomial_approximation() {
        let coords: Vec<Point2d> = (0..=60).map(|x| (x as f64, 0.5 * x as f64 + 3.0)).collect();
        let s = Spline::from_coords(&coords, 6);
        let p = s.polynomial_approximation(2).unwrap();
        assert!((p.eval(30.0) - 18.0).abs() < 1e-6);
        assert_eq!(p.start(), 0.0);
        assert_eq!(p.end(), 60.0);

        let sub = s.polynomial_approximation_within(1, 10.0, 20.0).unwrap();
        assert!(sub.start() >= 10.0 && sub.end() <= 20.0);
        assert!(Spline::new_open().polynomial_approximation(2).is_none());
    }
}
