//! Catmull-Rom 插值.

use crate::Point2d;

/// 计算 Catmull-Rom 曲线在 `p1` 与 `p2` 之间的点. `t` 属于 `[0, 1]`.
#[inline]
pub(crate) fn catmull_rom_point(
    p0: Point2d,
    p1: Point2d,
    p2: Point2d,
    p3: Point2d,
    t: f64,
) -> Point2d {
    let t2 = t * t;
    let t3 = t2 * t;
    let basis = |a: f64, b: f64, c: f64, d: f64| {
        0.5 * ((2.0 * b)
            + (-a + c) * t
            + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (-a + 3.0 * b - 3.0 * c + d) * t3)
    };
    (basis(p0.0, p1.0, p2.0, p3.0), basis(p0.1, p1.1, p2.1, p3.1))
}

/// 稠密采样整条曲线.
///
/// 每段的采样数按照段长确定, 使相邻采样点间距约为 1 个单位.
/// 开曲线在首尾重复端点, 闭曲线首尾环绕.
pub(crate) fn catmull_rom_curve(cp: &[Point2d], closed: bool) -> Vec<Point2d> {
    let n = cp.len();
    if n < 2 {
        return cp.to_vec();
    }
    let spans = if closed { n } else { n - 1 };
    let mut result = Vec::new();
    for i in 0..spans {
        let p0 = if closed {
            cp[(i + n - 1) % n]
        } else {
            cp[i.saturating_sub(1)]
        };
        let p1 = cp[i];
        let p2 = cp[(i + 1) % n];
        let p3 = if closed {
            cp[(i + 2) % n]
        } else {
            cp[(i + 2).min(n - 1)]
        };

        let len = ((p2.0 - p1.0).powi(2) + (p2.1 - p1.1).powi(2)).sqrt();
        let steps = (len.ceil() as usize).max(1);
        for j in 0..steps {
            result.push(catmull_rom_point(p0, p1, p2, p3, j as f64 / steps as f64));
        }
    }
    if !closed {
        result.push(cp[n - 1]);
    }
    result
}
