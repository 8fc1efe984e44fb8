//! 侧视采样线.

use crate::arch::perpendicular_cos_sin;
use crate::Point2d;

/// 一条侧视采样线.
pub type Line = Vec<Point2d>;

/// 所有侧视采样线, 按牙弓位置排列.
pub type SideCoords = Vec<Line>;

/// 为牙弓上的每个位置生成一条垂直采样线.
///
/// 第 `i` 条线从 `high[i]` 出发, 以单位步长沿斜率为 `slopes[i]` 的方向走向 `low[i]`.
/// `slopes` 是法线斜率 (已经过有界化). 若指定 `extent`, 每条线恰有 `extent` 个点;
/// 否则点数取 `|dx|` 与 `|dy|` 中较大者, 保证不跳过任何像素.
///
/// 沿线 `y` 单调不减.
pub fn generate_side_coords(
    high: &[Point2d],
    low: &[Point2d],
    slopes: &[f64],
    extent: Option<usize>,
) -> SideCoords {
    assert_eq!(high.len(), low.len(), "两条偏移曲线长度必须相同");
    assert_eq!(high.len(), slopes.len(), "斜率个数必须与曲线点数相同");

    itertools::izip!(high, low, slopes)
        .map(|(&(x1, y1), &(x2, y2), &alfa)| {
            let sign = if alfa > 0.0 { 1.0 } else { -1.0 };
            let (cos, sin) = perpendicular_cos_sin(alfa);
            let n = extent.unwrap_or_else(|| {
                let x_dist = 1 + (x1 - x2).abs().ceil() as usize;
                let y_dist = 1 + (y1 - y2).abs().ceil() as usize;
                x_dist.max(y_dist)
            });
            (0..n)
                .map(|i| {
                    let i = i as f64;
                    (x1 + sign * i * cos, y1 + i * sin)
                })
                .collect()
        })
        .collect()
}
