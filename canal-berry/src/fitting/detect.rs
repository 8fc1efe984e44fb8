//! 单张切片上的牙弓检测.

use log::debug;
use ndarray::{Array1, ArrayView2};

use crate::config::DetectionConfig;
use crate::fitting::PolyCurve;
use crate::morph;

/// 从一张 (近似二值的) 横切面提取牙弓多项式曲线.
///
/// 流程: 小核闭运算合并碎片 -> 二值化 -> 大核闭运算填洞 -> 丢弃小连通域
/// -> 细化 -> 丢弃短骨架轮廓 -> 以剩余骨架像素拟合 `x -> y` 多项式.
/// 定义域为骨架像素 `x` 的最小值和最大值.
///
/// 没有剩余前景时返回 `None`. 该函数是纯函数, 不做 I/O.
pub fn arch_detection(slice: ArrayView2<f32>, cfg: &DetectionConfig) -> Option<PolyCurve> {
    let closed = morph::grey_close(slice, &morph::ellipse_kernel(cfg.close_kernel));
    let arch = morph::threshold(closed.view(), cfg.binary_threshold);
    let arch = morph::binary_close(arch.view(), &morph::ellipse_kernel(cfg.fill_kernel));
    let arch = morph::drop_small_areas(arch.view(), cfg.min_area);
    let skel = morph::thin(arch.view());

    let (mut xs, mut ys) = (Vec::new(), Vec::new());
    for contour in morph::areas8(skel.view())
        .into_iter()
        .filter(|c| c.len() > cfg.min_contour)
    {
        for (h, w) in contour {
            xs.push(w as f64);
            ys.push(h as f64);
        }
    }
    debug!("arch detection: {} skeleton pixels kept", xs.len());

    let (xs, ys) = (Array1::from(xs), Array1::from(ys));
    PolyCurve::fit(xs.view(), ys.view(), cfg.degree)
}

#[cfg(test)]
mod tests {
    use super::arch_detection;
    use crate::config::DetectionConfig;
    use ndarray::Array2;

    fn parabola(x: f64) -> f64 {
        100.0 + 0.002 * (x - 300.0).powi(2)
    }

    /// 弧形实心带, 宽约 21 像素, 横跨 x = 20..=580.
    fn arch_mask() -> Array2<f32> {
        Array2::from_shape_fn((300, 600), |(h, w)| {
            let x = w as f64;
            let inside = (20.0..=580.0).contains(&x) && (h as f64 - parabola(x)).abs() <= 10.0;
            if inside {
                1.0
            } else {
                0.0
            }
        })
    }

    /// 12 次拟合的定义域应覆盖掩膜 x 范围的 90% 以上.
    #[test]
    fn test_detection_covers_mask() {
        let mask = arch_mask();
        assert!(mask.sum() >= 10000.0);
        let curve = arch_detection(mask.view(), &DetectionConfig::default()).unwrap();
        let coverage = (curve.end() - curve.start()) / (580.0 - 20.0);
        assert!(coverage >= 0.9, "coverage = {coverage}");
        assert!((curve.eval(300.0) - parabola(300.0)).abs() < 3.0);
        assert!((curve.eval(150.0) - parabola(150.0)).abs() < 3.0);
    }

    #[test]
    fn test_detection_absent_on_empty() {
        let mask = Array2::<f32>::zeros((64, 64));
        assert!(arch_detection(mask.view(), &DetectionConfig::default()).is_none());
    }

    /// 面积不足的连通域会被丢弃.
    #[test]
    fn test_detection_absent_on_small_blob() {
        let mut mask = Array2::<f32>::zeros((128, 128));
        mask.slice_mut(ndarray::s![40..80, 20..100]).fill(1.0);
        assert!(arch_detection(mask.view(), &DetectionConfig::default()).is_none());
    }
}
