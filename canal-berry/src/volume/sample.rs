//! 插值采样.
//!
//! 坐标在网格范围外时返回 `None`, 由调用方填充背景值 0.

use ndarray::{ArrayView3, ArrayViewMut1};

/// 把 `[0, len - 1]` 内的坐标拆成 `(floor, ceil, frac)`. 越界返回 `None`.
#[inline]
fn split(v: f64, len: usize) -> Option<(usize, usize, f64)> {
    if len == 0 || !(0.0..=(len - 1) as f64).contains(&v) {
        return None;
    }
    let lo = v.floor();
    Some((lo as usize, v.ceil() as usize, v - lo))
}

/// 对 `(x, y)` 处整条深度列做双线性插值, 写入 `out`.
///
/// 越界时不写入并返回 `false`.
pub fn bilinear_column<T>(
    volume: ArrayView3<T>,
    x: f64,
    y: f64,
    mut out: ArrayViewMut1<f32>,
) -> bool
where
    T: Copy + Into<f64>,
{
    let (_, height, width) = volume.dim();
    let (Some((x0, x1, fx)), Some((y0, y1, fy))) = (split(x, width), split(y, height)) else {
        return false;
    };
    let w00 = (1.0 - fx) * (1.0 - fy);
    let w01 = fx * (1.0 - fy);
    let w10 = (1.0 - fx) * fy;
    let w11 = fx * fy;
    for (z, o) in out.iter_mut().enumerate() {
        let v = w00 * volume[(z, y0, x0)].into()
            + w01 * volume[(z, y0, x1)].into()
            + w10 * volume[(z, y1, x0)].into()
            + w11 * volume[(z, y1, x1)].into();
        *o = v as f32;
    }
    true
}

/// 三线性插值. 越界返回 `None`.
pub fn trilinear<T>(volume: ArrayView3<T>, x: f64, y: f64, z: f64) -> Option<f32>
where
    T: Copy + Into<f64>,
{
    let (depth, height, width) = volume.dim();
    let (x0, x1, fx) = split(x, width)?;
    let (y0, y1, fy) = split(y, height)?;
    let (z0, z1, fz) = split(z, depth)?;
    let lerp = |a: f64, b: f64, t: f64| a + (b - a) * t;
    let at = |z: usize, y: usize, x: usize| -> f64 { volume[(z, y, x)].into() };

    let c0 = lerp(
        lerp(at(z0, y0, x0), at(z0, y0, x1), fx),
        lerp(at(z0, y1, x0), at(z0, y1, x1), fx),
        fy,
    );
    let c1 = lerp(
        lerp(at(z1, y0, x0), at(z1, y0, x1), fx),
        lerp(at(z1, y1, x0), at(z1, y1, x1), fx),
        fy,
    );
    Some(lerp(c0, c1, fz) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array3};

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    /// 体积值 = x + 10 * y + 100 * z, 线性插值应当精确.
    fn ramp() -> Array3<f32> {
        Array3::from_shape_fn((3, 4, 5), |(z, y, x)| (x + 10 * y + 100 * z) as f32)
    }

    #[test]
    fn test_bilinear_column() {
        let vol = ramp();
        let mut out = Array1::<f32>::zeros(3);
        assert!(bilinear_column(vol.view(), 1.5, 2.25, out.view_mut()));
        for z in 0..3 {
            assert!(float_eq(out[z], 1.5 + 22.5 + 100.0 * z as f32));
        }
        // 边界上的整数坐标.
        assert!(bilinear_column(vol.view(), 4.0, 3.0, out.view_mut()));
        assert!(float_eq(out[0], 34.0));
    }

    #[test]
    fn test_bilinear_out_of_range() {
        let vol = ramp();
        let mut out = Array1::<f32>::zeros(3);
        assert!(!bilinear_column(vol.view(), -0.1, 1.0, out.view_mut()));
        assert!(!bilinear_column(vol.view(), 1.0, 3.5, out.view_mut()));
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_trilinear() {
        let vol = ramp();
        assert!(float_eq(trilinear(vol.view(), 0.5, 0.5, 0.5).unwrap(), 55.5));
        assert!(float_eq(trilinear(vol.view(), 4.0, 3.0, 2.0).unwrap(), 234.0));
        assert!(trilinear(vol.view(), 0.0, 0.0, 2.5).is_none());

        let labels = Array3::<u8>::from_elem((2, 2, 2), 2);
        assert!(float_eq(trilinear(labels.view(), 0.3, 0.7, 0.1).unwrap(), 2.0));
    }
}
