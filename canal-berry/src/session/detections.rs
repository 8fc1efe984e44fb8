//! 按切片缓存的牙弓检测结果.

use log::debug;
use ndarray::{Array2, ArrayView2};

use crate::config::DetectionConfig;
use crate::error::{ArchError, ArchResult};
use crate::fitting::{arch_detection, PolyCurve};
use crate::volume::VolumeSource;

/// 单张切片的检测状态.
#[derive(Debug, Clone, PartialEq)]
enum Detection {
    /// 尚未计算.
    Pending,

    /// 计算过, 但没有找到曲线.
    Absent,

    /// 检测结果 (或用户编辑后的结果).
    Found(PolyCurve),
}

/// 按需计算并缓存每张水平切片的牙弓曲线.
///
/// 检测前切片按整个体积的强度范围线性映射到 `[0, 1]`,
/// 因此二值化阈值与扫描的原始强度单位无关.
#[derive(Debug, Clone)]
pub struct ArchDetections {
    cfg: DetectionConfig,
    data: Vec<Detection>,

    /// 体积强度范围, 第一次检测时计算.
    range: Option<(f32, f32)>,
}

/// 把切片线性映射到 `[0, 1]`. 范围退化时全部映射为 0.
fn normalize(slice: ArrayView2<f32>, (lo, hi): (f32, f32)) -> Array2<f32> {
    let span = hi - lo;
    slice.mapv(|v| {
        if span > 0.0 && v.is_finite() {
            ((v - lo) / span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    })
}

impl ArchDetections {
    /// 为 `len_z` 张切片初始化.
    pub fn new(len_z: usize, cfg: DetectionConfig) -> Self {
        Self {
            cfg,
            data: vec![Detection::Pending; len_z],
            range: None,
        }
    }

    /// 切片个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否没有切片?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 第 `slice` 张切片的检测结果. 未计算或上次没有找到曲线时 (重新) 计算.
    ///
    /// 下标越界时返回 `None`.
    pub fn get<S>(&mut self, scan: &S, slice: usize) -> Option<&PolyCurve>
    where
        S: VolumeSource + ?Sized,
    {
        if slice >= self.data.len() {
            return None;
        }
        if !matches!(self.data[slice], Detection::Found(_)) {
            let range = match self.range {
                Some(range) => range,
                None => {
                    let range = scan.intensity_range().unwrap_or((0.0, 0.0));
                    debug!("detection intensity range: {range:?}");
                    self.range = Some(range);
                    range
                }
            };
            let cfg = &self.cfg;
            let found = scan
                .slice_at(slice)
                .and_then(|s| arch_detection(normalize(s, range).view(), cfg));
            self.data[slice] = match found {
                Some(curve) => Detection::Found(curve),
                None => {
                    debug!("no arch detected on slice {slice}");
                    Detection::Absent
                }
            };
        }
        match &self.data[slice] {
            Detection::Found(curve) => Some(curve),
            _ => None,
        }
    }

    /// 记录第 `slice` 张切片的曲线. `None` 表示该切片没有曲线.
    pub fn set(&mut self, slice: usize, curve: Option<PolyCurve>) {
        if let Some(entry) = self.data.get_mut(slice) {
            *entry = curve.map_or(Detection::Absent, Detection::Found);
        }
    }

    /// 离 `slice` 最近且存在检测结果的切片, 按 `slice, slice - 1, slice + 1, slice - 2, ...`
    /// 的顺序查找.
    ///
    /// 所有切片都没有结果时返回 [`ArchError::DetectionAbsent`].
    pub fn nearest<S>(&mut self, scan: &S, slice: usize) -> ArchResult<(usize, PolyCurve)>
    where
        S: VolumeSource + ?Sized,
    {
        let n = self.data.len();
        let candidates = (0..n).flat_map(|d| {
            let below = slice.checked_sub(d);
            let above = (d > 0).then(|| slice + d);
            below.into_iter().chain(above)
        });
        for s in candidates.filter(|&s| s < n) {
            if let Some(curve) = self.get(scan, s) {
                if s != slice {
                    debug!("slice {slice} falls back to detection of slice {s}");
                }
                return Ok((s, curve.clone()));
            }
        }
        Err(ArchError::DetectionAbsent { slice })
    }
}
