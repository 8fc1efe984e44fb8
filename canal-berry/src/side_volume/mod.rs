//! 侧视体积.
//!
//! 沿牙弓展开的体积, 下标为 `[牙弓位置, 深度, 采样线宽度]`. 同时保存与之平行的标注层.
//!
//! 体积保存两份数据: 用于显示和编辑的缩放版本 (`data`/`gt`), 以及几何精确的未缩放版本
//! (`original`/`original_gt`), 后者用于反投影与持久化.

use log::{info, warn};
use ndarray::{Array3, ArrayView2};

use crate::arch::SideCoords;
use crate::error::{ArchError, ArchResult};
use crate::plane::Plane;
use crate::progress::Progress;
use crate::spline::Spline;
use crate::volume::VolumeSource;

mod persist;
mod resample;

use resample::{normalize, rescale, slice_at, Resampled};

/// 侧视体积的构造方式.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideVolumeKind {
    /// 竖直直切.
    Straight,

    /// 沿下颌管曲线倾斜的平面.
    Tilted,
}

impl SideVolumeKind {
    /// 由标志位选择.
    #[inline]
    pub const fn from_tilted(tilted: bool) -> Self {
        if tilted {
            Self::Tilted
        } else {
            Self::Straight
        }
    }

    /// 是否是倾斜平面?
    #[inline]
    pub const fn is_tilted(self) -> bool {
        matches!(self, Self::Tilted)
    }

    /// 持久化目录名.
    #[inline]
    pub const fn dirname(self) -> &'static str {
        use crate::consts::files::{STRAIGHT_DIR, TILTED_DIR};
        match self {
            Self::Straight => STRAIGHT_DIR,
            Self::Tilted => TILTED_DIR,
        }
    }
}

/// 侧视体积.
///
/// 构造失败 (例如被取消) 时 `is_correct()` 为 `false`, 此时所有数组为空,
/// 使用方必须先检查该标志.
#[derive(Debug, Clone)]
pub struct SideVolume {
    kind: SideVolumeKind,
    scale: f64,
    correct: bool,

    /// 未缩放, 已规范化.
    original: Array3<f32>,

    /// 未缩放, 原始标注值.
    original_gt: Array3<f32>,

    /// 缩放并规范化.
    data: Array3<f32>,

    /// 缩放并规范化 (与 `data` 相互独立).
    gt: Array3<f32>,

    /// 每个牙弓位置的倾斜平面. 直切体积为空.
    planes: Vec<Option<Plane>>,
}

impl SideVolume {
    /// 重采样扫描体积.
    ///
    /// `canals` 为左, 右下颌管样条, 只在倾斜模式下使用, 按先左后右的顺序依次计算.
    /// 进度回调请求取消时返回一个 `is_correct() == false` 的体积, 不提交任何部分结果.
    pub fn build<S>(
        kind: SideVolumeKind,
        scan: &S,
        side: &SideCoords,
        canals: [&Spline; 2],
        canal_degree: usize,
        scale: f64,
        progress: &mut dyn Progress,
    ) -> Self
    where
        S: VolumeSource + ?Sized,
    {
        let res = match kind {
            SideVolumeKind::Straight => resample::straight(scan, side, progress),
            SideVolumeKind::Tilted => {
                resample::tilted(scan, side, canals, canal_degree, progress)
            }
        };
        match res {
            Ok(raw) => {
                let sv = Self::from_resampled(kind, scale, raw);
                info!("built {kind:?} side volume of shape {:?}", sv.original.dim());
                sv
            }
            Err(e) => {
                warn!("side volume not built: {e}");
                Self::failed(kind, scale)
            }
        }
    }

    /// 构造失败的占位体积.
    fn failed(kind: SideVolumeKind, scale: f64) -> Self {
        Self {
            kind,
            scale,
            correct: false,
            original: Array3::zeros((0, 0, 0)),
            original_gt: Array3::zeros((0, 0, 0)),
            data: Array3::zeros((0, 0, 0)),
            gt: Array3::zeros((0, 0, 0)),
            planes: Vec::new(),
        }
    }

    /// 后处理: 缩放后分别规范化 `data` 与 `gt`, 并规范化未缩放数据. 未缩放标注保持原值.
    fn from_resampled(kind: SideVolumeKind, scale: f64, raw: Resampled) -> Self {
        let Resampled {
            data: mut original,
            gt: original_gt,
            planes,
        } = raw;
        let mut data = rescale(&original, scale);
        let mut gt = rescale(&original_gt, scale);
        normalize(&mut data);
        normalize(&mut gt);
        normalize(&mut original);
        Self {
            kind,
            scale,
            correct: true,
            original,
            original_gt,
            data,
            gt,
            planes,
        }
    }

    /// 构造方式.
    #[inline]
    pub fn kind(&self) -> SideVolumeKind {
        self.kind
    }

    /// 显示缩放倍率.
    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// 是否构造成功?
    #[inline]
    pub fn is_correct(&self) -> bool {
        self.correct
    }

    /// 牙弓位置个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.original.dim().0
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 位置 `pos` 处的缩放切片.
    #[inline]
    pub fn get_slice(&self, pos: usize) -> Option<ArrayView2<f32>> {
        slice_at(&self.data, pos)
    }

    /// 位置 `pos` 处的缩放标注切片.
    #[inline]
    pub fn gt_slice(&self, pos: usize) -> Option<ArrayView2<f32>> {
        slice_at(&self.gt, pos)
    }

    /// 缩放体积.
    #[inline]
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// 缩放标注.
    #[inline]
    pub fn gt(&self) -> &Array3<f32> {
        &self.gt
    }

    /// 未缩放体积.
    #[inline]
    pub fn original(&self) -> &Array3<f32> {
        &self.original
    }

    /// 未缩放标注.
    #[inline]
    pub fn original_gt(&self) -> &Array3<f32> {
        &self.original_gt
    }

    /// 倾斜平面.
    #[inline]
    pub fn planes(&self) -> &[Option<Plane>] {
        &self.planes
    }

    /// 构造失败时返回 [`ArchError::Cancelled`].
    #[inline]
    pub fn check(&self) -> ArchResult<()> {
        if self.correct {
            Ok(())
        } else {
            Err(ArchError::Cancelled)
        }
    }
}
