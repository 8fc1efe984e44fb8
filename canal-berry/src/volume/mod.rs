//! 扫描体积.
//!
//! [`VolumeSource`] 是扫描加载器 (颌骨扫描) 对外暴露的最小接口:
//! 强度体积, 同形状的标注体积, 以及若干基于插值的取样操作.
//! [`Jaw`] 是其内存实现, 可直接由数组构造或从 nii 文件打开.

use std::path::Path;

use log::info;
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::arch::SideCoords;
use crate::error::{ArchError, ArchResult};
use crate::plane::Plane;
use crate::progress::{tick, Progress};
use crate::{Idx3d, Point2d};

mod sample;

pub use sample::{bilinear_column, trilinear};

/// 扫描体积的共用属性和取样操作. 体积按照 `[z, H, W]` 访问.
pub trait VolumeSource {
    /// 强度体积.
    fn volume(&self) -> ArrayView3<f32>;

    /// 标注体积.
    fn gt_volume(&self) -> ArrayView3<u8>;

    /// 替换标注体积. 形状必须与强度体积一致.
    fn set_gt_volume(&mut self, gt: Array3<u8>) -> ArchResult<()>;

    /// 获取数据形状大小 `(Z, H, W)`.
    #[inline]
    fn shape(&self) -> Idx3d {
        self.volume().dim()
    }

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取第 `z` 张水平切片. 越界返回 `None`.
    fn slice_at(&self, z: usize) -> Option<ArrayView2<f32>> {
        (z < self.len_z()).then(|| self.volume().index_axis_move(ndarray::Axis(0), z))
    }

    /// 整个强度体积的有限值范围 `(min, max)`. 没有有限值时返回 `None`.
    fn intensity_range(&self) -> Option<(f32, f32)> {
        self.volume()
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((v.min(lo), v.max(hi))),
            })
    }

    /// 沿 2D 曲线双线性插值得到全景图, 形状为 `(Z, curve.len())`.
    fn panorex(&self, curve: &[Point2d]) -> Array2<f32> {
        let vol = self.volume();
        let mut pano = Array2::zeros((vol.dim().0, curve.len()));
        for (i, &(x, y)) in curve.iter().enumerate() {
            bilinear_column(vol, x, y, pano.column_mut(i));
        }
        pano
    }

    /// 沿每条侧视采样线直切体积, 返回 `(强度, 标注)`, 形状均为
    /// `(lines, Z, max_len)`. 较短的线以背景值 0 补齐.
    fn line_slice(
        &self,
        side: &SideCoords,
        progress: &mut dyn Progress,
    ) -> ArchResult<(Array3<f32>, Array3<f32>)> {
        let (vol, gt) = (self.volume(), self.gt_volume());
        let depth = vol.dim().0;
        let width = side.iter().map(Vec::len).max().unwrap_or(0);
        let mut data = Array3::zeros((side.len(), depth, width));
        let mut gt_cut = Array3::zeros((side.len(), depth, width));
        for (z_id, line) in side.iter().enumerate() {
            tick(progress, z_id, side.len())?;
            for (w_id, &(x, y)) in line.iter().enumerate() {
                bilinear_column(vol, x, y, data.slice_mut(s![z_id, .., w_id]));
                bilinear_column(gt, x, y, gt_cut.slice_mut(s![z_id, .., w_id]));
            }
        }
        Ok((data, gt_cut))
    }

    /// 沿平面三线性插值. `cut_gt` 为 `true` 时对标注体积取样.
    fn plane_slice(&self, plane: &Plane, cut_gt: bool) -> Array2<f32> {
        let (xs, ys, zs) = (plane.x(), plane.y(), plane.z());
        if cut_gt {
            let gt = self.gt_volume();
            Array2::from_shape_fn(plane.dim(), |p| {
                trilinear(gt, xs[p], ys[p], zs[p]).unwrap_or(0.0)
            })
        } else {
            let vol = self.volume();
            Array2::from_shape_fn(plane.dim(), |p| {
                trilinear(vol, xs[p], ys[p], zs[p]).unwrap_or(0.0)
            })
        }
    }
}

/// 内存中的颌骨扫描.
#[derive(Debug, Clone)]
pub struct Jaw {
    volume: Array3<f32>,
    gt: Array3<u8>,
}

impl Jaw {
    /// 由强度体积和标注体积构造. 两者形状必须一致.
    pub fn new(volume: Array3<f32>, gt: Array3<u8>) -> ArchResult<Self> {
        ArchError::check_shape(volume.shape(), gt.shape())?;
        Ok(Self { volume, gt })
    }

    /// 由强度体积构造, 标注体积全部未标注.
    pub fn from_volume(volume: Array3<f32>) -> Self {
        let gt = Array3::zeros(volume.raw_dim());
        Self { volume, gt }
    }

    /// 打开 nii 文件格式的扫描. 标注体积全部未标注.
    pub fn open<P: AsRef<Path>>(path: P) -> ArchResult<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let data = obj.into_volume().into_ndarray::<f32>()?;
        if data.ndim() != 3 {
            return Err(ArchError::InvalidShape {
                expected: vec![0, 0, 0],
                found: data.shape().to_vec(),
            });
        }

        // [W, H, z] -> [z, H, W].
        let data = data
            .permuted_axes([2, 1, 0].as_slice())
            .into_dimensionality::<Ix3>()
            .map_err(|_| ArchError::GeometryMismatch("volume axes"))?
            .as_standard_layout()
            .into_owned();
        info!("opened scan {} with shape {:?}", path.as_ref().display(), data.dim());
        Ok(Self::from_volume(data))
    }

    /// 取出内部数组.
    #[inline]
    pub fn into_raw(self) -> (Array3<f32>, Array3<u8>) {
        (self.volume, self.gt)
    }
}

impl VolumeSource for Jaw {
    #[inline]
    fn volume(&self) -> ArrayView3<f32> {
        self.volume.view()
    }

    #[inline]
    fn gt_volume(&self) -> ArrayView3<u8> {
        self.gt.view()
    }

    fn set_gt_volume(&mut self, gt: Array3<u8>) -> ArchResult<()> {
        ArchError::check_shape(self.volume.shape(), gt.shape())?;
        self.gt = gt;
        Ok(())
    }
}
