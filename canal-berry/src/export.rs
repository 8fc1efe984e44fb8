//! 切片图像导出.

use std::path::Path;

use image::{GrayImage, ImageResult, Luma};
use ndarray::{Array2, ArrayView2};

use crate::consts::label::{CONTOUR, INSIDE, UNLABELED};

/// 表明一个可以通过 **可视化友好** 模式保存为灰度图的二维切片.
///
/// 强度切片 (全景图, 侧视切片, 水平切片) 按照自身的最小/最大值线性映射到 `[0, 255]`;
/// 标注切片中的各类标注被映射为肉眼较易区分的灰度.
pub trait ImgWriteVis {
    /// 按照可视化规则将图片保存到 `path` 路径. 格式由扩展名决定.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

const BLACK: u8 = 0;
const GRAY: u8 = 128;
const WHITE: u8 = 255;

/// 使标注更有利于单通道可视化. 未知值按未标注处理.
#[inline]
fn pretty(label: u8) -> u8 {
    match label {
        UNLABELED => BLACK,
        INSIDE => WHITE,
        CONTOUR => GRAY,
        _ => BLACK,
    }
}

/// 把强度切片线性拉伸到 `u8`. 常数切片 (及 NaN) 映射为 0.
fn stretch(img: ArrayView2<f32>) -> GrayImage {
    let (min, max) = img
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;
    let (height, width) = img.dim();
    let mut buf = GrayImage::new(width as u32, height as u32);
    for ((h, w), &v) in img.indexed_iter() {
        let gray = if range > 0.0 && v.is_finite() {
            ((v - min) / range * WHITE as f32).round() as u8
        } else {
            BLACK
        };
        buf.put_pixel(w as u32, h as u32, Luma([gray]));
    }
    buf
}

macro_rules! impl_scan_vis {
    ($($img: ty),+) => {
        $(
            /// 最小值映射为黑色, 最大值映射为白色.
            impl ImgWriteVis for $img {
                fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
                    stretch(self.view()).save(path)
                }
            }
        )+
    };
}

macro_rules! impl_label_vis {
    ($($img: ty),+) => {
        $(
            /// 未标注/轮廓/内部分别映射为黑色/灰色/白色.
            impl ImgWriteVis for $img {
                fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
                    let (height, width) = self.dim();
                    let mut buf = GrayImage::new(width as u32, height as u32);
                    for ((h, w), &pix) in self.indexed_iter() {
                        buf.put_pixel(w as u32, h as u32, Luma([pretty(pix)]));
                    }
                    buf.save(path)
                }
            }
        )+
    };
}

impl_scan_vis!(ArrayView2<'_, f32>, Array2<f32>);
impl_label_vis!(ArrayView2<'_, u8>, Array2<u8>);
