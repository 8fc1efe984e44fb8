#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供牙科 CBCT 扫描的牙弓曲线拟合, 侧视体积 (沿牙弓的垂直截面) 重采样,
//! 以及把侧视空间中的下颌管标注反投影回原始体积的功能.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 坐标约定: 体积按照 `[z, H, W]` 访问, 切片平面上的点为 `(x, y)`, 其中 `x` 对应 `W`.
//! 2. 长时间运行的操作接受一个 [`Progress`](progress::Progress) 回调,
//!   回调请求取消时操作返回 [`ArchError::Cancelled`], 不提交任何部分结果.
//!
//! # 开发计划
//!
//! ### 水平切片牙弓检测 ✅
//!
//! 闭运算, 二值化, 填洞, 最大连通域, 骨架化, 最后以多项式拟合骨架.
//!
//! 实现位于 `canal-berry/src/fitting` 和 `canal-berry/src/morph`.
//!
//! ### Catmull-Rom 样条与控制点编辑 ✅
//!
//! 实现位于 `canal-berry/src/spline`.
//!
//! ### 牙弓偏移曲线与侧视采样线 ✅
//!
//! 实现位于 `canal-berry/src/arch`.
//!
//! ### 直切 / 倾斜侧视体积 ✅
//!
//! 倾斜模式沿下颌管曲线旋转每个截面.
//! 体积及其几何保存在扫描目录中, 几何一致时可直接读取.
//!
//! 实现位于 `canal-berry/src/side_volume` 和 `canal-berry/src/plane.rs`.
//!
//! ### 标注反投影 ✅
//!
//! 实现位于 `canal-berry/src/backproject.rs`.
//!
//! ### 会话存档与种子体积 ✅
//!
//! 实现位于 `canal-berry/src/session`.
//!
//! ### 由已有标注反推牙弓与下颌管 ✅
//!
//! 实现位于 `canal-berry/src/session/gt.rs`.
//!
//! ### 多线程重采样 ⌛️
//!
//! 每个牙弓位置的截面相互独立, 可以并行计算.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引 `(z, h, w)`.
pub type Idx3d = (usize, usize, usize);

/// 平面上的浮点坐标 `(x, y)`.
pub type Point2d = (f64, f64);

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

pub mod arch;
pub mod backproject;
pub mod config;
pub mod consts;
pub mod error;
pub mod fitting;
pub mod morph;
pub mod plane;
pub mod progress;
pub mod session;
pub mod side_volume;
pub mod spline;
pub mod volume;

cfg_if::cfg_if! {
    if #[cfg(feature = "export")] {
        pub mod export;
        pub use export::ImgWriteVis;
    }
}

pub mod prelude;

pub use config::ArchConfig;
pub use error::{ArchError, ArchResult};
pub use session::ArchSession;
pub use side_volume::{SideVolume, SideVolumeKind};
pub use volume::{Jaw, VolumeSource};
