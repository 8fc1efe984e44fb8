//! 通用常量.

/// 标注体素值.
pub mod label {
    /// 未标注体素.
    pub const UNLABELED: u8 = 0;

    /// 下颌管轮廓体素.
    pub const CONTOUR: u8 = 1;

    /// 下颌管内部体素.
    pub const INSIDE: u8 = 2;

    /// 体素是否是轮廓?
    #[inline]
    pub const fn is_contour(p: u8) -> bool {
        matches!(p, CONTOUR)
    }

    /// 体素是否是内部?
    #[inline]
    pub const fn is_inside(p: u8) -> bool {
        matches!(p, INSIDE)
    }

    /// 体素是否带有有效标注 (轮廓或内部)?
    #[inline]
    pub const fn is_labeled(p: u8) -> bool {
        matches!(p, CONTOUR | INSIDE)
    }

}

/// 磁盘上的文件名与目录名.
pub mod files {
    /// 顶层会话存档.
    pub const DUMP: &str = "dump.json";

    /// 会话存档格式版本.
    pub const DUMP_VERSION: f64 = 1.0;

    /// 直切侧视体积目录.
    pub const STRAIGHT_DIR: &str = "d_side_volume";

    /// 倾斜侧视体积目录.
    pub const TILTED_DIR: &str = "side_volume";

    /// 侧视体积 (未缩放).
    pub const SIDE_VOLUME: &str = "side_volume.npy";

    /// 侧视真值体积 (未缩放).
    pub const GT_SIDE_VOLUME: &str = "gt_side_volume.npy";

    /// 侧视采样线.
    pub const SIDE_COORDS: &str = "side_coords.npy";

    /// 牙弓曲线及其两侧偏移.
    pub const COORDS: &str = "coords.npy";

    /// 倾斜平面张量.
    pub const PLANES: &str = "planes.npy";

    /// 两条下颌管样条.
    pub const CANALS: &str = "canals.json";

    /// 真值导出的 alpha 种子体积.
    pub const GT_ALPHA: &str = "gt_alpha.npy";

    /// 网络生成的种子体积.
    pub const GENERATED: &str = "generated.npy";

    /// 导出的扫描体积.
    pub const EXPORT_VOLUME: &str = "volume.npy";

    /// 导出的真值体积.
    pub const EXPORT_GT_VOLUME: &str = "gt_volume.npy";

    /// 导出的稀疏真值体积 (仅轮廓).
    pub const EXPORT_GT_SPARSE: &str = "gt_sparse.npy";
}

/// 数值中心差分的步长.
pub const DERIVATIVE_DELTA: f64 = 0.3;

/// 沿曲线采样时的弧长步长.
pub const ARC_STEP: f64 = 1.0;
