//! 牙弓会话.
//!
//! 一次只处理一个扫描. [`ArchSession`] 由调用方显式构造并持有, 串联起
//! 牙弓检测, 样条编辑, 侧视采样线, 侧视体积重采样和标注反投影.
//! 所有修改都通过 `&mut self` 进行, 因此侧视体积的缓存检查不会与采样线的修改交错.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3};
use ndarray_npy::write_npy;

use crate::arch::{arch_lines, Arch, ArchLines, SideCoords};
use crate::backproject::{back_project_straight, back_project_tilted};
use crate::config::ArchConfig;
use crate::consts::files::{EXPORT_GT_VOLUME, EXPORT_VOLUME};
use crate::error::{ArchError, ArchResult};
use crate::progress::Progress;
use crate::side_volume::{SideVolume, SideVolumeKind};
use crate::spline::Spline;
use crate::volume::VolumeSource;
use crate::Point2d;

mod detections;
mod gt;
mod seed;
mod state;

pub use detections::ArchDetections;
pub use seed::{load_seed_volume, SeedSource};
pub use state::SessionState;

/// 控制点编辑的目标样条.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplineTarget {
    /// 牙弓样条 (水平切片坐标).
    Arch,

    /// 左下颌管样条 (全景图坐标).
    LeftCanal,

    /// 右下颌管样条 (全景图坐标).
    RightCanal,
}

/// 侧视体积所基于的采样线, 构造方式以及 (倾斜模式下) 下颌管样条.
#[derive(Debug, Clone, PartialEq)]
struct SideVolumeMemo {
    coords: SideCoords,
    kind: SideVolumeKind,
    canals: Option<[Spline; 2]>,
}

/// 单个扫描的牙弓会话.
pub struct ArchSession<S: VolumeSource> {
    scan: S,
    cfg: ArchConfig,
    dir: PathBuf,

    selected_slice: usize,
    detections: ArchDetections,
    lines: Option<ArchLines>,
    spline: Spline,
    arch: Arch,

    /// `(低侧, 高侧)` 全景图曲线.
    lh_arches: (Arch, Arch),

    side_coords: SideCoords,

    memo: Option<SideVolumeMemo>,
    side_volume: Option<SideVolume>,

    l_canal: Spline,
    r_canal: Spline,

    seed_source: Option<SeedSource>,
    seed: Array3<f32>,
}

impl<S: VolumeSource> ArchSession<S> {
    /// 打开会话. `dir` 为扫描所在目录, 存档和侧视体积都保存在其中.
    ///
    /// 会按照配置的优先级读取种子体积.
    pub fn new<P: AsRef<Path>>(scan: S, cfg: ArchConfig, dir: P) -> ArchResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        let (seed_source, seed) = load_seed_volume(&dir, &cfg.seed_priority, scan.shape())?;
        let detections = ArchDetections::new(scan.len_z(), cfg.detection.clone());
        Ok(Self {
            scan,
            cfg,
            dir,
            selected_slice: 0,
            detections,
            lines: None,
            spline: Spline::new_open(),
            arch: Arch::default(),
            lh_arches: (Arch::default(), Arch::default()),
            side_coords: Vec::new(),
            memo: None,
            side_volume: None,
            l_canal: Spline::new_open(),
            r_canal: Spline::new_open(),
            seed_source,
            seed,
        })
    }

    /// 选定切片后初始化会话状态, 然后计算采样线, 并视需要计算侧视体积.
    ///
    /// `state` 非空时从存档恢复样条; 否则使用 `slice` (或最近的可用切片) 的检测结果.
    pub fn compute_initial_state(
        &mut self,
        slice: usize,
        state: Option<SessionState>,
        want_side_volume: bool,
        tilted: bool,
        progress: &mut dyn Progress,
    ) -> ArchResult<()> {
        match state {
            Some(state) => {
                self.selected_slice = state.selected_slice;
                self.spline = state.spline;
                self.l_canal = state.l_canal_spline;
                self.r_canal = state.r_canal_spline;
            }
            None => {
                self.selected_slice = slice;
                let (_, curve) = self.detections.nearest(&self.scan, slice)?;
                let lines = arch_lines(&curve, self.cfg.lh_offset, self.cfg.slope_bound);
                self.spline = Spline::from_coords(&lines.coords, self.cfg.num_cp);
                self.l_canal = Spline::new_open();
                self.r_canal = Spline::new_open();
            }
        }

        self.rebuild_arch()?;
        if want_side_volume {
            self.compute_side_volume(None, tilted, progress)?;
        }
        Ok(())
    }

    /// 由牙弓样条重新生成牙弓曲线, 工作曲线, 全景图曲线和采样线.
    fn rebuild_arch(&mut self) -> ArchResult<()> {
        self.update_coords()?;
        let coords = self.base_coords().to_vec();
        self.arch = Arch::new(coords);
        self.lh_arches = (self.arch.get_offsetted(1.0), self.arch.get_offsetted(-1.0));
        self.compute_side_coords();
        Ok(())
    }

    /// 用样条的多项式近似更新当前切片的检测缓存和牙弓曲线.
    ///
    /// 样条无法拟合时返回 [`ArchError::DetectionAbsent`], 此时牙弓曲线保持不变.
    pub fn update_coords(&mut self) -> ArchResult<()> {
        let curve = self.spline.polynomial_approximation(self.cfg.spline_degree);
        self.detections.set(self.selected_slice, curve.clone());
        let curve = curve.ok_or(ArchError::DetectionAbsent {
            slice: self.selected_slice,
        })?;
        self.lines = Some(arch_lines(&curve, self.cfg.lh_offset, self.cfg.slope_bound));
        Ok(())
    }

    /// 在当前牙弓曲线上重新生成侧视采样线.
    pub fn compute_side_coords(&mut self) {
        self.side_coords = self
            .lines
            .as_ref()
            .map(|l| l.side_coords(Some(self.cfg.side_extent)))
            .unwrap_or_default();
    }

    /// 牙弓样条改变后, 更新牙弓曲线与采样线.
    fn refresh_arch(&mut self) {
        match self.update_coords() {
            Ok(()) => self.compute_side_coords(),
            Err(e) => debug!("arch kept unchanged: {e}"),
        }
    }

    fn spline_mut(&mut self, target: SplineTarget) -> &mut Spline {
        match target {
            SplineTarget::Arch => &mut self.spline,
            SplineTarget::LeftCanal => &mut self.l_canal,
            SplineTarget::RightCanal => &mut self.r_canal,
        }
    }

    /// 插入控制点, 返回其下标.
    pub fn add_control_point(&mut self, target: SplineTarget, x: f64, y: f64) -> usize {
        let idx = self.spline_mut(target).add_control_point(x, y);
        if target == SplineTarget::Arch {
            self.refresh_arch();
        }
        idx
    }

    /// 删除控制点. 控制点不足时什么也不做并返回 `false`.
    pub fn remove_control_point(&mut self, target: SplineTarget, index: usize) -> bool {
        let removed = self.spline_mut(target).remove_control_point(index);
        if removed && target == SplineTarget::Arch {
            self.refresh_arch();
        }
        removed
    }

    /// 移动控制点, 返回其新下标. 下标无效 (或样条为空) 时什么也不做并返回 `None`.
    pub fn update_control_point(
        &mut self,
        target: SplineTarget,
        index: usize,
        x: f64,
        y: f64,
    ) -> Option<usize> {
        let idx = self.spline_mut(target).update_control_point(index, x, y)?;
        if target == SplineTarget::Arch {
            self.refresh_arch();
        }
        Some(idx)
    }

    /// 牙弓曲线坐标. 尚未初始化时为空.
    #[inline]
    fn base_coords(&self) -> &[Point2d] {
        self.lines.as_ref().map(|l| l.coords.as_slice()).unwrap_or_default()
    }

    /// 从牙弓曲线出发, 把工作曲线平移 `arch_offset`, 并在其两侧 `±pano_offset`
    /// 处生成低侧/高侧全景图曲线. `pano_offset == 0` 时两者都与工作曲线相同.
    pub fn offset_arch(&mut self, arch_offset: f64, pano_offset: f64) {
        let coords = self.base_coords().to_vec();
        self.arch.set_arch(&coords);
        self.lh_arches = if pano_offset != 0.0 {
            (
                self.arch.get_offsetted(arch_offset + pano_offset),
                self.arch.get_offsetted(arch_offset - pano_offset),
            )
        } else {
            let moved = self.arch.get_offsetted(arch_offset);
            (moved.clone(), moved)
        };
        self.arch.offset(arch_offset);
    }

    /// 按当前采样线和样条生成缓存键. 直切体积与下颌管无关.
    fn memo_key(&self, kind: SideVolumeKind) -> SideVolumeMemo {
        SideVolumeMemo {
            coords: self.side_coords.clone(),
            kind,
            canals: kind
                .is_tilted()
                .then(|| [self.l_canal.clone(), self.r_canal.clone()]),
        }
    }

    /// 当前侧视体积是否对应当前采样线, 构造方式和下颌管?
    fn is_memo_hit(&self, kind: SideVolumeKind) -> bool {
        match (&self.memo, &self.side_volume) {
            (Some(memo), Some(sv)) => sv.is_correct() && *memo == self.memo_key(kind),
            _ => false,
        }
    }

    /// 计算侧视体积. `scale` 缺省时使用配置值.
    ///
    /// 采样线和构造方式 (倾斜模式下还有下颌管样条) 均未改变时直接复用现有体积并返回 `Ok(false)`.
    /// 倾斜模式会先尝试读取磁盘上的体积, 文件缺失或几何不一致时重新计算.
    /// 计算被取消时返回 [`ArchError::Cancelled`], 原有体积保持不变.
    pub fn compute_side_volume(
        &mut self,
        scale: Option<f64>,
        tilted: bool,
        progress: &mut dyn Progress,
    ) -> ArchResult<bool> {
        let kind = SideVolumeKind::from_tilted(tilted);
        if self.is_memo_hit(kind) {
            debug!("side volume is up to date");
            return Ok(false);
        }

        let scale = scale.unwrap_or(self.cfg.side_volume_scale);
        let canals = [&self.l_canal, &self.r_canal];
        let loaded = if kind.is_tilted() && SideVolume::has_saved(kind, &self.dir) {
            match SideVolume::load(kind, &self.dir, &self.side_coords, canals, scale) {
                Ok(sv) => Some(sv),
                Err(e) if e.is_recoverable() => {
                    warn!("cannot reuse saved side volume, recomputing: {e}");
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        let sv = match loaded {
            Some(sv) => sv,
            None => {
                let sv = SideVolume::build(
                    kind,
                    &self.scan,
                    &self.side_coords,
                    canals,
                    self.cfg.canal_degree,
                    scale,
                    progress,
                );
                sv.check()?;
                if let Some(lines) = self.lines.as_ref() {
                    if let Err(e) = sv.save(&self.dir, &self.side_coords, lines, canals) {
                        warn!("cannot save side volume: {e}");
                    }
                }
                sv
            }
        };

        self.side_volume = Some(sv);
        self.memo = Some(self.memo_key(kind));
        Ok(true)
    }

    /// 把侧视体积空间的标注反投影回扫描, 替换扫描的标注体积.
    ///
    /// `labels` 的形状必须与未缩放侧视体积相同. 取消时扫描的标注保持不变.
    pub fn back_project(
        &mut self,
        labels: ArrayView3<u8>,
        progress: &mut dyn Progress,
    ) -> ArchResult<()> {
        let sv = match (&self.memo, &self.side_volume) {
            (Some(memo), Some(sv)) if sv.is_correct() && memo.coords == self.side_coords => sv,
            _ => return Err(ArchError::GeometryMismatch("side volume")),
        };
        ArchError::check_shape(sv.original().shape(), labels.shape())?;
        let shape = self.scan.shape();
        let gt = match sv.kind() {
            SideVolumeKind::Straight => {
                back_project_straight(labels, &self.side_coords, shape, progress)?
            }
            SideVolumeKind::Tilted => back_project_tilted(labels, sv.planes(), shape, progress)?,
        };
        self.scan.set_gt_volume(gt)?;
        info!("annotations projected back into the scan");
        Ok(())
    }

    /// 保存会话存档.
    pub fn save_state(&self) -> ArchResult<()> {
        SessionState::new(
            self.spline.clone(),
            self.l_canal.clone(),
            self.r_canal.clone(),
            self.selected_slice,
        )
        .save(&self.dir)
    }

    /// 读取会话存档并重新初始化.
    pub fn load_state(
        &mut self,
        want_side_volume: bool,
        tilted: bool,
        progress: &mut dyn Progress,
    ) -> ArchResult<()> {
        let state = SessionState::load(&self.dir)?;
        let slice = state.selected_slice;
        self.compute_initial_state(slice, Some(state), want_side_volume, tilted, progress)
    }

    /// 导出扫描体积到 `volume.npy`. 文件已存在且 `forced == false` 时跳过并返回 `false`.
    pub fn export_volume(&self, forced: bool) -> ArchResult<bool> {
        let path = self.dir.join(EXPORT_VOLUME);
        if path.exists() && !forced {
            info!("skip existing {}", path.display());
            return Ok(false);
        }
        write_npy(&path, &self.scan.volume())?;
        Ok(true)
    }

    /// 导出标注体积到 `gt_volume.npy`. 文件已存在且 `forced == false` 时跳过并返回 `false`.
    pub fn export_gt_volume(&self, forced: bool) -> ArchResult<bool> {
        let path = self.dir.join(EXPORT_GT_VOLUME);
        if path.exists() && !forced {
            info!("skip existing {}", path.display());
            return Ok(false);
        }
        write_npy(&path, &self.scan.gt_volume())?;
        Ok(true)
    }

    /// 当前工作曲线的全景图.
    pub fn panorex(&self) -> Array2<f32> {
        self.scan.panorex(self.arch.coords())
    }

    /// `(低侧, 高侧)` 全景图.
    pub fn lh_panorexes(&self) -> (Array2<f32>, Array2<f32>) {
        let (low, high) = &self.lh_arches;
        (self.scan.panorex(low.coords()), self.scan.panorex(high.coords()))
    }

    /// 侧视体积在位置 `pos` 处的 (缩放) 切片.
    pub fn side_volume_slice(&self, pos: usize) -> Option<ArrayView2<f32>> {
        self.side_volume
            .as_ref()
            .filter(|sv| sv.is_correct())
            .and_then(|sv| sv.get_slice(pos))
    }

    /// 扫描的第 `z` 张水平切片.
    #[inline]
    pub fn slice(&self, z: usize) -> Option<ArrayView2<f32>> {
        self.scan.slice_at(z)
    }

    /// 当前水平切片.
    #[inline]
    pub fn selected_slice(&self) -> usize {
        self.selected_slice
    }

    /// 扫描.
    #[inline]
    pub fn scan(&self) -> &S {
        &self.scan
    }

    /// 取回扫描.
    #[inline]
    pub fn into_scan(self) -> S {
        self.scan
    }

    /// 配置.
    #[inline]
    pub fn config(&self) -> &ArchConfig {
        &self.cfg
    }

    /// 会话目录.
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 牙弓曲线及其偏移.
    #[inline]
    pub fn arch_lines(&self) -> Option<&ArchLines> {
        self.lines.as_ref()
    }

    /// 侧视采样线.
    #[inline]
    pub fn side_coords(&self) -> &SideCoords {
        &self.side_coords
    }

    /// 侧视体积.
    #[inline]
    pub fn side_volume(&self) -> Option<&SideVolume> {
        self.side_volume.as_ref()
    }

    /// 样条.
    pub fn spline(&self, target: SplineTarget) -> &Spline {
        match target {
            SplineTarget::Arch => &self.spline,
            SplineTarget::LeftCanal => &self.l_canal,
            SplineTarget::RightCanal => &self.r_canal,
        }
    }

    /// 工作曲线.
    #[inline]
    pub fn arch(&self) -> &Arch {
        &self.arch
    }

    /// `(低侧, 高侧)` 全景图曲线.
    #[inline]
    pub fn lh_arches(&self) -> (&Arch, &Arch) {
        (&self.lh_arches.0, &self.lh_arches.1)
    }

    /// 检测缓存.
    #[inline]
    pub fn detections(&mut self) -> &mut ArchDetections {
        &mut self.detections
    }

    /// 种子体积及其来源. 没有种子文件时为全零体积.
    #[inline]
    pub fn seed_volume(&self) -> (Option<SeedSource>, &Array3<f32>) {
        (self.seed_source, &self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::label::{is_labeled, INSIDE};
    use crate::progress::Silent;
    use crate::spline::SplineRecord;
    use crate::volume::Jaw;
    use std::fs;
    use std::ops::ControlFlow;

    pub(super) struct TempDir(pub(super) PathBuf);

    impl TempDir {
        pub(super) fn new(name: &str) -> Self {
            let dir = std::env::temp_dir()
                .join(format!("canal-berry-session-{name}-{}", std::process::id()));
            let _ = fs::remove_dir_all(&dir);
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    pub(super) fn config() -> ArchConfig {
        ArchConfig {
            lh_offset: 5.0,
            side_extent: 10,
            spline_degree: 4,
            side_volume_scale: 1.0,
            ..ArchConfig::default()
        }
    }

    fn state() -> SessionState {
        let spline = Spline::from(SplineRecord {
            control_points: vec![
                (10.0, 30.0),
                (20.0, 25.0),
                (30.0, 24.0),
                (40.0, 25.0),
                (50.0, 30.0),
            ],
            closed: false,
        });
        SessionState::new(spline, Spline::new_open(), Spline::new_open(), 3)
    }

    fn session(dir: &Path) -> ArchSession<Jaw> {
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Debug)
            .init();
        let vol = Array3::from_shape_fn((8, 60, 60), |(z, y, x)| ((z * 7 + y * 3 + x) % 50) as f32);
        let mut s = ArchSession::new(Jaw::from_volume(vol), config(), dir).unwrap();
        s.compute_initial_state(0, Some(state()), false, false, &mut Silent).unwrap();
        s
    }

    #[test]
    fn test_initial_state() {
        let tmp = TempDir::new("init");
        let s = session(&tmp.0);
        assert_eq!(s.selected_slice(), 3);
        let lines = s.arch_lines().unwrap();
        assert!(!lines.is_empty());
        assert_eq!(s.side_coords().len(), lines.len());
        assert!(s.side_coords().iter().all(|l| l.len() == 10));
        assert!(s.side_volume().is_none());
        assert_eq!(s.seed_volume().0, None);
        assert_eq!(s.seed_volume().1.dim(), (8, 60, 60));
    }

    /// 第二次调用不做任何计算.
    #[test]
    fn test_side_volume_memo() {
        let tmp = TempDir::new("memo");
        let mut s = session(&tmp.0);
        assert!(s.compute_side_volume(None, false, &mut Silent).unwrap());
        let first = s.side_volume().unwrap().data().clone();

        let mut calls = 0;
        let mut count = |_: usize, _: usize| -> ControlFlow<()> {
            calls += 1;
            ControlFlow::Continue(())
        };
        assert!(!s.compute_side_volume(None, false, &mut count).unwrap());
        assert_eq!(calls, 0);
        assert_eq!(s.side_volume().unwrap().data(), &first);
        assert!(SideVolume::has_saved(SideVolumeKind::Straight, &tmp.0));

        // 修改样条后采样线改变, 需要重新计算.
        s.update_control_point(SplineTarget::Arch, 2, 30.0, 22.0);
        assert!(s.compute_side_volume(None, false, &mut Silent).unwrap());
    }

    /// 在左侧下颌管的计算中途取消, 原有侧视体积不变.
    #[test]
    fn test_cancel_tilted_keeps_previous() {
        let tmp = TempDir::new("cancel");
        let mut s = session(&tmp.0);
        s.compute_side_volume(None, false, &mut Silent).unwrap();
        let before = s.side_volume().unwrap().clone();

        for (x, y) in [(5.0, 3.0), (10.0, 3.5), (15.0, 4.0), (20.0, 4.0)] {
            s.add_control_point(SplineTarget::LeftCanal, x, y);
        }
        assert_eq!(s.spline(SplineTarget::LeftCanal).control_points().len(), 4);

        let mut cancel = |cur: usize, _: usize| -> ControlFlow<()> {
            if cur >= 8 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        assert!(matches!(
            s.compute_side_volume(None, true, &mut cancel),
            Err(ArchError::Cancelled)
        ));
        let after = s.side_volume().unwrap();
        assert_eq!(after.kind(), SideVolumeKind::Straight);
        assert!(after.is_correct());
        assert_eq!(after.original(), before.original());
        assert_eq!(after.data(), before.data());
        assert_eq!(after.gt(), before.gt());
        assert!(!s.compute_side_volume(None, false, &mut Silent).unwrap());

        assert!(s.compute_side_volume(None, true, &mut Silent).unwrap());
        assert_eq!(s.side_volume().unwrap().kind(), SideVolumeKind::Tilted);
        assert!(s.side_volume().unwrap().planes()[10].is_some());

        // 几何一致时直接从磁盘读取, 不再调用进度回调.
        let tilted = s.side_volume().unwrap().original().clone();
        s.save_state().unwrap();
        let mut t = ArchSession::new(s.into_scan(), config(), &tmp.0).unwrap();
        let mut refuse = |_: usize, _: usize| -> ControlFlow<()> { ControlFlow::Break(()) };
        t.load_state(true, true, &mut refuse).unwrap();
        let loaded = t.side_volume().unwrap();
        assert_eq!(loaded.kind(), SideVolumeKind::Tilted);
        assert_eq!(loaded.original(), &tilted);
    }

    /// 空样条或越界下标的移动什么也不做, 牙弓保持不变.
    #[test]
    fn test_update_invalid_control_point() {
        let tmp = TempDir::new("update-invalid");
        let mut s = session(&tmp.0);
        assert_eq!(s.update_control_point(SplineTarget::LeftCanal, 0, 5.0, 3.0), None);
        assert_eq!(s.update_control_point(SplineTarget::RightCanal, 2, 5.0, 3.0), None);
        assert!(s.spline(SplineTarget::LeftCanal).control_points().is_empty());

        let coords = s.side_coords().clone();
        assert_eq!(s.update_control_point(SplineTarget::Arch, 5, 60.0, 30.0), None);
        assert_eq!(s.side_coords(), &coords);
        assert_eq!(s.update_control_point(SplineTarget::Arch, 4, 52.0, 31.0), Some(4));
        assert_ne!(s.side_coords(), &coords);
    }

    /// 倾斜体积依赖下颌管样条: 编辑下颌管后需要重新计算, 直切体积则不受影响.
    #[test]
    fn test_canal_edit_invalidates_tilted() {
        let tmp = TempDir::new("memo-canal");
        let mut s = session(&tmp.0);
        for (x, y) in [(5.0, 3.0), (10.0, 3.5), (15.0, 4.0), (20.0, 4.0)] {
            s.add_control_point(SplineTarget::LeftCanal, x, y);
        }
        assert!(s.compute_side_volume(None, true, &mut Silent).unwrap());
        assert!(!s.compute_side_volume(None, true, &mut Silent).unwrap());

        assert_eq!(s.update_control_point(SplineTarget::LeftCanal, 1, 10.0, 5.0), Some(1));
        assert!(s.compute_side_volume(None, true, &mut Silent).unwrap());
        assert!(!s.compute_side_volume(None, true, &mut Silent).unwrap());

        assert!(s.compute_side_volume(None, false, &mut Silent).unwrap());
        s.add_control_point(SplineTarget::RightCanal, 40.0, 4.0);
        assert!(!s.compute_side_volume(None, false, &mut Silent).unwrap());
    }

    #[test]
    fn test_back_project() {
        let tmp = TempDir::new("backproject");
        let mut s = session(&tmp.0);
        let labels = Array3::<u8>::zeros((1, 1, 1));
        assert!(matches!(
            s.back_project(labels.view(), &mut Silent),
            Err(ArchError::GeometryMismatch(_))
        ));

        s.compute_side_volume(None, false, &mut Silent).unwrap();
        let mut labels = Array3::<u8>::zeros(s.side_volume().unwrap().original().raw_dim());
        labels[(4, 2, 3)] = INSIDE;
        s.back_project(labels.view(), &mut Silent).unwrap();
        let (x, y) = s.side_coords()[4][3];
        let gt = s.scan().gt_volume();
        assert_eq!(gt[(2, y.floor() as usize, x.floor() as usize)], INSIDE);
        assert_eq!(gt[(2, y.ceil() as usize, x.ceil() as usize)], INSIDE);
        assert!(gt.iter().filter(|&&v| is_labeled(v)).count() <= 4);
    }

    #[test]
    fn test_offset_arch() {
        let tmp = TempDir::new("offset");
        let mut s = session(&tmp.0);
        let base = s.arch().coords().to_vec();
        s.offset_arch(2.0, 1.0);
        let (low, high) = s.lh_arches();
        assert_eq!(low.coords().len(), base.len());
        assert!(low.coords()[5].1 > s.arch().coords()[5].1);
        assert!(high.coords()[5].1 < s.arch().coords()[5].1);
        assert!(s.arch().coords()[5].1 > base[5].1);

        s.offset_arch(0.0, 0.0);
        assert_eq!(s.arch().coords(), base.as_slice());
        let (low, high) = s.lh_panorexes();
        assert_eq!(low, high);
        assert_eq!(s.panorex().dim(), (8, base.len()));
    }

    #[test]
    fn test_state_and_export() {
        let tmp = TempDir::new("state");
        let mut s = session(&tmp.0);
        s.add_control_point(SplineTarget::RightCanal, 3.0, 2.0);
        s.save_state().unwrap();
        let spline = s.spline(SplineTarget::Arch).clone();

        let vol = s.into_scan();
        let mut t = ArchSession::new(vol, config(), &tmp.0).unwrap();
        t.load_state(false, false, &mut Silent).unwrap();
        assert_eq!(t.spline(SplineTarget::Arch), &spline);
        assert_eq!(t.spline(SplineTarget::RightCanal).control_points(), &[(3.0, 2.0)]);
        assert_eq!(t.selected_slice(), 3);

        assert!(t.export_volume(false).unwrap());
        assert!(!t.export_volume(false).unwrap());
        assert!(t.export_volume(true).unwrap());
        assert!(t.export_gt_volume(false).unwrap());
        assert!(tmp.0.join(EXPORT_GT_VOLUME).is_file());
    }
}
