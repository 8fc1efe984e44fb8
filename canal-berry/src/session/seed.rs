//! 标注种子体积.
//!
//! 扫描目录中可能同时存在真值导出的 alpha 体积和网络生成的体积.
//! 两者的优先级由配置中的有序列表显式给出, 而不是由文件是否存在隐式决定.

use std::path::{Path, PathBuf};

use log::info;
use ndarray::Array3;
use ndarray_npy::read_npy;
use serde::{Deserialize, Serialize};

use crate::consts::files::{GENERATED, GT_ALPHA};
use crate::error::{ArchError, ArchResult};
use crate::Idx3d;

/// 种子体积来源.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedSource {
    /// `gt_alpha.npy`.
    GtAlpha,

    /// `generated.npy`.
    Generated,
}

impl SeedSource {
    /// 文件名.
    #[inline]
    pub const fn filename(self) -> &'static str {
        match self {
            Self::GtAlpha => GT_ALPHA,
            Self::Generated => GENERATED,
        }
    }

    /// 在 `dir` 中的路径.
    #[inline]
    pub fn path_in(self, dir: &Path) -> PathBuf {
        dir.join(self.filename())
    }
}

/// 按 `priority` 的顺序读取第一个存在的种子体积, 都不存在时返回形状为 `shape` 的全零体积.
///
/// 返回值的第一项为实际使用的来源. 文件形状与 `shape` 不符时返回 [`ArchError::InvalidShape`].
pub fn load_seed_volume(
    dir: &Path,
    priority: &[SeedSource],
    shape: Idx3d,
) -> ArchResult<(Option<SeedSource>, Array3<f32>)> {
    let Some(source) = priority.iter().copied().find(|s| s.path_in(dir).is_file()) else {
        return Ok((None, Array3::zeros(shape)));
    };
    let path = source.path_in(dir);
    let seed: Array3<f32> = read_npy(&path)?;
    let (z, h, w) = shape;
    ArchError::check_shape(&[z, h, w], seed.shape())?;
    info!("seed volume loaded from {}", path.display());
    Ok((Some(source), seed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray_npy::write_npy;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("canal-berry-seed-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_priority_order() {
        let dir = temp_dir("priority");
        let default = [SeedSource::GtAlpha, SeedSource::Generated];

        let (src, seed) = load_seed_volume(&dir, &default, (2, 2, 2)).unwrap();
        assert_eq!(src, None);
        assert!(seed.iter().all(|&v| v == 0.0));

        write_npy(dir.join(GENERATED), &Array3::<f32>::from_elem((2, 2, 2), 0.5)).unwrap();
        let (src, _) = load_seed_volume(&dir, &default, (2, 2, 2)).unwrap();
        assert_eq!(src, Some(SeedSource::Generated));

        write_npy(dir.join(GT_ALPHA), &Array3::<f32>::ones((2, 2, 2))).unwrap();
        let (src, seed) = load_seed_volume(&dir, &default, (2, 2, 2)).unwrap();
        assert_eq!(src, Some(SeedSource::GtAlpha));
        assert_eq!(seed[(1, 1, 1)], 1.0);

        let reversed = [SeedSource::Generated, SeedSource::GtAlpha];
        let (src, seed) = load_seed_volume(&dir, &reversed, (2, 2, 2)).unwrap();
        assert_eq!(src, Some(SeedSource::Generated));
        assert_eq!(seed[(0, 0, 0)], 0.5);

        assert!(matches!(
            load_seed_volume(&dir, &default, (2, 2, 3)),
            Err(ArchError::InvalidShape { .. })
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
}
