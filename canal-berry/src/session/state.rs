//! 会话存档 `dump.json`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::consts::files::{DUMP, DUMP_VERSION};
use crate::error::{ArchError, ArchResult};
use crate::spline::Spline;

/// 会话存档: 牙弓样条, 两条下颌管样条和当前切片.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// 存档格式版本.
    pub version: f64,

    /// 牙弓样条.
    pub spline: Spline,

    /// 左下颌管样条.
    #[serde(rename = "L_canal_spline")]
    pub l_canal_spline: Spline,

    /// 右下颌管样条.
    #[serde(rename = "R_canal_spline")]
    pub r_canal_spline: Spline,

    /// 当前水平切片.
    pub selected_slice: usize,
}

impl SessionState {
    /// 以当前格式版本构造.
    pub fn new(spline: Spline, l_canal: Spline, r_canal: Spline, selected_slice: usize) -> Self {
        Self {
            version: DUMP_VERSION,
            spline,
            l_canal_spline: l_canal,
            r_canal_spline: r_canal,
            selected_slice,
        }
    }

    /// `dir` 中是否存在存档?
    #[inline]
    pub fn exists(dir: &Path) -> bool {
        dir.join(DUMP).is_file()
    }

    /// 写入 `dir/dump.json`.
    pub fn save(&self, dir: &Path) -> ArchResult<()> {
        let path = dir.join(DUMP);
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(writer, self)?;
        info!("session saved to {}", path.display());
        Ok(())
    }

    /// 读取 `dir/dump.json`.
    pub fn load(dir: &Path) -> ArchResult<Self> {
        let path = dir.join(DUMP);
        if !path.is_file() {
            return Err(ArchError::MissingArtifact(path));
        }
        let reader = BufReader::new(File::open(&path)?);
        let state: Self = serde_json::from_reader(reader)?;
        if state.version != DUMP_VERSION {
            warn!(
                "{} has version {}, expected {DUMP_VERSION}",
                path.display(),
                state.version
            );
        }
        Ok(state)
    }
}
