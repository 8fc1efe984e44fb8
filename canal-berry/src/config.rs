//! 流水线参数.
//!
//! 所有字段都有默认值, JSON 文件中缺省的字段会回落到默认值.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ArchResult;
use crate::session::SeedSource;

/// 配置文件路径的环境变量.
pub const CONFIG_ENV: &str = "CANAL_BERRY_CONFIG";

/// 牙弓检测 (形态学 + 拟合) 参数.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// 第一次闭运算的椭圆核直径.
    pub close_kernel: usize,

    /// 二值化阈值. 严格大于该值的像素为前景.
    pub binary_threshold: f32,

    /// 填洞闭运算的椭圆核直径.
    pub fill_kernel: usize,

    /// 连通域最小面积 (像素). 小于该值的连通域被丢弃.
    pub min_area: usize,

    /// 骨架轮廓最少像素数. 不超过该值的轮廓被丢弃.
    pub min_contour: usize,

    /// 多项式次数.
    pub degree: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            close_kernel: 5,
            binary_threshold: 0.5,
            fill_kernel: 25,
            min_area: 10000,
            min_contour: 40,
            degree: 12,
        }
    }
}

/// 会话参数.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchConfig {
    /// 牙弓两侧偏移曲线的距离.
    pub lh_offset: f64,

    /// 每条侧视采样线的点数.
    pub side_extent: usize,

    /// 牙弓样条的多项式近似次数.
    pub spline_degree: usize,

    /// 下颌管样条的多项式近似次数.
    pub canal_degree: usize,

    /// 从稠密曲线构造样条时的控制点个数.
    pub num_cp: usize,

    /// 侧视体积的显示缩放倍率.
    pub side_volume_scale: f64,

    /// 垂直切线时替代无穷斜率的上界.
    pub slope_bound: f64,

    /// 种子体积文件优先级, 靠前者优先.
    pub seed_priority: Vec<SeedSource>,

    /// 牙弓检测参数.
    pub detection: DetectionConfig,
}

impl Default for ArchConfig {
    fn default() -> Self {
        Self {
            lh_offset: 50.0,
            side_extent: 100,
            spline_degree: 12,
            canal_degree: 2,
            num_cp: 10,
            side_volume_scale: 4.0,
            slope_bound: 1e6,
            seed_priority: vec![SeedSource::GtAlpha, SeedSource::Generated],
            detection: DetectionConfig::default(),
        }
    }
}

impl ArchConfig {
    /// 从 JSON 文件读取配置.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ArchResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&text)?)
    }

    /// 获取配置.
    ///
    /// 1. 若环境变量 `$CANAL_BERRY_CONFIG` 非空, 则读取该文件;
    /// 2. 否则若 `<config_dir>/canal-berry/config.json` 存在, 则读取该文件;
    /// 3. 否则使用默认配置.
    pub fn from_env_or_home() -> ArchResult<Self> {
        if let Ok(p) = env::var(CONFIG_ENV) {
            return Self::from_json_file(p);
        }
        match home_config_path() {
            Some(p) if p.is_file() => Self::from_json_file(p),
            _ => Ok(Self::default()),
        }
    }
}

/// `<config_dir>/canal-berry/config.json`.
fn home_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("canal-berry").join("config.json"))
}
