//! 🦷欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d, Point2d};

pub use crate::arch::{arch_lines, Arch, ArchLines, SideCoords};
pub use crate::backproject::{back_project_straight, back_project_tilted};
pub use crate::config::{ArchConfig, DetectionConfig};
pub use crate::consts::label::{CONTOUR, INSIDE, UNLABELED};
pub use crate::error::{ArchError, ArchResult};
pub use crate::fitting::{arch_detection, PolyCurve, Polynomial};
pub use crate::plane::Plane;
pub use crate::progress::{Progress, Silent};
pub use crate::session::{ArchSession, SeedSource, SessionState, SplineTarget};
pub use crate::side_volume::{SideVolume, SideVolumeKind};
pub use crate::spline::Spline;
pub use crate::volume::{Jaw, VolumeSource};

#[cfg(feature = "export")]
pub use crate::export::ImgWriteVis;
