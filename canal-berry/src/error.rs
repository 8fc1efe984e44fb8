//! 运行时错误.

use std::fmt;
use std::path::PathBuf;

use ndarray_npy::{ReadNpyError, WriteNpyError};

/// 流水线的运行时错误.
#[derive(Debug)]
pub enum ArchError {
    /// 该切片 (及其邻近切片) 不存在牙弓拟合结果.
    DetectionAbsent {
        /// 请求的切片.
        slice: usize,
    },

    /// 磁盘上的几何数据与当前几何数据不一致.
    GeometryMismatch(&'static str),

    /// 缺少磁盘上的必要文件.
    MissingArtifact(PathBuf),

    /// 用户取消了长时间运行的操作.
    Cancelled,

    /// 数组形状不被支持.
    InvalidShape {
        /// 期望形状.
        expected: Vec<usize>,

        /// 实际形状.
        found: Vec<usize>,
    },

    /// 底层 I/O 错误.
    Io(std::io::Error),

    /// 读取 npy 文件错误.
    ReadNpy(ReadNpyError),

    /// 写入 npy 文件错误.
    WriteNpy(WriteNpyError),

    /// JSON 编解码错误.
    Json(serde_json::Error),

    /// 读取 nifti 文件错误.
    Nifti(nifti::NiftiError),
}

/// 流水线运行结果.
pub type ArchResult<T> = Result<T, ArchError>;

impl fmt::Display for ArchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DetectionAbsent { slice } => write!(f, "no arch detected near slice {slice}"),
            Self::GeometryMismatch(what) => write!(f, "{what} do not match the current geometry"),
            Self::MissingArtifact(p) => write!(f, "missing artifact `{}`", p.display()),
            Self::Cancelled => f.write_str("operation cancelled"),
            Self::InvalidShape { expected, found } => {
                write!(f, "invalid shape: expected {expected:?}, found {found:?}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::ReadNpy(e) => write!(f, "cannot read npy: {e}"),
            Self::WriteNpy(e) => write!(f, "cannot write npy: {e}"),
            Self::Json(e) => write!(f, "bad json: {e}"),
            Self::Nifti(e) => write!(f, "cannot read nifti: {e}"),
        }
    }
}

impl std::error::Error for ArchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::ReadNpy(e) => Some(e),
            Self::WriteNpy(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Nifti(e) => Some(e),
            _ => None,
        }
    }
}

macro_rules! impl_from_error {
    ($($src: ty => $variant: ident),+ $(,)?) => {
        $(
            impl From<$src> for ArchError {
                #[inline]
                fn from(e: $src) -> Self {
                    Self::$variant(e)
                }
            }
        )+
    };
}

impl_from_error!(
    std::io::Error => Io,
    ReadNpyError => ReadNpy,
    WriteNpyError => WriteNpy,
    serde_json::Error => Json,
    nifti::NiftiError => Nifti,
);

impl ArchError {
    /// 该错误是否应当通过重新计算来恢复 (而不是交给调用方)?
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DetectionAbsent { .. } | Self::GeometryMismatch(_) | Self::MissingArtifact(_)
        )
    }

    /// 形状检查.
    pub(crate) fn check_shape(expected: &[usize], found: &[usize]) -> ArchResult<()> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::InvalidShape {
                expected: expected.to_vec(),
                found: found.to_vec(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ArchError;
    use std::path::PathBuf;

    #[test]
    fn test_recoverable() {
        assert!(ArchError::DetectionAbsent { slice: 3 }.is_recoverable());
        assert!(ArchError::MissingArtifact(PathBuf::from("planes.npy")).is_recoverable());
        assert!(ArchError::GeometryMismatch("side coords").is_recoverable());
        assert!(!ArchError::Cancelled.is_recoverable());
        assert!(!ArchError::InvalidShape {
            expected: vec![1],
            found: vec![2]
        }
        .is_recoverable());
    }

    /// 错误信息需要指出缺失的文件.
    #[test]
    fn test_display_names_artifact() {
        let msg = ArchError::MissingArtifact(PathBuf::from("side_volume/planes.npy")).to_string();
        assert!(msg.contains("planes.npy"));
    }

    #[test]
    fn test_check_shape() {
        assert!(ArchError::check_shape(&[2, 3, 4], &[2, 3, 4]).is_ok());
        assert!(matches!(
            ArchError::check_shape(&[2, 3, 4], &[2, 3]),
            Err(ArchError::InvalidShape { .. })
        ));
    }
}
