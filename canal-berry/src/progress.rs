//! 可取消的进度回调.
//!
//! 长时间运行的操作在每完成一个单位 (一个牙弓位置或一张切片) 后调用
//! `step(current, total)`. 回调返回 `ControlFlow::Break(())` 即请求取消,
//! 操作会在提交任何输出之前停止, 并返回 [`ArchError::Cancelled`].

use std::ops::ControlFlow;

use crate::error::{ArchError, ArchResult};

/// 进度回调.
pub trait Progress {
    /// 报告进度. 返回 `Break` 请求取消.
    fn step(&mut self, current: usize, total: usize) -> ControlFlow<()>;
}

impl<F> Progress for F
where
    F: FnMut(usize, usize) -> ControlFlow<()>,
{
    #[inline]
    fn step(&mut self, current: usize, total: usize) -> ControlFlow<()> {
        self(current, total)
    }
}

/// 忽略进度, 从不取消.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Progress for Silent {
    #[inline]
    fn step(&mut self, _: usize, _: usize) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// 报告进度, 并把取消请求转换为错误.
#[inline]
pub(crate) fn tick(progress: &mut dyn Progress, current: usize, total: usize) -> ArchResult<()> {
    match progress.step(current, total) {
        ControlFlow::Continue(()) => Ok(()),
        ControlFlow::Break(()) => Err(ArchError::Cancelled),
    }
}
