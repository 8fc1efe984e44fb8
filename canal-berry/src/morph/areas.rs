//! 连通区域.

use std::collections::VecDeque;

use ndarray::{Array2, ArrayView2};

use crate::{Area2d, Areas2d, Idx2d};

/// 获得 `(h, w)` 的 8-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour8((h, w): Idx2d) -> [Idx2d; 8] {
    [
        (h.wrapping_sub(1), w.wrapping_sub(1)),
        (h.wrapping_sub(1), w),
        (h.wrapping_sub(1), w.saturating_add(1)),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
        (h.saturating_add(1), w.wrapping_sub(1)),
        (h.saturating_add(1), w),
        (h.saturating_add(1), w.saturating_add(1)),
    ]
}

/// 按照 8-相邻规则获取所有前景区域. 两个像素 `p1` 和 `p2` 属于同一个区域,
/// 当且仅当存在一条从 `p1` 到 `p2` 的 8-相邻前景路径.
///
/// 区域按照首个像素的行主序排列, 内部实现保证每次运行产生同样的结果.
pub fn areas8(mask: ArrayView2<u8>) -> Areas2d {
    let (height, width) = mask.dim();
    let mut ans = Areas2d::new();
    let mut vis = Array2::<bool>::from_elem(mask.dim(), false);
    let mut bfs_q = VecDeque::with_capacity(16);

    for (pos, &pix) in mask.indexed_iter() {
        if pix == 0 || vis[pos] {
            continue;
        }
        vis[pos] = true;
        bfs_q.push_back(pos);
        let mut this_area = Area2d::with_capacity(1);
        while let Some(cur) = bfs_q.pop_front() {
            this_area.push(cur);
            for neigh in neighbour8(cur) {
                if neigh.0 < height && neigh.1 < width && mask[neigh] != 0 && !vis[neigh] {
                    vis[neigh] = true;
                    bfs_q.push_back(neigh);
                }
            }
        }
        ans.push(this_area);
    }
    ans
}

/// 丢弃面积小于 `min_area` 的 8-连通区域, 返回剩余前景.
pub fn drop_small_areas(mask: ArrayView2<u8>, min_area: usize) -> Array2<u8> {
    let mut out = Array2::zeros(mask.dim());
    for area in areas8(mask).into_iter().filter(|a| a.len() >= min_area) {
        for pos in area {
            out[pos] = 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{s, Array2};

    #[test]
    fn test_areas8_diagonal_is_connected() {
        let mut mask = Array2::<u8>::zeros((5, 5));
        mask[(0, 0)] = 1;
        mask[(1, 1)] = 1;
        mask[(2, 2)] = 1;
        mask[(4, 0)] = 1;
        let areas = areas8(mask.view());
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].len(), 3);
        assert_eq!(areas[1], vec![(4, 0)]);
    }

    #[test]
    fn test_drop_small_areas() {
        let mut mask = Array2::<u8>::zeros((10, 10));
        mask.slice_mut(s![0..3, 0..3]).fill(1);
        mask.slice_mut(s![6..10, 6..10]).fill(1);
        let kept = drop_small_areas(mask.view(), 10);
        assert_eq!(kept.sum(), 16);
        assert_eq!(kept[(0, 0)], 0);
        assert_eq!(kept[(9, 9)], 1);
    }
}
