//! Zhang-Suen 细化.
//!
//! 细化结果为单像素宽且保持 8-连通, 便于之后按连通域提取骨架轮廓.

use ndarray::{Array2, ArrayView2};

use crate::Idx2d;

/// `P2..P9`, 从正上方开始顺时针.
const RING: [(isize, isize); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// 细化二值图像, 返回骨架.
pub fn thin(mask: ArrayView2<u8>) -> Array2<u8> {
    let mut img = mask.mapv(|v| u8::from(v != 0));
    let mut fg: Vec<Idx2d> = img
        .indexed_iter()
        .filter_map(|(pos, &v)| (v != 0).then_some(pos))
        .collect();

    loop {
        let mut changed = false;
        for step in 0..2 {
            let marked: Vec<Idx2d> = fg
                .iter()
                .copied()
                .filter(|&pos| img[pos] != 0 && removable(&img, pos, step))
                .collect();
            changed |= !marked.is_empty();
            for pos in marked {
                img[pos] = 0;
            }
        }
        fg.retain(|&pos| img[pos] != 0);
        if !changed {
            break;
        }
    }
    img
}

/// 环上第 `i` 个邻居是否为前景. 越界视为背景.
#[inline]
fn ring(img: &Array2<u8>, (h, w): Idx2d, i: usize) -> u8 {
    let (dh, dw) = RING[i];
    let (height, width) = img.dim();
    match (h.checked_add_signed(dh), w.checked_add_signed(dw)) {
        (Some(nh), Some(nw)) if nh < height && nw < width => img[(nh, nw)],
        _ => 0,
    }
}

fn removable(img: &Array2<u8>, pos: Idx2d, step: usize) -> bool {
    let p: [u8; 8] = std::array::from_fn(|i| ring(img, pos, i));
    let b: u8 = p.iter().sum();
    if !(2..=6).contains(&b) {
        return false;
    }
    let a = (0..8).filter(|&i| p[i] == 0 && p[(i + 1) % 8] == 1).count();
    if a != 1 {
        return false;
    }
    // p[0] = P2, p[2] = P4, p[4] = P6, p[6] = P8
    if step == 0 {
        p[0] * p[2] * p[4] == 0 && p[2] * p[4] * p[6] == 0
    } else {
        p[0] * p[2] * p[6] == 0 && p[0] * p[4] * p[6] == 0
    }
}
