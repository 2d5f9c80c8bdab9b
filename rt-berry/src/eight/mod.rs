//! 邻域相关的操作: 邻居索引与 Moore 边缘追踪.

mod core;

use crate::Idx2d;

/// 以 `(dh, dw)` 表示的 8 个方向, 在图像坐标系 (h 向下) 中按顺时针排列,
/// 从正西开始. 偶数下标恰好是 4 个正方向.
const CLOCKWISE: [(isize, isize); 8] = [
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
];

/// `(h, w)` 沿 `CLOCKWISE[dir]` 走一步. 越过 0 时回绕到 `usize::MAX` 附近,
/// 因此任何越界检查都会拒绝它.
#[inline]
fn offset((h, w): Idx2d, dir: usize) -> Idx2d {
    let (dh, dw) = CLOCKWISE[dir];
    (h.wrapping_add_signed(dh), w.wrapping_add_signed(dw))
}

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4(pos: Idx2d) -> [Idx2d; 4] {
    [0, 2, 4, 6].map(|d| offset(pos, d))
}

/// 获得 `(h, w)` 的 8-邻居索引, 顺时针排列. 不检查越界.
#[inline]
pub(crate) fn neighbour8(pos: Idx2d) -> [Idx2d; 8] {
    std::array::from_fn(|d| offset(pos, d))
}
