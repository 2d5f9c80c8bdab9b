use std::collections::VecDeque;
use std::ops::{Index, IndexMut};

use itertools::iproduct;
use ndarray::{ArrayView2, ArrayViewMut2};

use crate::consts::occupancy::{self, INSIDE};
use crate::eight::{neighbour4, neighbour8};
use crate::{Area2d, Areas2d, Idx2d};

/// 不可变、借用的二维水平层.
pub struct LayerView<'a> {
    /// 借用于 [`crate::ScalarField`] 的第 `z` 层.
    data: ArrayView2<'a, f64>,
}

impl Index<Idx2d> for LayerView<'_> {
    type Output = f64;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 可变、借用的二维水平层.
pub struct LayerViewMut<'a> {
    /// 借用于 [`crate::ScalarField`] 的第 `z` 层.
    data: ArrayViewMut2<'a, f64>,
}

impl<'a> LayerViewMut<'a> {
    /// 将第 `h` 行中 `[w0, w1]` (闭区间) 的像素标记为内部. 超出宽度的部分被截断.
    pub fn fill_run(&mut self, h: usize, w0: usize, w1: usize) {
        let width = self.width();
        if w0 >= width || w0 > w1 {
            return;
        }
        for w in w0..=w1.min(width - 1) {
            self[(h, w)] = INSIDE;
        }
    }
}

impl Index<Idx2d> for LayerViewMut<'_> {
    type Output = f64;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for LayerViewMut<'_> {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// 层的不可变方法集合.
macro_rules! impl_layer_immut {
    ($life: lifetime, $layer: ty, $array: ty) => {
        /// 不可变方法集合.
        impl<$life> $layer {
            /// 直接初始化.
            #[inline]
            pub(crate) fn new(data: $array) -> Self {
                Self { data }
            }

            /// 层的形状 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                let &[h, w] = self.data.shape() else {
                    unreachable!()
                };
                (h, w)
            }

            /// 层的像素个数.
            #[inline]
            pub fn size(&self) -> usize {
                let (h, w) = self.shape();
                h * w
            }

            /// 获得层的高.
            #[inline]
            pub fn height(&self) -> usize {
                self.shape().0
            }

            /// 获得层的宽.
            #[inline]
            pub fn width(&self) -> usize {
                self.shape().1
            }

            /// `pos` 处的像素是否位于结构内部. 越界视为外部.
            #[inline]
            pub fn is_inside(&self, pos: Idx2d) -> bool {
                self.data.get(pos).is_some_and(|v| occupancy::is_inside(*v))
            }

            /// 层中是否没有任何内部像素?
            #[inline]
            pub fn is_empty_mask(&self) -> bool {
                self.data.iter().copied().all(occupancy::is_outside)
            }

            /// 统计层中的内部像素个数.
            #[inline]
            pub fn count_occupied(&self) -> usize {
                self.data
                    .iter()
                    .filter(|v| occupancy::is_inside(**v))
                    .count()
            }

            /// 判断 `pos` 是否为边界像素: 位于内部, 且 4-邻域中存在外部像素
            /// (越界的邻居也视为外部).
            pub fn is_boundary(&self, pos: Idx2d) -> bool {
                self.is_inside(pos)
                    && neighbour4(pos)
                        .into_iter()
                        .any(|p| !self.is_inside(p))
            }

            /// 以行优先规则, 获取能迭代所有索引的迭代器.
            #[inline]
            pub fn pos_iter(&self) -> impl Iterator<Item = Idx2d> {
                let (h, w) = self.shape();
                iproduct!(0..h, 0..w)
            }

            /// 按照 8-相邻规则获取所有内部区域 (岛).
            ///
            /// 每个区域的第一个元素是该区域按行优先序的第一个像素,
            /// 区域之间也按照该像素的行优先序排列.
            pub fn areas8(&self) -> Areas2d {
                let (_, width) = self.shape();
                let flat = |(h, w): Idx2d| h * width + w;
                let mut seen = vec![false; self.size()];
                let mut queue = VecDeque::new();
                let mut ans = Areas2d::new();

                for start in self.pos_iter() {
                    if seen[flat(start)] || !self.is_inside(start) {
                        continue;
                    }
                    seen[flat(start)] = true;
                    queue.push_back(start);
                    let mut area = Area2d::new();
                    while let Some(cur) = queue.pop_front() {
                        area.push(cur);
                        for nb in neighbour8(cur) {
                            // `is_inside` 已经排除了越界的邻居.
                            if self.is_inside(nb) && !seen[flat(nb)] {
                                seen[flat(nb)] = true;
                                queue.push_back(nb);
                            }
                        }
                    }
                    ans.push(area);
                }
                ans
            }
        }
    };
}
impl_layer_immut!('a, LayerView<'a>, ArrayView2<'a, f64>);
impl_layer_immut!('a, LayerViewMut<'a>, ArrayViewMut2<'a, f64>);
