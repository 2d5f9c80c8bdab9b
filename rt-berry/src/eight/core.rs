use super::CLOCKWISE;
use crate::{Idx2d, LayerView};

type SignedIdx2d = (isize, isize);

#[inline]
fn step((h, w): SignedIdx2d, dir: usize) -> SignedIdx2d {
    let (dh, dw) = CLOCKWISE[dir % 8];
    (h + dh, w + dw)
}

/// `to` 相对于 `from` 的方向编号. 两者必须 8-相邻.
#[inline]
fn direction_of(from: SignedIdx2d, to: SignedIdx2d) -> usize {
    let d = (to.0 - from.0, to.1 - from.1);
    let dir = CLOCKWISE.iter().position(|v| *v == d);
    debug_assert!(dir.is_some(), "{from:?} and {to:?} are not 8-adjacent");
    dir.unwrap_or(0)
}

/// 边缘追踪实现块.
impl<'a> LayerView<'a> {
    #[inline]
    fn is_inside_signed(&self, (h, w): SignedIdx2d) -> bool {
        h >= 0 && w >= 0 && self.is_inside((h as usize, w as usize))
    }

    /// 从 `start` 出发, 以 Moore 邻域规则顺时针追踪其所在 8-连通区域的外轮廓.
    /// 返回首尾相连 (首点不重复) 的 8-相邻边缘像素序列.
    ///
    /// # 注意
    ///
    /// 1. `start` 必须是该区域按行优先序的第一个像素, 从而保证其正西方向
    ///   的像素位于外部. 否则追踪结果没有意义.
    /// 2. 孤立像素返回只含自身的序列.
    /// 3. 停止条件为 Jacob 准则: 再次以相同的回溯像素进入起点.
    pub fn trace_boundary(&self, start: Idx2d) -> Vec<Idx2d> {
        if !self.is_inside(start) {
            return vec![];
        }
        let s = (start.0 as isize, start.1 as isize);
        let s_back = step(s, 0);
        debug_assert!(!self.is_inside_signed(s_back));

        let mut ans = Vec::with_capacity(16);
        ans.push(start);

        let (mut cur, mut back) = (s, s_back);
        // 每个像素至多被进入 4 次.
        let cap = 4 * self.size() + 8;
        for _ in 0..cap {
            let back_dir = direction_of(cur, back);
            let next = (1..=8)
                .map(|k| (back_dir + k) % 8)
                .find(|d| self.is_inside_signed(step(cur, *d)));
            let Some(dir) = next else {
                // 孤立像素.
                return ans;
            };
            let then = step(cur, dir);
            let then_back = step(cur, dir + 7);
            if then == s && then_back == s_back {
                return ans;
            }
            ans.push((then.0 as usize, then.1 as usize));
            back = then_back;
            cur = then;
        }
        log::warn!("boundary trace from {start:?} hit its iteration cap");
        ans
    }

    /// 获取该层每个 8-连通内部区域的外轮廓. 区域按首个像素的行优先序排列.
    ///
    /// 孔洞不参与追踪.
    pub fn boundary_loops(&self) -> Vec<Vec<Idx2d>> {
        self.areas8()
            .into_iter()
            .map(|area| self.trace_boundary(area[0]))
            .collect()
    }
}
