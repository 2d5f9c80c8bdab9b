//! 通用常量.

/// 占据标记 (occupancy mask) 的取值.
pub mod occupancy {
    /// 体素位于结构外部.
    pub const OUTSIDE: f64 = 0.0;

    /// 体素位于结构内部.
    pub const INSIDE: f64 = 1.0;

    /// 体素是否位于结构内部?
    ///
    /// 以 `0.5` 为阈值, 以便容忍插值/混合产生的非整数值.
    #[inline]
    pub fn is_inside(v: f64) -> bool {
        v >= 0.5
    }

    /// 体素是否位于结构外部?
    #[inline]
    pub fn is_outside(v: f64) -> bool {
        !is_inside(v)
    }
}

/// 距离场相关常量.
pub mod distance {
    /// 距离变换的种子值.
    pub const SEED: f64 = 0.0;

    /// 距离变换中 "尚未到达" 的体素值. 等价于 +∞.
    pub const FAR: f64 = f64::INFINITY;
}

/// 极坐标插值默认射线数量.
pub const DEFAULT_RAY_BINS: usize = 128;

/// 弧长插值默认重采样点数.
pub const DEFAULT_ARC_SAMPLES: usize = 128;

/// 射线长度环形滑动平均的默认窗口宽度 (奇数).
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// 距离场插值默认的平面网格分辨率, 单位: 毫米.
pub const DEFAULT_SDF_SPACING_MM: f64 = 1.0;

/// 层 z 坐标匹配容差占层间距的比例.
pub const Z_TOLERANCE_RATIO: f64 = 0.4;

/// 层 z 坐标匹配容差的下限, 单位: 毫米.
pub const MIN_Z_TOLERANCE_MM: f64 = 0.1;

/// 面积小于该值 (平方毫米) 的多边形视为退化.
pub const DEGENERATE_AREA_MM2: f64 = 1e-9;

/// 相邻关键层间距超过 `层厚 * GAP_FACTOR` 时才视为需要插值的空隙.
pub const GAP_FACTOR: f64 = 1.5;
