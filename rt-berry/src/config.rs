//! 各流水线步骤的参数.
//!
//! 所有参数对象都是只读的. 构造函数会检查参数合法性, 非法时返回 `None`.
//! 若要修改参数, 你应该创建新的实例.

use crate::consts::{
    DEFAULT_RAY_BINS, DEFAULT_SDF_SPACING_MM, DEFAULT_SMOOTHING_WINDOW, MIN_Z_TOLERANCE_MM,
    Z_TOLERANCE_RATIO,
};
use crate::interp::InterpAlgorithm;
use crate::Vec3;

#[inline]
fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// 栅格化参数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "crate::de::RawRasterSpec"))]
pub struct RasterSpec {
    /// 体素分辨率 `(x, y, z)`, 单位: 毫米.
    spacing_mm: Vec3,

    /// 包围盒在每个方向两侧额外留出的距离, 单位: 毫米.
    padding_mm: f64,
}

impl RasterSpec {
    /// 构建栅格化参数.
    ///
    /// 分辨率必须为正有限值, 边距必须为非负有限值. 否则返回 `None`.
    pub fn new(spacing_mm: Vec3, padding_mm: f64) -> Option<Self> {
        let (sx, sy, sz) = spacing_mm;
        if is_positive(sx)
            && is_positive(sy)
            && is_positive(sz)
            && padding_mm.is_finite()
            && padding_mm >= 0.0
        {
            Some(Self {
                spacing_mm,
                padding_mm,
            })
        } else {
            None
        }
    }

    /// 体素分辨率.
    #[inline]
    pub fn spacing_mm(&self) -> Vec3 {
        self.spacing_mm
    }

    /// 边距.
    #[inline]
    pub fn padding_mm(&self) -> f64 {
        self.padding_mm
    }

    /// 每个方向两侧的填充体素个数, `(x, y, z)`. 每个方向至少为 1.
    pub fn pad_voxels(&self) -> (usize, usize, usize) {
        let (sx, sy, sz) = self.spacing_mm;
        let pad = |s: f64| ((self.padding_mm / s).ceil() as usize).max(1);
        (pad(sx), pad(sy), pad(sz))
    }
}

impl Default for RasterSpec {
    /// 1 毫米各向同性分辨率, 2 毫米边距.
    fn default() -> Self {
        Self {
            spacing_mm: (1.0, 1.0, 1.0),
            padding_mm: 2.0,
        }
    }
}

/// 外扩/内缩参数.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "crate::de::RawMarginSpec"))]
pub struct MarginSpec {
    /// 带符号边距, 单位: 毫米. 正数外扩, 负数内缩.
    margin_mm: f64,

    /// 外扩时是否追加半个体素的修正, 以贴近参考计划系统的结果.
    use_correction: bool,
}

impl MarginSpec {
    /// 构建参数. `margin_mm` 必须为有限值, 否则返回 `None`.
    pub fn new(margin_mm: f64, use_correction: bool) -> Option<Self> {
        margin_mm.is_finite().then_some(Self {
            margin_mm,
            use_correction,
        })
    }

    /// 带符号边距.
    #[inline]
    pub fn margin_mm(&self) -> f64 {
        self.margin_mm
    }

    /// 是否追加修正.
    #[inline]
    pub fn use_correction(&self) -> bool {
        self.use_correction
    }
}

/// 轮廓提取参数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "crate::de::RawExtractSpec"))]
pub struct ExtractSpec {
    /// 层位置匹配容差, 单位: 毫米. `None` 代表由层间距推出.
    tolerance_mm: Option<f64>,

    /// 无法匹配已知层时, 是否允许以体素层中心新建层.
    allow_new_slices: bool,
}

impl ExtractSpec {
    /// 构建参数. 给定的容差必须为非负有限值, 否则返回 `None`.
    pub fn new(tolerance_mm: Option<f64>, allow_new_slices: bool) -> Option<Self> {
        match tolerance_mm {
            Some(v) if !(v.is_finite() && v >= 0.0) => None,
            _ => Some(Self {
                tolerance_mm,
                allow_new_slices,
            }),
        }
    }

    /// 是否允许新建层.
    #[inline]
    pub fn allow_new_slices(&self) -> bool {
        self.allow_new_slices
    }

    /// 针对层间距 `spacing_z_mm` 的实际容差.
    ///
    /// 未指定时为层间距的 40%, 且不小于 0.1 毫米.
    pub fn tolerance_for(&self, spacing_z_mm: f64) -> f64 {
        self.tolerance_mm
            .unwrap_or_else(|| (Z_TOLERANCE_RATIO * spacing_z_mm).max(MIN_Z_TOLERANCE_MM))
    }
}

impl Default for ExtractSpec {
    fn default() -> Self {
        Self {
            tolerance_mm: None,
            allow_new_slices: true,
        }
    }
}

/// 层间插值参数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "crate::de::RawInterpSpec"))]
pub struct InterpSpec {
    algorithm: InterpAlgorithm,

    /// 极坐标算法的射线数, 或弧长算法的重采样点数.
    samples: usize,

    /// 射线长度环形滑动平均的窗口宽度. 不大于 1 时不做平滑.
    smoothing_window: usize,

    /// 距离场算法的平面网格分辨率, 单位: 毫米.
    sdf_spacing_mm: f64,
}

impl InterpSpec {
    /// 构建参数.
    ///
    /// `samples` 至少为 3, `sdf_spacing_mm` 必须为正有限值, 否则返回 `None`.
    pub fn new(
        algorithm: InterpAlgorithm,
        samples: usize,
        smoothing_window: usize,
        sdf_spacing_mm: f64,
    ) -> Option<Self> {
        (samples >= 3 && is_positive(sdf_spacing_mm)).then_some(Self {
            algorithm,
            samples,
            smoothing_window,
            sdf_spacing_mm,
        })
    }

    /// 以默认平滑窗口与距离场分辨率构建参数.
    #[inline]
    pub fn with_algorithm(algorithm: InterpAlgorithm, samples: usize) -> Option<Self> {
        Self::new(
            algorithm,
            samples,
            DEFAULT_SMOOTHING_WINDOW,
            DEFAULT_SDF_SPACING_MM,
        )
    }

    /// 插值算法.
    #[inline]
    pub fn algorithm(&self) -> InterpAlgorithm {
        self.algorithm
    }

    /// 射线数 / 重采样点数.
    #[inline]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// 平滑窗口宽度.
    #[inline]
    pub fn smoothing_window(&self) -> usize {
        self.smoothing_window
    }

    /// 距离场平面分辨率.
    #[inline]
    pub fn sdf_spacing_mm(&self) -> f64 {
        self.sdf_spacing_mm
    }

    /// 换用另一个算法, 其余参数保持不变.
    #[inline]
    pub fn with(&self, algorithm: InterpAlgorithm) -> Self {
        Self { algorithm, ..*self }
    }
}

impl Default for InterpSpec {
    fn default() -> Self {
        Self {
            algorithm: InterpAlgorithm::Polar,
            samples: DEFAULT_RAY_BINS,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            sdf_spacing_mm: DEFAULT_SDF_SPACING_MM,
        }
    }
}
