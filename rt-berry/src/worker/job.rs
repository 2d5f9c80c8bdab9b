//! 插值任务、任务状态与事件.

use crate::config::InterpSpec;
use crate::consts::{DEFAULT_SDF_SPACING_MM, DEFAULT_SMOOTHING_WINDOW};
use crate::error::{GeoResult, GeometryError};
use crate::interp::InterpAlgorithm;
use crate::Contour;

/// 一个待插值的空隙: 两个已知层及其间的若干目标层.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterpolationGap {
    /// 下方已知层位置.
    pub z_a: f64,

    /// 下方已知层的轮廓.
    pub contours_a: Vec<Contour>,

    /// 上方已知层位置.
    pub z_b: f64,

    /// 上方已知层的轮廓.
    pub contours_b: Vec<Contour>,

    /// 需要合成的层位置.
    pub target_zs: Vec<f64>,
}

impl InterpolationGap {
    /// 所有层位置是否都是有限值?
    pub fn is_finite(&self) -> bool {
        self.z_a.is_finite() && self.z_b.is_finite() && self.target_zs.iter().all(|z| z.is_finite())
    }
}

/// 提交给编排器的插值任务.
///
/// 参数在任务开始执行时才被检查, 非法参数以任务级错误事件的形式报告.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterpolationJob {
    job_id: u64,
    gaps: Vec<InterpolationGap>,
    algorithm: InterpAlgorithm,
    samples: usize,
    smoothing_window: usize,
    sdf_spacing_mm: f64,
}

impl InterpolationJob {
    /// 以默认平滑窗口与距离场分辨率创建任务.
    pub fn new(
        job_id: u64,
        gaps: Vec<InterpolationGap>,
        algorithm: InterpAlgorithm,
        samples: usize,
    ) -> Self {
        Self {
            job_id,
            gaps,
            algorithm,
            samples,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            sdf_spacing_mm: DEFAULT_SDF_SPACING_MM,
        }
    }

    /// 以完整参数创建任务.
    pub fn with_spec(job_id: u64, gaps: Vec<InterpolationGap>, spec: &InterpSpec) -> Self {
        Self {
            job_id,
            gaps,
            algorithm: spec.algorithm(),
            samples: spec.samples(),
            smoothing_window: spec.smoothing_window(),
            sdf_spacing_mm: spec.sdf_spacing_mm(),
        }
    }

    /// 任务编号.
    #[inline]
    pub fn job_id(&self) -> u64 {
        self.job_id
    }

    /// 全部空隙.
    #[inline]
    pub fn gaps(&self) -> &[InterpolationGap] {
        &self.gaps
    }

    /// 检查任务参数, 返回插值参数.
    ///
    /// # 错误
    ///
    /// 层位置不是有限值, 或射线数 / 采样数小于 3 时返回 [`GeometryError::InvalidJob`].
    pub fn validate(&self) -> GeoResult<InterpSpec> {
        if let Some(i) = self.gaps.iter().position(|g| !g.is_finite()) {
            return Err(GeometryError::InvalidJob(format!(
                "gap {i} has a non-finite slice position"
            )));
        }
        InterpSpec::new(
            self.algorithm,
            self.samples,
            self.smoothing_window,
            self.sdf_spacing_mm,
        )
        .ok_or_else(|| {
            GeometryError::InvalidJob(format!(
                "{} samples / sdf spacing {} mm is not valid",
                self.samples, self.sdf_spacing_mm
            ))
        })
    }
}

/// 任务生命周期.
///
/// `Received -> Processing(第 i 个, 共 N 个) -> Complete | Error`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JobState {
    /// 已接收, 尚未开始.
    Received,

    /// 正在处理第 `gap` 个空隙 (从 0 开始), 共 `of` 个.
    Processing {
        /// 当前空隙.
        gap: usize,
        /// 空隙总数.
        of: usize,
    },

    /// 正常结束.
    Complete,

    /// 任务级错误.
    Error,
}

impl JobState {
    /// 是否为终止状态?
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

/// 编排器发出的事件.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JobEvent {
    /// 一个空隙处理完毕, 只携带该空隙新生成的轮廓.
    Progress {
        /// 任务编号.
        job_id: u64,
        /// 空隙编号 (从 0 开始).
        gap_index: usize,
        /// 空隙总数.
        gaps_total: usize,
        /// 新生成的轮廓.
        contours: Vec<Contour>,
    },

    /// 任务完成, 携带全部结果.
    Complete {
        /// 任务编号.
        job_id: u64,
        /// 全部生成的轮廓.
        contours: Vec<Contour>,
    },

    /// 任务级错误. 之前已经发出的进度结果仍然有效.
    Error {
        /// 任务编号.
        job_id: u64,
        /// 错误描述.
        message: String,
    },
}

impl JobEvent {
    /// 事件所属的任务编号.
    #[inline]
    pub fn job_id(&self) -> u64 {
        match self {
            Self::Progress { job_id, .. } | Self::Complete { job_id, .. } | Self::Error { job_id, .. } => {
                *job_id
            }
        }
    }

    /// 发出该事件时任务所处的状态.
    pub fn state(&self) -> JobState {
        match self {
            Self::Progress {
                gap_index,
                gaps_total,
                ..
            } => JobState::Processing {
                gap: *gap_index,
                of: *gaps_total,
            },
            Self::Complete { .. } => JobState::Complete,
            Self::Error { .. } => JobState::Error,
        }
    }
}
