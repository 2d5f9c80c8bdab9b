//! 运行时错误.

use thiserror::Error;

/// 几何引擎的运行时错误.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// 输入不合法, 例如多边形少于 3 个点.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 多边形面积为零 (或接近零), 无法求质心或面积比例.
    #[error("degenerate polygon (area {0} mm^2)")]
    DegeneratePolygon(f64),

    /// 目标层不在两个已知层之间的开区间内.
    ///
    /// 参数为插值比例 `t`.
    #[error("target z is outside the open interval, t = {0}")]
    OutOfInterval(f64),

    /// 高精度算法在数值上失败, 调用方应退回到极坐标算法.
    #[error("algorithm failure: {0}")]
    AlgorithmFailure(String),

    /// 任务负载本身不合法 (编排器级别错误).
    #[error("invalid job: {0}")]
    InvalidJob(String),

    /// 工作线程已经退出, 无法再提交任务.
    #[error("worker thread has disconnected")]
    WorkerDisconnected,
}

impl GeometryError {
    /// 该错误是否可以通过退回到极坐标算法来恢复?
    ///
    /// 输入非法的情况下任何算法都只能给出空结果, 因此不可恢复.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::AlgorithmFailure(_))
    }

    /// 该错误是否属于 "单元输入非法", 即应当静默返回空结果?
    #[inline]
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::DegeneratePolygon(_) | Self::OutOfInterval(_)
        )
    }
}

/// 几何计算结果.
pub type GeoResult<T> = Result<T, GeometryError>;
