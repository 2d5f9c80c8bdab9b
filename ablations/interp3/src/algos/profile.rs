//! 算法运行统计.

use std::time::{Duration, Instant};

/// 可累加的分段计时器.
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 创建后立即开始计时.
    #[inline]
    pub fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始新的一段.
    #[inline]
    pub fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束当前一段并累加, 返回该段时长. 调用前必须先调用 `self.start()`.
    #[inline]
    pub fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 累计时间, 以微秒为单位.
    #[inline]
    pub fn get_total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

impl Default for AccTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// ablation/benchmark 数据统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 插值结果为空的目标层个数.
    failed: u64,

    /// 遇到的目标层个数 (包括 `failed`).
    target: u64,

    /// 插值目标层花费的总时间 (包括 CPU 时间, 系统 IO/调度时间).
    target_time: AccTimer,

    /// 整个任务花费的总时间 (包括 CPU 时间, 系统 IO/调度时间, 配置外部环境时间).
    real_time: AccTimer,

    /// 最耗时的一次插值所消耗的时间.
    most: Duration,

    /// 成功插值的目标层上, 面积相对误差之和.
    area_err: f64,

    /// 成功插值的目标层上, 最大的面积相对误差.
    worst_err: f64,

    /// 成功插值的目标层上, 质心偏移 (毫米) 之和.
    centroid_err: f64,
}

impl Profile {
    /// 初始化.
    #[inline]
    pub fn new() -> Self {
        Self {
            failed: 0,
            target: 0,
            target_time: AccTimer::default(),
            real_time: AccTimer::default(),
            most: Duration::MAX,
            area_err: 0.0,
            worst_err: 0.0,
            centroid_err: 0.0,
        }
    }

    /// 记录一次失败的插值.
    #[inline]
    pub fn count_failed(&mut self) {
        self.failed += 1;
    }

    /// 记录一个目标层. `start` 表明是否同时开启新一轮计时任务.
    #[inline]
    pub fn count_target(&mut self, start: bool) {
        self.target += 1;
        if start {
            self.target_start();
        }
    }

    /// 开始一次新的插值计时.
    #[inline]
    pub fn target_start(&mut self) {
        self.target_time.start();
    }

    /// 结束一次插值计时.
    #[inline]
    pub fn target_elapsed(&mut self) {
        let d = self.target_time.elapsed();
        self.most = match self.most {
            Duration::MAX => d,
            once_duration => std::cmp::max(d, once_duration),
        };
    }

    /// 添加一次面积相对误差记录.
    #[inline]
    pub fn add_area_error(&mut self, err: f64) {
        self.area_err += err;
        self.worst_err = self.worst_err.max(err);
    }

    /// 添加一次质心偏移记录.
    #[inline]
    pub fn add_centroid_error(&mut self, err_mm: f64) {
        self.centroid_err += err_mm;
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    /// 获得失败次数.
    #[inline]
    pub fn get_failed(&self) -> u64 {
        self.failed
    }

    /// 获得目标层总数.
    #[inline]
    pub fn get_target(&self) -> u64 {
        self.target
    }

    /// 以微秒为单位获得插值的总花费自然时间.
    #[inline]
    pub fn get_target_time_us(&self) -> u64 {
        self.target_time.get_total_us()
    }

    /// 以微秒为单位获得算法运行到目前的总自然时间.
    #[inline]
    pub fn get_real_time_us(&self) -> u64 {
        self.real_time.get_total_us()
    }

    /// 以微秒为单位获得每个目标层的平均插值时间.
    #[inline]
    pub fn get_avg_target_time_us(&self) -> Option<f64> {
        match self.target {
            0 => None,
            target => Some(self.get_target_time_us() as f64 / target as f64),
        }
    }

    /// 获得成功插值的目标层上的平均面积相对误差.
    #[inline]
    pub fn get_avg_area_error(&self) -> Option<f64> {
        match self.target - self.failed {
            0 => None,
            ok => Some(self.area_err / ok as f64),
        }
    }

    /// 获得成功插值的目标层上的平均质心偏移.
    #[inline]
    pub fn get_avg_centroid_error(&self) -> Option<f64> {
        match self.target - self.failed {
            0 => None,
            ok => Some(self.centroid_err / ok as f64),
        }
    }

    /// 获得最大的面积相对误差.
    #[inline]
    pub fn get_worst_area_error(&self) -> f64 {
        self.worst_err
    }

    /// 获取最耗时的一次插值所消耗的时间.
    ///
    /// 如果不存在任务, 则返回 `None`.
    pub fn get_most_time_consuming(&self) -> Option<Duration> {
        match self.most {
            Duration::MAX => None,
            d => Some(d),
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
