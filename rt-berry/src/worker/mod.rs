//! 批量插值编排器.
//!
//! 编排器拥有一个独立的工作线程与任务队列. 调用方提交任务后立即返回,
//! 之后从该任务专属的通道中依次接收 `Progress`, `Complete` 或 `Error` 事件.
//!
//! ```text
//! 调用方线程                      工作线程
//! ──────────                      ────────
//! submit()
//!   ├─ 分配任务编号
//!   ├─ 入队 ─────────────────────→ 取出任务
//!   └─ 返回 JobTicket                ├─ 检查参数
//!                                    ├─ 逐个空隙插值 ──→ Progress
//!                                    └─ 汇总 ────────────→ Complete | Error
//! ```
//!
//! 调用方丢弃接收端即可 "取消" 任务: 任务仍会执行完毕, 但事件被静默丢弃.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, error, info, warn};

use crate::config::InterpSpec;
use crate::error::{GeoResult, GeometryError};
use crate::interp::{interpolate_slices, InterpAlgorithm};
use crate::Contour;

mod gap;
mod job;

pub use gap::find_gaps;
pub use job::{InterpolationGap, InterpolationJob, JobEvent, JobState};

/// 从 panic 负载中提取可读信息.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// 以 `spec` 插值单个目标层, 捕获算法中的 panic.
fn attempt(gap: &InterpolationGap, target_z: f64, spec: &InterpSpec) -> GeoResult<Vec<Contour>> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        interpolate_slices(
            (gap.z_a, gap.contours_a.as_slice()),
            (gap.z_b, gap.contours_b.as_slice()),
            target_z,
            spec,
        )
    }))
    .unwrap_or_else(|payload| {
        Err(GeometryError::AlgorithmFailure(format!(
            "panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

/// 插值单个目标层.
///
/// 1. 输入非法 (轮廓不足 3 个点, 面积为零, 目标层不在区间内) 时返回空结果.
/// 2. 其它任何失败 (包括 panic) 都退回到极坐标算法; 极坐标算法也失败时返回空结果.
pub fn interpolate_target(gap: &InterpolationGap, target_z: f64, spec: &InterpSpec) -> Vec<Contour> {
    let err = match attempt(gap, target_z, spec) {
        Ok(v) => return v,
        Err(e) => e,
    };
    if !err.is_recoverable() {
        debug!("z = {target_z}: {err}, skipped");
        return vec![];
    }
    if spec.algorithm() == InterpAlgorithm::Polar {
        warn!("z = {target_z}: polar interpolation failed: {err}");
        return vec![];
    }
    warn!(
        "z = {target_z}: {} interpolation failed ({err}), falling back to polar",
        spec.algorithm()
    );
    attempt(gap, target_z, &spec.with(InterpAlgorithm::Polar)).unwrap_or_else(|e| {
        warn!("z = {target_z}: polar fallback failed: {e}");
        vec![]
    })
}

/// 插值一个空隙中的全部目标层.
pub fn interpolate_gap(gap: &InterpolationGap, spec: &InterpSpec) -> Vec<Contour> {
    gap.target_zs
        .iter()
        .flat_map(|&z| interpolate_target(gap, z, spec))
        .collect()
}

/// 同步执行一个任务, 将事件依次交给 `sink`. 返回任务的终止状态.
///
/// 空隙严格按顺序处理. 每个空隙完成后发出一次 `Progress`, 最后发出一次 `Complete`;
/// 参数非法或空隙之外发生 panic 时改为发出一次 `Error`.
pub fn run_job<F: FnMut(JobEvent)>(job: &InterpolationJob, mut sink: F) -> JobState {
    let job_id = job.job_id();
    info!("job {job_id}: received, {} gaps", job.gaps().len());

    let spec = match job.validate() {
        Ok(spec) => spec,
        Err(e) => {
            warn!("job {job_id}: {e}");
            sink(JobEvent::Error {
                job_id,
                message: e.to_string(),
            });
            return JobState::Error;
        }
    };

    let gaps_total = job.gaps().len();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut all = Vec::new();
        for (gap_index, gap) in job.gaps().iter().enumerate() {
            debug!("job {job_id}: processing gap {} of {gaps_total}", gap_index + 1);
            let contours = interpolate_gap(gap, &spec);
            all.extend(contours.iter().cloned());
            sink(JobEvent::Progress {
                job_id,
                gap_index,
                gaps_total,
                contours,
            });
        }
        all
    }));

    match outcome {
        Ok(contours) => {
            info!("job {job_id}: complete, {} contours", contours.len());
            sink(JobEvent::Complete { job_id, contours });
            JobState::Complete
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("job {job_id}: {message}");
            sink(JobEvent::Error { job_id, message });
            JobState::Error
        }
    }
}

/// 排队中的任务及其事件发送端.
struct QueuedJob {
    job: InterpolationJob,
    events: Sender<JobEvent>,
}

/// 已提交任务的凭据.
#[derive(Debug)]
pub struct JobTicket {
    job_id: u64,
    events: Receiver<JobEvent>,
}

impl JobTicket {
    /// 任务编号.
    #[inline]
    pub fn job_id(&self) -> u64 {
        self.job_id
    }

    /// 事件接收端.
    #[inline]
    pub fn events(&self) -> &Receiver<JobEvent> {
        &self.events
    }

    /// 阻塞直到任务结束, 返回全部结果.
    ///
    /// # 错误
    ///
    /// 1. 收到 `Error` 事件时返回 [`GeometryError::InvalidJob`].
    /// 2. 工作线程在任务结束前退出时返回 [`GeometryError::WorkerDisconnected`].
    pub fn wait(self) -> GeoResult<Vec<Contour>> {
        for event in self.events.iter() {
            match event {
                JobEvent::Progress { .. } => {}
                JobEvent::Complete { contours, .. } => return Ok(contours),
                JobEvent::Error { message, .. } => return Err(GeometryError::InvalidJob(message)),
            }
        }
        Err(GeometryError::WorkerDisconnected)
    }
}

/// 编排器句柄. 拥有一个工作线程及其任务队列.
///
/// 丢弃句柄时, 队列中已有的任务会被执行完毕, 然后工作线程退出.
pub struct OrchestratorHandle {
    tx: Option<Sender<QueuedJob>>,
    handle: Option<JoinHandle<()>>,
    next_id: AtomicU64,
}

impl OrchestratorHandle {
    /// 启动工作线程.
    ///
    /// # 错误
    ///
    /// 无法创建线程时返回 [`GeometryError::WorkerDisconnected`].
    pub fn new() -> GeoResult<Self> {
        let (tx, rx) = channel();
        let handle = spawn_worker_thread(rx)?;
        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            next_id: AtomicU64::new(1),
        })
    }

    /// 提交一组空隙, 返回任务凭据.
    ///
    /// 参数合法性在工作线程中检查, 非法参数以 `Error` 事件报告.
    pub fn submit(&self, gaps: Vec<InterpolationGap>, spec: &InterpSpec) -> GeoResult<JobTicket> {
        let job_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.enqueue(InterpolationJob::with_spec(job_id, gaps, spec))
    }

    /// 以算法与射线数 / 采样数提交任务, 其余参数取默认值.
    pub fn interpolate_job(
        &self,
        gaps: Vec<InterpolationGap>,
        algorithm: InterpAlgorithm,
        bins_or_samples: usize,
    ) -> GeoResult<JobTicket> {
        let job_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.enqueue(InterpolationJob::new(
            job_id,
            gaps,
            algorithm,
            bins_or_samples,
        ))
    }

    fn enqueue(&self, job: InterpolationJob) -> GeoResult<JobTicket> {
        let tx = self.tx.as_ref().ok_or(GeometryError::WorkerDisconnected)?;
        let job_id = job.job_id();
        let (events, rx) = channel();
        tx.send(QueuedJob { job, events })
            .map_err(|_| GeometryError::WorkerDisconnected)?;
        debug!("job {job_id}: queued");
        Ok(JobTicket {
            job_id,
            events: rx,
        })
    }
}

impl Drop for OrchestratorHandle {
    fn drop(&mut self) {
        // 关闭队列, 工作线程处理完剩余任务后退出.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("interpolation worker thread panicked");
            } else {
                debug!("interpolation worker thread joined");
            }
        }
    }
}

/// 启动工作线程.
fn spawn_worker_thread(rx: Receiver<QueuedJob>) -> GeoResult<JoinHandle<()>> {
    thread::Builder::new()
        .name("interp-worker".to_string())
        .spawn(move || {
            info!("interpolation worker started");
            while let Ok(QueuedJob { job, events }) = rx.recv() {
                // 调用方可能已经丢弃了接收端, 发送失败可以忽略.
                run_job(&job, |event| {
                    let _ = events.send(event);
                });
            }
            info!("interpolation worker shutting down");
        })
        .map_err(|e| {
            error!("cannot spawn interpolation worker: {e}");
            GeometryError::WorkerDisconnected
        })
}
