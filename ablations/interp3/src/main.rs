//! 三种层间插值算法在合成体模上的对比实验.
//!
//! 可通过环境变量 `$INTERP3_SLICE_MM`, `$INTERP3_STRIDE` 与 `$INTERP3_SAMPLES` 调整参数.

mod algos;
mod result;
mod runner;

fn main() {
    // 只输出库中 warn 及以上级别的日志.
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .init()
        .unwrap();
    runner::run().analyze();
}
