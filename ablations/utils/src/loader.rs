//! 实验参数加载. 环境变量优先, 否则使用默认值.

use std::env;
use std::str::FromStr;

/// 真值体模的层厚, 单位: 毫米.
pub const DEFAULT_SLICE_MM: f64 = 1.0;

/// 关键层间隔.
pub const DEFAULT_STRIDE: usize = 5;

/// 读取环境变量 `key` 并解析. 不存在或无法解析时返回 `default`.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(s) => s.trim().parse().unwrap_or_else(|_| {
            eprintln!("${key} = {s:?} cannot be parsed, using default");
            default
        }),
        Err(_) => default,
    }
}

/// 获取真值体模的层厚.
///
/// 1. 若环境变量 `$INTERP3_SLICE_MM` 非空且合法, 则返回其值;
/// 2. 否则, 返回 [`DEFAULT_SLICE_MM`].
pub fn slice_mm_from_env_or_default() -> f64 {
    let v = env_or("INTERP3_SLICE_MM", DEFAULT_SLICE_MM);
    if v.is_finite() && v > 0.0 {
        v
    } else {
        DEFAULT_SLICE_MM
    }
}

/// 获取关键层间隔.
///
/// 1. 若环境变量 `$INTERP3_STRIDE` 非空且合法, 则返回其值;
/// 2. 否则, 返回 [`DEFAULT_STRIDE`].
pub fn stride_from_env_or_default() -> usize {
    env_or("INTERP3_STRIDE", DEFAULT_STRIDE).max(2)
}

/// 获取射线数 / 重采样点数. 默认与库的默认值一致.
pub fn samples_from_env_or_default() -> usize {
    env_or("INTERP3_SAMPLES", rt_berry::consts::DEFAULT_RAY_BINS).max(3)
}
