#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供放疗结构集 (structure set) 轮廓的几何处理算法:
//! 体素化, 三维外扩/内缩, 轮廓提取, 以及关键层之间的轮廓插值.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 坐标约定
//!
//! 1. 物理坐标单位为毫米, 按 `(x, y, z)` 顺序存储.
//! 2. 体素索引与底层 `ndarray` 一致, 按 `(z, h, w)` 即 `(z, y, x)` 顺序访问.
//! 3. 轮廓点与提取结果均位于体素中心.
//!
//! # 注意
//!
//! 1. 参数非法 (非正分辨率, NaN 外扩距离等) 时, 公开接口返回
//!   [`GeometryError::InvalidInput`], 而不会 panic.
//! 2. 插值失败的层由工作线程自动降级到极坐标算法, 单层失败不会中断整个任务.
//!
//! # 开发计划
//!
//! ### 轮廓体素化 ✅
//!
//! 扫描线填充, 同一层多个轮廓取并集.
//!
//! 实现位于 `rt-berry/src/raster.rs`.
//!
//! ### 三维距离变换与外扩/内缩 ✅
//!
//! 向量传播距离变换, 对单个种子点精确. 外扩可选半个平面体素的修正.
//!
//! 实现位于 `rt-berry/src/data/morph_3d`.
//!
//! ### 轮廓提取 ✅
//!
//! 8-连通岛的 Moore 边缘追踪, 层位置优先复用原始层.
//!
//! 实现位于 `rt-berry/src/extract.rs` 与 `rt-berry/src/eight`.
//!
//! ### 层间插值 ✅
//!
//! 1. 极坐标插值 (默认). ✅
//! 2. 弧长插值. ✅
//! 3. 有符号距离场插值, 支持拓扑变化. ✅
//!
//! 实现位于 `rt-berry/src/interp`.
//!
//! ### 后台插值任务 ✅
//!
//! 单一工作线程, 逐层降级, 逐空隙汇报进度.
//!
//! 实现位于 `rt-berry/src/worker`.
//!
//! ### 消融实验 ⌛️
//!
//! 三种插值算法在合成体模上的面积误差与耗时对比.
//!
//! 实现位于 `ablations/interp3`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 按 `(z, h, w)` 顺序.
pub type Idx3d = (usize, usize, usize);

/// 三维物理向量 `(x, y, z)`, 单位: 毫米.
pub type Vec3 = (f64, f64, f64);

/// 平面物理坐标 `(x, y)`, 单位: 毫米.
pub type Point2 = (f64, f64);

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

/// 网格, 标量场与轮廓数据结构.
mod data;

pub use data::{Contour, ContourSet, Grid, LayerView, LayerViewMut, ScalarField};

pub use data::morph_3d;

pub mod config;
pub mod consts;
#[cfg(feature = "serde")]
mod de;
pub mod eight;
pub mod error;
pub mod extract;
pub mod interp;
pub mod polygon;
pub mod raster;
pub mod worker;

pub mod prelude;

pub use error::{GeoResult, GeometryError};
pub use extract::extract_contours;
pub use morph_3d::apply_margin;
pub use raster::rasterize;
